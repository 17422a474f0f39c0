//! Shared CLI context, error types, and conversions from library errors.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use streamdock_client::{ApiError, Dispatcher, HttpBackend, PollError, Poller, PollerOptions};
use streamdock_config::{ClientConfig, ConfigError};
use streamdock_events::EventBus;
use streamdock_telemetry::Metrics;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation(_) | ApiError::Conflict { .. } => {
                Self::validation(err.to_string())
            }
            other => Self::failure(other),
        }
    }
}

impl From<PollError> for CliError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::Api(err) => err.into(),
            PollError::Cancelled => Self::failure(anyhow!("refresh was cancelled")),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::validation(err.to_string())
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) backend: Arc<HttpBackend>,
    pub(crate) poller: Poller,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) events: EventBus,
    pub(crate) metrics: Metrics,
}

impl AppContext {
    /// Build an HTTP client tagged with `trace_id` and wire the services.
    pub(crate) fn connect(config: ClientConfig, trace_id: &str) -> CliResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        Self::with_client(client, config)
    }

    /// Wire poller and dispatcher around an existing client.
    pub(crate) fn with_client(client: Client, config: ClientConfig) -> CliResult<Self> {
        let config = Arc::new(config);
        let metrics = Metrics::new()
            .map_err(|err| CliError::failure(anyhow!("failed to initialise metrics: {err}")))?;
        let events = EventBus::new();
        let backend = Arc::new(HttpBackend::with_client(client, Arc::clone(&config)));

        let poller = Poller::new(
            backend.clone(),
            PollerOptions::from_config(&config)
                .with_events(events.clone())
                .with_metrics(metrics.clone()),
        );
        let dispatcher = Dispatcher::new(backend.clone(), poller.clone())
            .with_events(events.clone())
            .with_metrics(metrics.clone());

        Ok(Self {
            config,
            backend,
            poller,
            dispatcher,
            events,
            metrics,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_context(server: &httpmock::MockServer) -> AppContext {
    let base_url = server.base_url().parse().expect("valid URL");
    AppContext::with_client(Client::new(), ClientConfig::new(base_url)).expect("context builds")
}
