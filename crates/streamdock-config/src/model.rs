//! Typed client configuration.

use std::time::Duration;

use url::Url;

use crate::defaults::{
    DEFAULT_API_PREFIX, DEFAULT_BASE_URL, DEFAULT_DETAIL_INTERVAL, DEFAULT_LIST_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_SERVER_PREFIX, DEFAULT_STALE_AFTER_FAILURES,
};
use crate::error::{ConfigError, ConfigResult};
use crate::validate::{check_base_url, check_positive_duration, normalize_prefix, parse_base_url};

/// Path prefixes of the two backend surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Queue status and enqueue endpoints live here.
    pub api_prefix: String,
    /// Item list, watchlist, path, delete, and stream endpoints live here.
    pub server_prefix: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            server_prefix: DEFAULT_SERVER_PREFIX.to_string(),
        }
    }
}

/// Poll intervals per view kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollCadence {
    /// Interval while showing a list of items.
    pub list: Duration,
    /// Interval while following one actively downloading item.
    pub detail: Duration,
}

impl Default for PollCadence {
    fn default() -> Self {
        Self {
            list: DEFAULT_LIST_INTERVAL,
            detail: DEFAULT_DETAIL_INTERVAL,
        }
    }
}

/// Everything the client needs to reach and poll the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, optionally with a base path.
    pub base_url: Url,
    /// Surface prefixes.
    pub endpoints: Endpoints,
    /// Poll intervals.
    pub cadence: PollCadence,
    /// Consecutive failed cycles before freshness turns stale.
    pub stale_after_failures: u32,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Reference defaults pointed at `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            endpoints: Endpoints::default(),
            cadence: PollCadence::default(),
            stale_after_failures: DEFAULT_STALE_AFTER_FAILURES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Reference defaults for a backend on the local machine.
    ///
    /// # Errors
    ///
    /// Only fails if the built-in origin stops parsing.
    pub fn local() -> ConfigResult<Self> {
        parse_base_url(DEFAULT_BASE_URL).map(Self::new)
    }

    /// Check every field, normalising the prefixes in place.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidField`] encountered.
    pub fn validate(mut self) -> ConfigResult<Self> {
        check_base_url(&self.base_url)?;
        self.endpoints.api_prefix = normalize_prefix("api_prefix", &self.endpoints.api_prefix)?;
        self.endpoints.server_prefix =
            normalize_prefix("server_prefix", &self.endpoints.server_prefix)?;
        check_positive_duration("poll", "list_interval", self.cadence.list)?;
        check_positive_duration("poll", "detail_interval", self.cadence.detail)?;
        check_positive_duration("backend", "request_timeout", self.request_timeout)?;
        if self.stale_after_failures == 0 {
            return Err(ConfigError::invalid_field(
                "poll",
                "stale_after_failures",
                "must be at least 1",
            ));
        }
        Ok(self)
    }

    /// URL of an endpoint on the api surface, e.g. `downloads/status`.
    #[must_use]
    pub fn api_url(&self, path: &str) -> Url {
        self.surface_url(&self.endpoints.api_prefix, path)
    }

    /// URL of an endpoint on the server surface, e.g. `watchlist/get`.
    #[must_use]
    pub fn server_url(&self, path: &str) -> Url {
        self.surface_url(&self.endpoints.server_prefix, path)
    }

    fn surface_url(&self, prefix: &str, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        let prefix = prefix.trim_matches('/');
        let path = path.trim_start_matches('/');
        let joined = [base_path.as_str(), prefix, path]
            .into_iter()
            .map(|segment| segment.trim_matches('/'))
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        url.set_path(&format!("/{joined}"));
        url
    }
}
