//! Error types for telemetry operations.

use prometheus::Error as PrometheusError;
use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Installing the tracing subscriber failed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        #[source]
        source: tracing_subscriber::util::TryInitError,
    },
    /// Building or registering a Prometheus collector failed.
    #[error("failed to register metrics collector {name}")]
    MetricsRegister {
        /// Metric identifier tied to the failure.
        name: &'static str,
        /// Underlying Prometheus error.
        #[source]
        source: PrometheusError,
    },
    /// Encoding Prometheus metrics failed.
    #[error("failed to encode metrics")]
    MetricsEncode {
        /// Underlying Prometheus error.
        #[source]
        source: PrometheusError,
    },
    /// Rendered metrics output was not valid UTF-8.
    #[error("metrics output was not valid utf-8")]
    MetricsUtf8 {
        /// Underlying UTF-8 conversion error.
        #[source]
        source: std::string::FromUtf8Error,
    },
}
