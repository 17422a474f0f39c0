//! Error taxonomy for backend calls, polling, and actions.

use streamdock_model::ValidationError;
use thiserror::Error;

/// Failures surfaced by backend calls and the action dispatcher.
///
/// The type is `Clone` so one cycle outcome can be handed to every caller
/// that coalesced onto it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connect, timeout, or transport failure.
    #[error("request to {endpoint} failed: {message}")]
    Network {
        /// Endpoint path.
        endpoint: String,
        /// Transport error text.
        message: String,
    },
    /// The backend does not know the referenced item.
    #[error("{endpoint} reported not found: {message}")]
    NotFound {
        /// Endpoint path.
        endpoint: String,
        /// Backend detail.
        message: String,
    },
    /// An argument was rejected before any request was sent.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    /// The same action on the same target is already running.
    #[error("{action} for {target} is already in progress")]
    Conflict {
        /// Action kind.
        action: &'static str,
        /// Target rendered as text.
        target: String,
    },
    /// The backend refused the request.
    #[error("{endpoint} rejected the request{}: {message}", status.map(|code| format!(" (status {code})")).unwrap_or_default())]
    Rejected {
        /// Endpoint path.
        endpoint: String,
        /// HTTP status, absent when the refusal came in a success body.
        status: Option<u16>,
        /// Backend detail.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to decode response from {endpoint}: {message}")]
    Decode {
        /// Endpoint path.
        endpoint: String,
        /// Decoder error text.
        message: String,
    },
}

impl ApiError {
    /// Stable label used for metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation",
            Self::Conflict { .. } => "conflict",
            Self::Rejected { .. } => "rejected",
            Self::Decode { .. } => "decode",
        }
    }
}

/// Result alias for backend calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Outcome of a poll cycle that did not publish.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// One of the two fetches failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The poller stopped before the cycle could publish.
    #[error("poller stopped before the refresh completed")]
    Cancelled,
}
