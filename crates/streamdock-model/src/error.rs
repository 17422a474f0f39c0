//! Validation errors raised before any request leaves the client.

use thiserror::Error;

/// Reasons an identity or action argument is rejected locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The media identifier was empty or whitespace.
    #[error("media id must not be empty")]
    BlankId,
    /// An episode identity was missing its season or episode number.
    #[error("episode identity requires both season and episode numbers")]
    IncompleteEpisode,
    /// A movie identity carried season or episode numbers.
    #[error("movie identity must not carry season or episode numbers")]
    MovieWithEpisode,
    /// Season and episode numbers start at 1.
    #[error("{field} number must be at least 1")]
    ZeroNumber {
        /// Field that held the zero value.
        field: &'static str,
    },
    /// A slug or series name was empty.
    #[error("{field} must not be empty")]
    BlankField {
        /// Name of the empty field.
        field: &'static str,
    },
}

/// Convenience alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;
