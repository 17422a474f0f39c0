//! Error types for configuration loading and validation.

use thiserror::Error;

/// Structured errors emitted while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid value for '{field}' in '{section}': {message}")]
    InvalidField {
        /// Section that failed validation.
        section: String,
        /// Field that failed validation.
        field: String,
        /// Human-readable error description.
        message: String,
    },

    /// An environment variable could not be parsed.
    #[error("environment variable {variable} is invalid: {message}")]
    InvalidEnv {
        /// Variable name.
        variable: &'static str,
        /// Human-readable error description.
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid_field(section: &str, field: &str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            section: section.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
