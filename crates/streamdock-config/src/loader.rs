//! Environment loading.

use std::env::{self, VarError};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::ClientConfig;
use crate::validate::{parse_base_url, parse_millis, parse_positive};

/// Backend origin.
pub const ENV_BASE_URL: &str = "STREAMDOCK_BASE_URL";
/// Prefix of the api surface.
pub const ENV_API_PREFIX: &str = "STREAMDOCK_API_PREFIX";
/// Prefix of the server surface.
pub const ENV_SERVER_PREFIX: &str = "STREAMDOCK_SERVER_PREFIX";
/// List poll interval in milliseconds.
pub const ENV_LIST_INTERVAL_MS: &str = "STREAMDOCK_POLL_INTERVAL_MS";
/// Detail poll interval in milliseconds.
pub const ENV_DETAIL_INTERVAL_MS: &str = "STREAMDOCK_DETAIL_POLL_INTERVAL_MS";
/// Consecutive failures before the snapshot is stale.
pub const ENV_STALE_AFTER: &str = "STREAMDOCK_STALE_AFTER_FAILURES";
/// Request timeout in milliseconds.
pub const ENV_REQUEST_TIMEOUT_MS: &str = "STREAMDOCK_REQUEST_TIMEOUT_MS";

impl ClientConfig {
    /// Load defaults overridden by `STREAMDOCK_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is not valid unicode, fails to
    /// parse, or the resulting configuration does not validate.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| match env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnv {
                variable: name,
                message: "value is not valid unicode".to_string(),
            }),
        })
    }

    /// Load defaults overridden by whatever `lookup` returns for each
    /// `STREAMDOCK_*` name. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value fails to parse or the resulting
    /// configuration does not validate.
    pub fn from_lookup<F>(mut lookup: F) -> ConfigResult<Self>
    where
        F: FnMut(&'static str) -> ConfigResult<Option<String>>,
    {
        let mut read = |name: &'static str| -> ConfigResult<Option<String>> {
            Ok(lookup(name)?.filter(|value| !value.trim().is_empty()))
        };

        let mut config = match read(ENV_BASE_URL)? {
            Some(raw) => Self::new(parse_base_url(&raw)?),
            None => Self::local()?,
        };
        if let Some(raw) = read(ENV_API_PREFIX)? {
            config.endpoints.api_prefix = raw;
        }
        if let Some(raw) = read(ENV_SERVER_PREFIX)? {
            config.endpoints.server_prefix = raw;
        }
        if let Some(raw) = read(ENV_LIST_INTERVAL_MS)? {
            config.cadence.list = parse_millis("poll", "list_interval", &raw)?;
        }
        if let Some(raw) = read(ENV_DETAIL_INTERVAL_MS)? {
            config.cadence.detail = parse_millis("poll", "detail_interval", &raw)?;
        }
        if let Some(raw) = read(ENV_STALE_AFTER)? {
            config.stale_after_failures = parse_positive("poll", "stale_after_failures", &raw)?;
        }
        if let Some(raw) = read(ENV_REQUEST_TIMEOUT_MS)? {
            config.request_timeout = parse_millis("backend", "request_timeout", &raw)?;
        }

        let config = config.validate()?;
        debug!(
            base_url = %config.base_url,
            list_interval_ms = config.cadence.list.as_millis(),
            detail_interval_ms = config.cadence.detail.as_millis(),
            stale_after = config.stale_after_failures,
            "client configuration loaded"
        );
        Ok(config)
    }
}
