//! Validation and parsing helpers for client settings.

use std::time::Duration;

use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Parse and check a backend origin.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not an absolute
/// `http` or `https` URL.
pub fn parse_base_url(raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|err| ConfigError::invalid_field("backend", "base_url", err.to_string()))?;
    check_base_url(&url)?;
    Ok(url)
}

pub(crate) fn check_base_url(url: &Url) -> ConfigResult<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid_field(
            "backend",
            "base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigError::invalid_field(
            "backend",
            "base_url",
            "must include a host",
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::invalid_field(
            "backend",
            "base_url",
            "must not carry a query or fragment",
        ));
    }
    Ok(())
}

/// Normalise a path prefix to `/segment[/segment...]` without a trailing
/// slash. An empty or `/` prefix maps to the origin root.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the prefix contains a query,
/// fragment, or whitespace.
pub fn normalize_prefix(field: &str, raw: &str) -> ConfigResult<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.contains(['?', '#']) || trimmed.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid_field(
            "endpoints",
            field,
            "must be a plain path",
        ));
    }
    if trimmed.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("/{trimmed}"))
    }
}

/// Parse a millisecond count into a non-zero duration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for non-numeric or zero values.
pub fn parse_millis(section: &str, field: &str, raw: &str) -> ConfigResult<Duration> {
    let millis = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::invalid_field(section, field, "must be a whole number of milliseconds"))?;
    if millis == 0 {
        return Err(ConfigError::invalid_field(section, field, "must be positive"));
    }
    Ok(Duration::from_millis(millis))
}

/// Parse a positive count.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for non-numeric or zero values.
pub fn parse_positive(section: &str, field: &str, raw: &str) -> ConfigResult<u32> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(ConfigError::invalid_field(section, field, "must be at least 1")),
        Ok(value) => Ok(value),
        Err(_) => Err(ConfigError::invalid_field(section, field, "must be a positive integer")),
    }
}

pub(crate) fn check_positive_duration(
    section: &str,
    field: &str,
    value: Duration,
) -> ConfigResult<()> {
    if value.is_zero() {
        Err(ConfigError::invalid_field(section, field, "must be positive"))
    } else {
        Ok(())
    }
}
