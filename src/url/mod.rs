//! URL handling module for Sumi-Census
//!
//! This module provides full-string pattern matching for ignore lists and
//! validation of seed URLs.

mod matcher;

use crate::{ConfigError, ConfigResult};
use url::Url;

// Re-export main types
pub use matcher::PatternSet;

/// Validates that a seed URL parses and uses an HTTP(S) scheme
///
/// # Arguments
///
/// * `raw` - The URL as written in the configuration
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(ConfigError::InvalidUrl)` - The URL is malformed or not HTTP(S)
///
/// # Examples
///
/// ```
/// use sumi_census::url::validate_seed_url;
///
/// assert!(validate_seed_url("https://example.com/").is_ok());
/// assert!(validate_seed_url("ftp://example.com/").is_err());
/// assert!(validate_seed_url("not a url").is_err());
/// ```
pub fn validate_seed_url(raw: &str) -> ConfigResult<Url> {
    let parsed =
        Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ConfigError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            raw, other
        ))),
    }
}
