//! Environment-driven configuration.
//!
//! Values are read through a lookup closure so tests can feed a map instead
//! of mutating the process environment. The helpers here are shared with the
//! collector binary.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_COLLECTOR_URL: &str = "http://localhost:3001";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_RESET_DELAY_MS: u64 = 3_000;
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Submission client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Collector base URL, without a trailing slash
    pub collector_url: String,
    /// Upper bound for the single delivery attempt made by a submit
    pub request_timeout: Duration,
    /// Delay before a `success`/`error` status reverts to `idle`
    pub reset_delay: Duration,
    /// Pause between background outbox sync passes
    pub sync_interval: Duration,
    /// Directory holding the local cache and outbox files
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            collector_url: DEFAULT_COLLECTOR_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            reset_delay: Duration::from_millis(DEFAULT_RESET_DELAY_MS),
            sync_interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
            data_dir: default_data_dir(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let collector_url = http_url_or_default(
            &lookup,
            "POSTBOX_COLLECTOR_URL",
            DEFAULT_COLLECTOR_URL,
        )?;

        let request_timeout_ms = parse_in_range(
            &lookup,
            "POSTBOX_TIMEOUT_MS",
            DEFAULT_REQUEST_TIMEOUT_MS,
            100..=120_000,
        )?;
        let reset_delay_ms = parse_in_range(
            &lookup,
            "POSTBOX_RESET_DELAY_MS",
            DEFAULT_RESET_DELAY_MS,
            0..=60_000,
        )?;
        let sync_interval_secs = parse_in_range(
            &lookup,
            "POSTBOX_SYNC_INTERVAL_SECS",
            DEFAULT_SYNC_INTERVAL_SECS,
            1..=86_400,
        )?;

        let data_dir =
            optional_trimmed(&lookup, "POSTBOX_DATA_DIR").map_or_else(default_data_dir, PathBuf::from);

        Ok(Self {
            collector_url,
            request_timeout: Duration::from_millis(request_timeout_ms),
            reset_delay: Duration::from_millis(reset_delay_ms),
            sync_interval: Duration::from_secs(sync_interval_secs),
            data_dir,
        })
    }
}

/// Platform data directory for the client, falling back to the working directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("postbox")
}

pub fn value_or_default(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

pub fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}

/// Parse an unsigned integer variable, falling back to `default` when unset.
pub fn parse_in_range(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
    range: std::ops::RangeInclusive<u64>,
) -> Result<u64, ConfigError> {
    let Some(raw) = optional_trimmed(lookup, name) else {
        return Ok(default);
    };
    let value = raw.parse::<u64>().map_err(|_| {
        ConfigError::Invalid(format!(
            "{name} must be an integer in [{}, {}]",
            range.start(),
            range.end()
        ))
    })?;
    if !range.contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be in [{}, {}]",
            range.start(),
            range.end()
        )));
    }
    Ok(value)
}

/// Read an `http(s)://` URL variable and strip trailing slashes.
pub fn http_url_or_default(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
) -> Result<String, ConfigError> {
    let value = value_or_default(lookup, name, default);
    if !is_http_url(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must start with http:// or https://"
        )));
    }
    Ok(value.trim_end_matches('/').to_string())
}
