use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use postbox_core::config::{optional_trimmed, parse_in_range, value_or_default, ConfigError};
use postbox_core::store::DEFAULT_STORE_FILE;

const DEFAULT_PORT: u64 = 3001;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub store_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    /// `POSTBOX_API_BIND_ADDR` wins; otherwise a bare `PORT` binds every
    /// interface.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = match optional_trimmed(&lookup, "POSTBOX_API_BIND_ADDR") {
            Some(addr) => addr,
            None if optional_trimmed(&lookup, "PORT").is_some() => {
                let port = parse_in_range(&lookup, "PORT", DEFAULT_PORT, 1..=65_535)?;
                format!("0.0.0.0:{port}")
            }
            None => format!("127.0.0.1:{DEFAULT_PORT}"),
        };
        if !bind_addr.contains(':') {
            return Err(ConfigError::Invalid(
                "POSTBOX_API_BIND_ADDR must be host:port".to_string(),
            ));
        }

        let store_path = PathBuf::from(value_or_default(
            &lookup,
            "POSTBOX_STORE_PATH",
            DEFAULT_STORE_FILE,
        ));

        Ok(Self {
            bind_addr,
            store_path,
        })
    }
}
