//! Error types for postbox-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using postbox-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in postbox-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted list exists but does not hold a JSON array of records
    #[error("Corrupt store at {path}: {source}")]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP transport error talking to the collector
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The collector answered but did not acknowledge the request
    #[error("Collector error: {0}")]
    Collector(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}
