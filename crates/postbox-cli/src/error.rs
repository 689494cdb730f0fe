use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] postbox_core::Error),
    #[error(transparent)]
    ClientConfig(#[from] postbox_core::config::ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No message body provided (pass --message or pipe it on stdin)")]
    EmptyMessage,
    #[error("Configuration error: {0}")]
    Config(String),
}
