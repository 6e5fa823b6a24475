//! Error types for the streaming core.

use thiserror::Error;

/// Errors surfaced by the streaming core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Change source error: {0}")]
    Source(String),

    #[error("Malformed payload: {0}")]
    Decode(String),

    #[error("Sink closed: {0}")]
    SinkClosed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => CoreError::NotFound(e.to_string()),
            other => CoreError::Source(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

/// Result type for streaming core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
