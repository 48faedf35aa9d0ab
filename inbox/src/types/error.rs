//! Unified error types for the inbox
//!
//! Errors are serializable so a rendering layer can show them as-is.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for inbox operations
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum InboxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for InboxError {
    fn from(err: std::io::Error) -> Self {
        InboxError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for InboxError {
    fn from(err: toml::de::Error) -> Self {
        InboxError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for InboxError {
    fn from(err: serde_json::Error) -> Self {
        InboxError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for InboxError {
    fn from(err: url::ParseError) -> Self {
        InboxError::Config(format!("invalid url: {}", err))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for InboxError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            InboxError::Parse(err.to_string())
        } else {
            InboxError::Network(err.to_string())
        }
    }
}

impl From<String> for InboxError {
    fn from(err: String) -> Self {
        InboxError::Other(err)
    }
}

impl From<&str> for InboxError {
    fn from(err: &str) -> Self {
        InboxError::Other(err.to_string())
    }
}

/// Result type alias using InboxError
pub type Result<T> = std::result::Result<T, InboxError>;
