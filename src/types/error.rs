//! Unified error types for the crate
//!
//! Errors are serializable so an embedding frontend can consume them
//! directly. Read paths in the mailbox client deliberately collapse
//! failures to empty results instead of returning these (see module docs
//! in `mailbox`); the variants here surface at construction and config
//! seams and inside the cloud sync worker.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type for configuration, cache, and cloud operations
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum MailError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Service error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for MailError {
    fn from(err: serde_json::Error) -> Self {
        MailError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        MailError::Network(err.to_string())
    }
}

/// Result type alias using MailError
pub type Result<T> = std::result::Result<T, MailError>;
