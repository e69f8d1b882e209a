use std::time::Duration;

use thiserror::Error;

/// Errors produced by the transport and the sync engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Message too long (max {max} characters)")]
    MessageTooLong { max: usize },
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::MalformedResponse(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}
