use std::time::Duration;

use thiserror::Error;

/// Errors crossing the helper socket boundary.
#[derive(Debug, Error)]
pub enum HelperError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("helper did not reply within {0:?}")]
    Timeout(Duration),

    #[error("helper version mismatch: expected {expected}, helper reports {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("helper reported: {0}")]
    Remote(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for HelperError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}
