//! Error types for the Sleeper client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SleeperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sleeper API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

impl SleeperError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SleeperError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            SleeperError::Api { status, .. } => *status == 429 || *status >= 500,
            SleeperError::NotFound(_) | SleeperError::InvalidResponse(_) => false,
        }
    }
}

/// Result type for Sleeper client operations
pub type Result<T> = std::result::Result<T, SleeperError>;
