//! Error types for the standings service

use std::path::PathBuf;
use std::time::Duration;

use sleeper_client::SleeperError;
use standings_core::StandingsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid league settings file {path:?}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Sleeper error: {0}")]
    Sleeper(#[from] SleeperError),

    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("No team records for league {league_id}")]
    NoTeams { league_id: String },

    #[error("Standings request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Standings error: {0}")]
    Standings(#[from] StandingsError),
}

impl ServiceError {
    /// Whether a retry of the same fetch may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Sleeper(e) => e.is_transient(),
            ServiceError::Unavailable(_) => true,
            _ => false,
        }
    }
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
