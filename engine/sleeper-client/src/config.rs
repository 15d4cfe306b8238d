//! Configuration for the Sleeper client

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://api.sleeper.app/v1";

/// Sleeper API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleeperConfig {
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl Default for SleeperConfig {
    fn default() -> Self {
        Self { api_base_url: DEFAULT_API_BASE_URL.to_string(), timeout_secs: 10 }
    }
}

impl SleeperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
