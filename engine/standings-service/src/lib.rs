//! League Standings Service Library
//!
//! Resolves tie-break policies, fetches league data from a [`LeagueDataSource`] and runs the
//! standings engine for regular season or final standings requests.

use anyhow::{Context, Result};
use std::path::Path;

pub mod config;
pub mod error;
pub mod league_settings;
pub mod logging;
pub mod service;
pub mod source;


pub use config::{FetchConfig, LoggingConfig, RetryConfig, SeasonConfig, ServiceConfig};
pub use error::ServiceError;
pub use league_settings::{LeagueSettings, LeagueSettingsStore};
pub use logging::{initialize_logging, initialize_logging_with_config};
pub use service::{FinalStatus, StandingsMode, StandingsReport, StandingsService, DEGRADED_NOTE};
pub use source::{LeagueDataSource, LeagueInfo};

/// Load configuration from an optional file and environment variables
pub fn load_configuration(path: Option<&Path>) -> Result<ServiceConfig> {
    ServiceConfig::load(path).context("Failed to load service configuration")
}
