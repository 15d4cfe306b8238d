//! Service configuration management

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sleeper_client::SleeperConfig;
use standings_core::{WeekRange, DEFAULT_PLAYOFF_TEAMS};
use tracing::{debug, warn};

use crate::error::{Result, ServiceError};

/// Main service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Sleeper API configuration
    pub sleeper: SleeperConfig,

    /// Season calendar
    pub season: SeasonConfig,

    /// Weekly game fetching
    pub fetch: FetchConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Path of the per-league custom standings file
    pub settings_file: PathBuf,

    /// Upper bound on one standings computation, in seconds
    pub request_timeout_secs: u64,
}

/// Week numbers of the fantasy season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonConfig {
    pub regular_season_end_week: u32,
    pub playoff_start_week: u32,
    pub playoff_end_week: u32,
    /// Playoff field size when the league does not report one
    pub default_playoff_teams: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum weeks fetched at once
    pub concurrency: usize,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries
    pub max_retries: u32,

    /// Initial retry delay in milliseconds
    pub initial_delay_ms: u64,

    /// Maximum retry delay in milliseconds
    pub max_delay_ms: u64,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            sleeper: SleeperConfig::default(),
            season: SeasonConfig::default(),
            fetch: FetchConfig::default(),
            logging: LoggingConfig::default(),
            settings_file: PathBuf::from("configs/league_settings.json"),
            request_timeout_secs: 30,
        }
    }
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            regular_season_end_week: 14,
            playoff_start_week: 15,
            playoff_end_week: 18,
            default_playoff_teams: DEFAULT_PLAYOFF_TEAMS,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { concurrency: 4, retry: RetryConfig::default() }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, initial_delay_ms: 250, max_delay_ms: 4_000, backoff_multiplier: 2.0 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl SeasonConfig {
    pub fn regular_season(&self) -> WeekRange {
        WeekRange::new(1, self.regular_season_end_week)
    }

    /// Playoff window, starting at the league's own playoff week when it reports one
    pub fn playoff_window(&self, league_start: Option<u32>) -> WeekRange {
        let start = league_start.filter(|w| *w > 0).unwrap_or(self.playoff_start_week);
        WeekRange::new(start, self.playoff_end_week.max(start))
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt`, counting from zero
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.max(1.0).powi(attempt as i32);
        let delay = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
        Duration::from_millis(delay as u64)
    }
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ServiceError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&content)
            .map_err(|source| ServiceError::ConfigParse { path: path.to_path_buf(), source })
    }

    /// Defaults, then the optional file, then `STANDINGS_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                debug!("Loading configuration from file: {:?}", path);
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment-style variables
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STANDINGS_SLEEPER_API_URL") {
            self.sleeper.api_base_url = url;
        }
        if let Some(level) = lookup("STANDINGS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("STANDINGS_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(path) = lookup("STANDINGS_SETTINGS_FILE") {
            self.settings_file = PathBuf::from(path);
        }

        parse_into(&lookup, "STANDINGS_REQUEST_TIMEOUT_SECS", &mut self.request_timeout_secs);
        parse_into(&lookup, "STANDINGS_FETCH_CONCURRENCY", &mut self.fetch.concurrency);
        parse_into(&lookup, "STANDINGS_MAX_RETRIES", &mut self.fetch.retry.max_retries);
        parse_into(&lookup, "STANDINGS_REGULAR_SEASON_END_WEEK", &mut self.season.regular_season_end_week);
        parse_into(&lookup, "STANDINGS_PLAYOFF_START_WEEK", &mut self.season.playoff_start_week);
        parse_into(&lookup, "STANDINGS_PLAYOFF_END_WEEK", &mut self.season.playoff_end_week);
        parse_into(&lookup, "STANDINGS_DEFAULT_PLAYOFF_TEAMS", &mut self.season.default_playoff_teams);
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let season = &self.season;
        if season.regular_season_end_week == 0 {
            return invalid("regular_season_end_week must be at least 1");
        }
        if season.playoff_start_week <= season.regular_season_end_week {
            return invalid("playoff_start_week must come after the regular season");
        }
        if season.playoff_end_week < season.playoff_start_week {
            return invalid("playoff_end_week must not precede playoff_start_week");
        }
        if season.default_playoff_teams < 2 {
            return invalid("default_playoff_teams must be at least 2");
        }
        if self.fetch.concurrency == 0 {
            return invalid("fetch.concurrency must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            return invalid("request_timeout_secs must be at least 1");
        }
        Ok(())
    }
}

fn invalid(message: &str) -> Result<()> {
    Err(ServiceError::InvalidConfig { message: message.to_string() })
}

fn parse_into<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => warn!(key, value = %raw, "Ignoring unparsable environment override"),
        }
    }
}
