//! Per-league custom standings configuration stored as JSON

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use standings_core::StoredPolicy;
use tracing::info;

use crate::error::{Result, ServiceError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueSettings {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub custom_standings: StoredPolicy,
}

/// Contents of the league settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueSettingsStore {
    #[serde(default)]
    pub leagues: HashMap<String, LeagueSettings>,
    #[serde(default)]
    pub default_settings: LeagueSettings,
}

impl LeagueSettingsStore {
    /// Load the store. A missing file yields the built-in defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No league settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|source| ServiceError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&content)
            .map_err(|source| ServiceError::SettingsParse { path: path.to_path_buf(), source })
    }

    /// Settings for a league, falling back to `default_settings`
    pub fn settings_for(&self, league_id: &str) -> &LeagueSettings {
        self.leagues.get(league_id).unwrap_or(&self.default_settings)
    }

    /// The league's stored policy; the resolver only honours it when enabled
    pub fn stored_policy(&self, league_id: &str) -> &StoredPolicy {
        &self.settings_for(league_id).custom_standings
    }

    pub fn has_custom_standings(&self, league_id: &str) -> bool {
        self.stored_policy(league_id).enabled
    }
}
