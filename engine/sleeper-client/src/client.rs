//! Sleeper API client

use serde::de::DeserializeOwned;
use standings_core::{Game, RawBracketGame, TeamRecord, Week};
use tracing::{debug, error};

use crate::config::SleeperConfig;
use crate::error::{Result, SleeperError};
use crate::models::{
    games_from_matchups, team_records, SleeperBracketMatchup, SleeperLeague, SleeperMatchup,
    SleeperRoster, SleeperUser,
};

/// Read-only client for the public Sleeper API
#[derive(Debug, Clone)]
pub struct SleeperClient {
    config: SleeperConfig,
    client: reqwest::Client,
}

impl SleeperClient {
    /// Create a new Sleeper API client
    pub fn new(config: SleeperConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SleeperConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{}", self.config.base_url(), path);
        debug!(%url, "Sleeper request");
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(%url, status = status.as_u16(), "Sleeper API error");
            return Err(SleeperError::Api { status: status.as_u16(), message });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Get league metadata. Sleeper answers unknown leagues with `null`.
    pub async fn get_league(&self, league_id: &str) -> Result<SleeperLeague> {
        self.get_json::<Option<SleeperLeague>>(&format!("league/{league_id}"))
            .await?
            .ok_or_else(|| SleeperError::NotFound(format!("league {league_id}")))
    }

    pub async fn get_rosters(&self, league_id: &str) -> Result<Vec<SleeperRoster>> {
        let rosters: Option<Vec<SleeperRoster>> =
            self.get_json(&format!("league/{league_id}/rosters")).await?;
        Ok(rosters.unwrap_or_default())
    }

    pub async fn get_users(&self, league_id: &str) -> Result<Vec<SleeperUser>> {
        let users: Option<Vec<SleeperUser>> =
            self.get_json(&format!("league/{league_id}/users")).await?;
        Ok(users.unwrap_or_default())
    }

    pub async fn get_matchups(&self, league_id: &str, week: Week) -> Result<Vec<SleeperMatchup>> {
        let rows: Option<Vec<SleeperMatchup>> =
            self.get_json(&format!("league/{league_id}/matchups/{week}")).await?;
        Ok(rows.unwrap_or_default())
    }

    pub async fn get_winners_bracket(&self, league_id: &str) -> Result<Vec<SleeperBracketMatchup>> {
        let rows: Option<Vec<SleeperBracketMatchup>> =
            self.get_json(&format!("league/{league_id}/winners_bracket")).await?;
        Ok(rows.unwrap_or_default())
    }

    /// Regular season records with owner display names
    pub async fn get_team_records(&self, league_id: &str) -> Result<Vec<TeamRecord>> {
        let rosters = self.get_rosters(league_id).await?;
        if rosters.is_empty() {
            return Err(SleeperError::NotFound(format!("rosters for league {league_id}")));
        }
        // Names are cosmetic; rank without them if users are unavailable
        let users = match self.get_users(league_id).await {
            Ok(users) => users,
            Err(e) => {
                debug!(league_id, error = %e, "Proceeding without user names");
                Vec::new()
            }
        };
        Ok(team_records(&rosters, &users))
    }

    /// Completed games of one week
    pub async fn get_games(&self, league_id: &str, week: Week) -> Result<Vec<Game>> {
        let rows = self.get_matchups(league_id, week).await?;
        Ok(games_from_matchups(week, &rows))
    }

    /// Winners bracket as engine input
    pub async fn get_bracket(&self, league_id: &str) -> Result<Vec<RawBracketGame>> {
        let rows = self.get_winners_bracket(league_id).await?;
        Ok(rows.iter().map(RawBracketGame::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_default_config() {
        let client = SleeperClient::new(SleeperConfig::default()).unwrap();
        assert_eq!(client.config().base_url(), "https://api.sleeper.app/v1");
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let config = SleeperConfig { api_base_url: "http://localhost:9000/".into(), timeout_secs: 1 };
        let client = SleeperClient::new(config).unwrap();
        assert_eq!(client.config().base_url(), "http://localhost:9000");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transient_http_error() {
        let config = SleeperConfig { api_base_url: "http://127.0.0.1:9".into(), timeout_secs: 1 };
        let client = SleeperClient::new(config).unwrap();

        let error = client.get_league("1").await.unwrap_err();
        assert!(matches!(error, SleeperError::Http(_)));
        assert!(error.is_transient());
    }
}
