//! League data sources

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sleeper_client::SleeperClient;
use standings_core::{Game, RawBracketGame, TeamRecord, Week};

use crate::error::Result;

/// League metadata the standings pipeline reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueInfo {
    pub league_id: String,
    pub name: String,
    pub season: String,
    pub playoff_teams: Option<usize>,
    pub playoff_seed_type: Option<i64>,
    pub playoff_week_start: Option<u32>,
    pub two_week_championship: bool,
}

/// Where league records, games and brackets come from
#[async_trait]
pub trait LeagueDataSource: Send + Sync {
    async fn league_info(&self, league_id: &str) -> Result<LeagueInfo>;

    async fn team_records(&self, league_id: &str) -> Result<Vec<TeamRecord>>;

    async fn games(&self, league_id: &str, week: Week) -> Result<Vec<Game>>;

    async fn bracket(&self, league_id: &str) -> Result<Vec<RawBracketGame>>;
}

#[async_trait]
impl LeagueDataSource for SleeperClient {
    async fn league_info(&self, league_id: &str) -> Result<LeagueInfo> {
        let league = self.get_league(league_id).await?;
        let settings = &league.settings;
        Ok(LeagueInfo {
            league_id: league.league_id.clone(),
            name: league.name.clone(),
            season: league.season.clone(),
            playoff_teams: settings.playoff_team_count(),
            playoff_seed_type: settings.playoff_seed_type,
            playoff_week_start: settings.playoff_week_start,
            two_week_championship: settings.two_week_championship(),
        })
    }

    async fn team_records(&self, league_id: &str) -> Result<Vec<TeamRecord>> {
        Ok(self.get_team_records(league_id).await?)
    }

    async fn games(&self, league_id: &str, week: Week) -> Result<Vec<Game>> {
        Ok(self.get_games(league_id, week).await?)
    }

    async fn bracket(&self, league_id: &str) -> Result<Vec<RawBracketGame>> {
        Ok(self.get_bracket(league_id).await?)
    }
}
