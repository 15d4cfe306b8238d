//! Sleeper API response models and their conversion into engine inputs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use standings_core::{Game, RawBracketGame, TeamId, TeamRecord, Week};
use tracing::debug;

/// Sleeper league response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SleeperLeague {
    pub league_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_rosters: u32,
    #[serde(default)]
    pub settings: LeagueSettings,
}

/// The subset of league settings the standings engine reads
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LeagueSettings {
    pub playoff_teams: Option<u32>,
    pub playoff_seed_type: Option<i64>,
    pub playoff_week_start: Option<u32>,
    pub playoff_round_type: Option<u32>,
    pub divisions: Option<u32>,
    pub num_teams: Option<u32>,
}

impl LeagueSettings {
    /// Round type 2 plays the final over two weeks
    pub fn two_week_championship(&self) -> bool {
        self.playoff_round_type == Some(2)
    }

    /// Playoff field size, ignoring non-positive values
    pub fn playoff_team_count(&self) -> Option<usize> {
        self.playoff_teams.filter(|n| *n > 0).map(|n| n as usize)
    }
}

/// Sleeper user response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SleeperUser {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub metadata: Option<UserMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub team_name: Option<String>,
}

/// Sleeper roster response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SleeperRoster {
    pub roster_id: TeamId,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub settings: RosterSettings,
}

/// Season totals. Points are split into an integer part and hundredths.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RosterSettings {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub fpts: f64,
    pub fpts_decimal: f64,
    pub fpts_against: f64,
    pub fpts_against_decimal: f64,
    pub division: Option<u32>,
}

impl RosterSettings {
    pub fn points_for(&self) -> f64 {
        self.fpts + self.fpts_decimal / 100.0
    }

    pub fn points_against(&self) -> f64 {
        self.fpts_against + self.fpts_against_decimal / 100.0
    }
}

/// One roster's row in a week's matchups
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SleeperMatchup {
    pub roster_id: TeamId,
    #[serde(default)]
    pub matchup_id: Option<u32>,
    #[serde(default)]
    pub points: Option<f64>,
}

/// Winners bracket entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SleeperBracketMatchup {
    #[serde(rename = "m")]
    pub matchup_id: u32,
    #[serde(rename = "r")]
    pub round: u32,
    #[serde(rename = "t1", default)]
    pub team1: Option<TeamId>,
    #[serde(rename = "t2", default)]
    pub team2: Option<TeamId>,
    #[serde(rename = "w", default)]
    pub winner: Option<TeamId>,
    #[serde(rename = "l", default)]
    pub loser: Option<TeamId>,
    /// Placement decided by the game
    #[serde(rename = "p", default)]
    pub placement: Option<u32>,
}

impl From<&SleeperBracketMatchup> for RawBracketGame {
    fn from(m: &SleeperBracketMatchup) -> Self {
        RawBracketGame {
            round: m.round,
            team1: m.team1,
            team2: m.team2,
            winner: m.winner,
            loser: m.loser,
            placement: m.placement,
        }
    }
}

/// Join rosters with their owners into team records
pub fn team_records(rosters: &[SleeperRoster], users: &[SleeperUser]) -> Vec<TeamRecord> {
    let users: HashMap<&str, &SleeperUser> =
        users.iter().map(|u| (u.user_id.as_str(), u)).collect();

    rosters
        .iter()
        .map(|roster| {
            let s = &roster.settings;
            let mut record = TeamRecord::new(
                roster.roster_id,
                s.wins,
                s.losses,
                s.ties,
                s.points_for(),
                s.points_against(),
            );
            record.division_id = s.division;

            let owner = roster.owner_id.as_deref().and_then(|id| users.get(id));
            let name = owner
                .and_then(|u| {
                    u.metadata
                        .as_ref()
                        .and_then(|m| m.team_name.clone())
                        .or_else(|| u.display_name.clone())
                })
                .unwrap_or_else(|| format!("Team {}", roster.roster_id));
            record.with_display_name(name)
        })
        .collect()
}

/// Pair a week's matchup rows into games.
///
/// Rows without a matchup id, groups that are not exactly two rosters, and pairings
/// where neither side has scored are skipped.
pub fn games_from_matchups(week: Week, rows: &[SleeperMatchup]) -> Vec<Game> {
    let mut groups: BTreeMap<u32, Vec<&SleeperMatchup>> = BTreeMap::new();
    for row in rows {
        if let Some(matchup_id) = row.matchup_id {
            groups.entry(matchup_id).or_default().push(row);
        }
    }

    groups
        .into_iter()
        .filter_map(|(matchup_id, group)| match group.as_slice() {
            [a, b] => {
                let (score_a, score_b) = (a.points.unwrap_or(0.0), b.points.unwrap_or(0.0));
                if score_a == 0.0 && score_b == 0.0 {
                    debug!(week, matchup_id, "Skipping unplayed matchup");
                    return None;
                }
                Some(Game::new(week, a.roster_id, score_a, b.roster_id, score_b))
            }
            other => {
                debug!(week, matchup_id, rows = other.len(), "Skipping matchup without exactly two rosters");
                None
            }
        })
        .collect()
}
