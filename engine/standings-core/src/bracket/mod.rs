//! Playoff bracket model and reconstruction
//!
//! A bracket can come from the platform's own bracket data ([`AuthoritativeBracket`]) or
//! be inferred from the playoff weeks' games ([`InferredBracket`]). Both implement
//! [`BracketSource`]; [`reconstruct`] tries them in order and returns the first bracket
//! that passes [`validate`].

mod authoritative;
mod inferred;
mod validation;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::BracketError;
use crate::types::{Standings, TeamId, Week};

pub use authoritative::{AuthoritativeBracket, RawBracketGame};
pub use inferred::InferredBracket;
pub use validation::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    Quarterfinal,
    Semifinal,
    Championship,
    ThirdPlace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketFormat {
    SingleGameFinal,
    /// Final played over two consecutive weeks with aggregated scores
    TwoWeekAggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketOrigin {
    Authoritative,
    Inferred,
}

/// A decided playoff game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketGame {
    pub round: Round,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team1_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team2_score: Option<f64>,
    pub winner_id: TeamId,
    pub loser_id: TeamId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weeks: Vec<Week>,
}

impl BracketGame {
    /// Decide a game by score. Equal scores leave it undecided.
    pub fn from_scores(
        round: Round,
        weeks: Vec<Week>,
        (team1_id, team1_score): (TeamId, f64),
        (team2_id, team2_score): (TeamId, f64),
    ) -> Result<Self, BracketError> {
        let (winner_id, loser_id) = if team1_score > team2_score {
            (team1_id, team2_id)
        } else if team2_score > team1_score {
            (team2_id, team1_id)
        } else {
            return Err(BracketError::Undecided {
                week: weeks.last().copied().unwrap_or_default(),
                team_a: team1_id,
                team_b: team2_id,
            });
        };

        Ok(Self {
            round,
            team1_id,
            team2_id,
            team1_score: Some(team1_score),
            team2_score: Some(team2_score),
            winner_id,
            loser_id,
            weeks,
        })
    }

    /// A game known only by its result. `None` unless winner and loser are the two participants.
    pub fn from_result(
        round: Round,
        team1_id: TeamId,
        team2_id: TeamId,
        winner_id: TeamId,
        loser_id: TeamId,
    ) -> Option<Self> {
        let consistent = team1_id != team2_id
            && ((winner_id == team1_id && loser_id == team2_id)
                || (winner_id == team2_id && loser_id == team1_id));
        consistent.then_some(Self {
            round,
            team1_id,
            team2_id,
            team1_score: None,
            team2_score: None,
            winner_id,
            loser_id,
            weeks: Vec::new(),
        })
    }

    pub fn participants(&self) -> [TeamId; 2] {
        [self.team1_id, self.team2_id]
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.team1_id == team || self.team2_id == team
    }
}

/// Playoff seeds taken from the top of the regular season ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seeding {
    seeds: BTreeMap<TeamId, u32>,
    configured: usize,
}

impl Seeding {
    /// Seed the first `playoff_teams` entries of `standings`
    pub fn from_standings(standings: &Standings, playoff_teams: usize) -> Self {
        let seeds = standings
            .entries
            .iter()
            .take(playoff_teams)
            .enumerate()
            .map(|(index, entry)| (entry.team_id, index as u32 + 1))
            .collect();
        Self { seeds, configured: playoff_teams }
    }

    /// Seeds listed best first
    pub fn from_teams(teams: &[TeamId]) -> Self {
        let seeds = teams
            .iter()
            .enumerate()
            .map(|(index, team)| (*team, index as u32 + 1))
            .collect();
        Self { seeds, configured: teams.len() }
    }

    pub fn seed_of(&self, team: TeamId) -> Option<u32> {
        self.seeds.get(&team).copied()
    }

    pub fn contains(&self, team: TeamId) -> bool {
        self.seeds.contains_key(&team)
    }

    /// Teams ordered by seed
    pub fn teams(&self) -> Vec<TeamId> {
        let mut teams: Vec<(TeamId, u32)> = self.seeds.iter().map(|(t, s)| (*t, *s)).collect();
        teams.sort_by_key(|(_, seed)| *seed);
        teams.into_iter().map(|(team, _)| team).collect()
    }

    pub fn seeds(&self) -> &BTreeMap<TeamId, u32> {
        &self.seeds
    }

    pub fn configured(&self) -> usize {
        self.configured
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

/// A reconstructed playoff bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffBracket {
    /// Team to seed, seeds 1..N
    pub playoff_teams: BTreeMap<TeamId, u32>,
    pub quarterfinals: Vec<BracketGame>,
    pub semifinals: Vec<BracketGame>,
    pub championship: Option<BracketGame>,
    pub third_place: Option<BracketGame>,
    pub has_third_place: bool,
    pub format: BracketFormat,
    pub origin: BracketOrigin,
    /// Playoff weeks the bracket was read from, empty for authoritative data
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weeks: Vec<Week>,
}

impl PlayoffBracket {
    pub fn new(seeding: &Seeding, origin: BracketOrigin) -> Self {
        Self {
            playoff_teams: seeding.seeds().clone(),
            quarterfinals: Vec::new(),
            semifinals: Vec::new(),
            championship: None,
            third_place: None,
            has_third_place: false,
            format: BracketFormat::SingleGameFinal,
            origin,
            weeks: Vec::new(),
        }
    }

    pub fn champion(&self) -> Option<TeamId> {
        self.championship.as_ref().map(|g| g.winner_id)
    }

    pub fn is_playoff_team(&self, team: TeamId) -> bool {
        self.playoff_teams.contains_key(&team)
    }
}

/// A strategy for building a bracket for a given seeding
pub trait BracketSource {
    fn name(&self) -> &'static str;

    fn build(&self, seeding: &Seeding) -> Result<PlayoffBracket, BracketError>;
}

/// Try each source in order and return the first bracket that validates
pub fn reconstruct(
    sources: &[&dyn BracketSource],
    seeding: &Seeding,
) -> Result<PlayoffBracket, BracketError> {
    let mut last_error = BracketError::Unavailable;

    for source in sources {
        let attempt = source
            .build(seeding)
            .and_then(|bracket| validate(&bracket, seeding.configured()).map(|_| bracket));
        match attempt {
            Ok(bracket) => {
                info!(
                    source = source.name(),
                    champion = ?bracket.champion(),
                    format = ?bracket.format,
                    "Reconstructed playoff bracket"
                );
                return Ok(bracket);
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "Bracket source failed");
                last_error = e;
            }
        }
    }

    Err(last_error)
}
