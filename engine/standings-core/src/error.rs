//! Error types for standings computation

use thiserror::Error;

use crate::bracket::BracketFormat;
use crate::types::{TeamId, Week};

/// Errors raised while ranking teams or composing final standings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StandingsError {
    #[error("No team records supplied")]
    NoTeams,

    #[error("Unknown tie-breaker: {0}")]
    UnknownTieBreaker(String),

    #[error("Bracket error: {0}")]
    Bracket(#[from] BracketError),
}

/// Errors raised while reconstructing or validating a playoff bracket
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BracketError {
    #[error("No bracket data available")]
    Unavailable,

    #[error("Bracket structure could not be detected: {0}")]
    StructureNotDetected(String),

    #[error("Expected {expected} seeded teams, found {found}")]
    SeedCountMismatch { expected: usize, found: usize },

    #[error("Round {round} has {found} games, expected at least {expected}")]
    MissingRound {
        round: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Expected exactly one championship game, found {0}")]
    ChampionshipCount(usize),

    #[error("Third-place result {0}")]
    ThirdPlaceMismatch(&'static str),

    #[error("Championship participants do not match semifinal winners")]
    ChampionshipParticipants,

    #[error("Team {0} plays in the bracket but is not seeded")]
    UnseededTeam(TeamId),

    #[error("Bracket format {found:?} contradicts league setting {expected:?}")]
    FormatMismatch {
        expected: BracketFormat,
        found: BracketFormat,
    },

    #[error("Week {week} game between {team_a} and {team_b} has no winner")]
    Undecided {
        week: Week,
        team_a: TeamId,
        team_b: TeamId,
    },
}

/// Result type for standings operations
pub type Result<T> = std::result::Result<T, StandingsError>;
