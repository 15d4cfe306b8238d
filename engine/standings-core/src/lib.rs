//! # Standings Core
//!
//! Deterministic league standings from completed results.
//!
//! The pipeline runs in four pure stages: a head-to-head matrix built from the season's
//! games, a tie-break policy resolved from caller and league configuration, a recursive
//! ranking that splits tied groups one criterion at a time, and, for final standings, a
//! playoff bracket whose outcomes are layered over the regular season ranking.

pub mod bracket;
pub mod error;
pub mod final_standings;
pub mod head_to_head;
pub mod policy;
pub mod ranking;
pub mod types;


pub use bracket::{
    reconstruct, validate, AuthoritativeBracket, BracketFormat, BracketGame, BracketOrigin,
    BracketSource, InferredBracket, PlayoffBracket, RawBracketGame, Round, Seeding,
};
pub use error::{BracketError, Result, StandingsError};
pub use final_standings::compose;
pub use head_to_head::{DivisionRecord, DivisionRecords, HeadToHeadMatrix};
pub use policy::{
    parse_instructions, resolve, PolicyInputs, PolicySource, ResolvedPolicy, StoredPolicy,
    TieBreakPolicy, TieBreaker,
};
pub use ranking::{rank, RankingContext};
pub use types::{
    Game, PlayoffOutcome, Schedule, StandingEntry, Standings, TeamId, TeamRecord, Week, WeekRange,
};

/// Current version of the standings engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Playoff field size when the league does not configure one
pub const DEFAULT_PLAYOFF_TEAMS: usize = 6;
