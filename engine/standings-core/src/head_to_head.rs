//! Head-to-head win matrix and in-division records built from completed games

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{Game, Schedule, TeamId, TeamRecord, WeekRange};

/// Directed win counts: `wins(a, b)` is how often `a` beat `b` directly
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadMatrix {
    wins: BTreeMap<TeamId, BTreeMap<TeamId, u32>>,
}

impl HeadToHeadMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the matrix from every available week inside `range`
    pub fn build(schedule: &Schedule, range: WeekRange) -> Self {
        let mut matrix = Self::new();
        let missing = schedule.missing_weeks(range);
        if !missing.is_empty() {
            warn!(?missing, "Skipping weeks without game data in head-to-head scan");
        }

        for (week, games) in schedule.weeks_in(range) {
            let counted = matrix.record_week(games);
            debug!(week, counted, "Recorded head-to-head results");
        }
        matrix
    }

    /// Record the decided games of one week, returning how many were counted
    pub fn record_week(&mut self, games: &[Game]) -> usize {
        let mut counted = 0;
        for game in games {
            if !game.is_valid() {
                warn!(week = game.week, team_a = game.team_a, team_b = game.team_b, "Skipping malformed game");
                continue;
            }
            if let (Some(winner), Some(loser)) = (game.winner(), game.loser()) {
                *self.wins.entry(winner).or_default().entry(loser).or_insert(0) += 1;
                counted += 1;
            }
        }
        counted
    }

    pub fn wins(&self, team: TeamId, opponent: TeamId) -> u32 {
        self.wins
            .get(&team)
            .and_then(|row| row.get(&opponent))
            .copied()
            .unwrap_or(0)
    }

    /// True iff every pair of distinct teams has at least one decided result
    pub fn has_complete_data(&self, teams: &[TeamId]) -> bool {
        teams.iter().enumerate().all(|(i, &a)| {
            teams[i + 1..]
                .iter()
                .filter(|&&b| b != a)
                .all(|&b| self.wins(a, b) + self.wins(b, a) > 0)
        })
    }

    /// Wins and losses of `team` counted only against the other members of `group`
    pub fn record_within(&self, team: TeamId, group: &[TeamId]) -> (u32, u32) {
        group
            .iter()
            .filter(|&&other| other != team)
            .fold((0, 0), |(w, l), &other| {
                (w + self.wins(team, other), l + self.wins(other, team))
            })
    }

    /// Wins of `team` against each other member of `group`
    pub fn wins_against(&self, team: TeamId, group: &[TeamId]) -> BTreeMap<TeamId, u32> {
        group
            .iter()
            .filter(|&&other| other != team)
            .map(|&other| (other, self.wins(team, other)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.wins.is_empty()
    }
}

/// In-division win/loss/tie counts for one team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl DivisionRecord {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Ties count as half a win
    pub fn win_percentage(&self) -> Option<f64> {
        match self.games() {
            0 => None,
            games => Some((f64::from(self.wins) + 0.5 * f64::from(self.ties)) / f64::from(games)),
        }
    }
}

/// Division records keyed by team
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DivisionRecords {
    records: BTreeMap<TeamId, DivisionRecord>,
}

impl DivisionRecords {
    /// Scan games in `range` between teams that share a known division
    pub fn build(schedule: &Schedule, range: WeekRange, teams: &[TeamRecord]) -> Self {
        let divisions: HashMap<TeamId, u32> = teams
            .iter()
            .filter_map(|t| t.division_id.map(|d| (t.team_id, d)))
            .collect();

        let mut records: BTreeMap<TeamId, DivisionRecord> = BTreeMap::new();
        if divisions.is_empty() {
            return Self { records };
        }

        for (_, games) in schedule.weeks_in(range) {
            for game in games.iter().filter(|g| g.is_valid()) {
                let same_division = matches!(
                    (divisions.get(&game.team_a), divisions.get(&game.team_b)),
                    (Some(a), Some(b)) if a == b
                );
                if !same_division {
                    continue;
                }
                match (game.winner(), game.loser()) {
                    (Some(winner), Some(loser)) => {
                        records.entry(winner).or_default().wins += 1;
                        records.entry(loser).or_default().losses += 1;
                    }
                    _ => {
                        records.entry(game.team_a).or_default().ties += 1;
                        records.entry(game.team_b).or_default().ties += 1;
                    }
                }
            }
        }
        Self { records }
    }

    pub fn get(&self, team: TeamId) -> Option<&DivisionRecord> {
        self.records.get(&team)
    }

    pub fn win_percentage(&self, team: TeamId) -> Option<f64> {
        self.records.get(&team).and_then(DivisionRecord::win_percentage)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
