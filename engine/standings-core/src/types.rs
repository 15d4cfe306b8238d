//! Core data model shared by every stage of the standings pipeline

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::policy::TieBreakPolicy;

pub type TeamId = u32;
pub type Week = u32;

/// One team's regular season record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team_id: TeamId,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: f64,
    pub points_against: f64,
    #[serde(default)]
    pub division_id: Option<u32>,
    /// Playoff seed, assigned after ranking
    #[serde(default)]
    pub seed: Option<u32>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl TeamRecord {
    pub fn new(
        team_id: TeamId,
        wins: u32,
        losses: u32,
        ties: u32,
        points_for: f64,
        points_against: f64,
    ) -> Self {
        Self {
            team_id,
            wins,
            losses,
            ties,
            points_for,
            points_against,
            division_id: None,
            seed: None,
            display_name: None,
        }
    }

    pub fn with_division(mut self, division_id: u32) -> Self {
        self.division_id = Some(division_id);
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }
}

/// A completed matchup between two teams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub week: Week,
    pub team_a: TeamId,
    pub team_b: TeamId,
    pub score_a: f64,
    pub score_b: f64,
}

impl Game {
    pub fn new(week: Week, team_a: TeamId, score_a: f64, team_b: TeamId, score_b: f64) -> Self {
        Self { week, team_a, team_b, score_a, score_b }
    }

    /// Two distinct teams with finite, non-negative scores
    pub fn is_valid(&self) -> bool {
        self.team_a != self.team_b
            && self.score_a.is_finite()
            && self.score_b.is_finite()
            && self.score_a >= 0.0
            && self.score_b >= 0.0
    }

    pub fn is_tie(&self) -> bool {
        self.score_a == self.score_b
    }

    pub fn winner(&self) -> Option<TeamId> {
        if self.score_a > self.score_b {
            Some(self.team_a)
        } else if self.score_b > self.score_a {
            Some(self.team_b)
        } else {
            None
        }
    }

    pub fn loser(&self) -> Option<TeamId> {
        self.winner().map(|w| if w == self.team_a { self.team_b } else { self.team_a })
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.team_a == team || self.team_b == team
    }

    pub fn score_of(&self, team: TeamId) -> Option<f64> {
        if team == self.team_a {
            Some(self.score_a)
        } else if team == self.team_b {
            Some(self.score_b)
        } else {
            None
        }
    }

    pub fn opponent_of(&self, team: TeamId) -> Option<TeamId> {
        if team == self.team_a {
            Some(self.team_b)
        } else if team == self.team_b {
            Some(self.team_a)
        } else {
            None
        }
    }
}

/// Inclusive range of weeks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: Week,
    pub end: Week,
}

impl WeekRange {
    pub fn new(start: Week, end: Week) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, week: Week) -> bool {
        week >= self.start && week <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn weeks(&self) -> RangeInclusive<Week> {
        self.start..=self.end
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "weeks {}-{}", self.start, self.end)
    }
}

/// Snapshot of completed games keyed by week.
///
/// A week that is absent could not be retrieved; every consumer skips it
/// rather than treating it as a week without games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    weeks: BTreeMap<Week, Vec<Game>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the games of a week, stamping each game with that week
    pub fn insert_week(&mut self, week: Week, mut games: Vec<Game>) {
        for game in &mut games {
            game.week = week;
        }
        self.weeks.insert(week, games);
    }

    pub fn week(&self, week: Week) -> Option<&[Game]> {
        self.weeks.get(&week).map(Vec::as_slice)
    }

    pub fn has_week(&self, week: Week) -> bool {
        self.weeks.contains_key(&week)
    }

    /// Weeks inside `range` that have data, in ascending order
    pub fn weeks_in(&self, range: WeekRange) -> impl Iterator<Item = (Week, &[Game])> + '_ {
        self.weeks
            .range(range.weeks())
            .map(|(week, games)| (*week, games.as_slice()))
    }

    /// Weeks inside `range` without data
    pub fn missing_weeks(&self, range: WeekRange) -> Vec<Week> {
        range.weeks().filter(|w| !self.weeks.contains_key(w)).collect()
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}

impl FromIterator<(Week, Vec<Game>)> for Schedule {
    fn from_iter<I: IntoIterator<Item = (Week, Vec<Game>)>>(iter: I) -> Self {
        let mut schedule = Schedule::new();
        for (week, games) in iter {
            schedule.insert_week(week, games);
        }
        schedule
    }
}

/// How a team's season ended, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayoffOutcome {
    Champion,
    RunnerUp,
    ThirdPlace,
    FourthPlace,
    /// Lost a semifinal in a bracket without a third-place result
    SemifinalLoss,
    QuarterfinalLoss,
    NoPlayoffs,
}

impl PlayoffOutcome {
    /// Sort priority, lower is better
    pub fn priority(&self) -> u8 {
        match self {
            PlayoffOutcome::Champion => 1,
            PlayoffOutcome::RunnerUp => 2,
            PlayoffOutcome::ThirdPlace => 3,
            PlayoffOutcome::FourthPlace => 4,
            PlayoffOutcome::SemifinalLoss => 5,
            PlayoffOutcome::QuarterfinalLoss => 6,
            PlayoffOutcome::NoPlayoffs => 7,
        }
    }

    /// Whether teams sharing this outcome are ordered by regular season rank
    pub fn uses_regular_season_rank(&self) -> bool {
        matches!(
            self,
            PlayoffOutcome::SemifinalLoss
                | PlayoffOutcome::QuarterfinalLoss
                | PlayoffOutcome::NoPlayoffs
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayoffOutcome::Champion => "champion",
            PlayoffOutcome::RunnerUp => "runner_up",
            PlayoffOutcome::ThirdPlace => "third_place",
            PlayoffOutcome::FourthPlace => "fourth_place",
            PlayoffOutcome::SemifinalLoss => "semifinal_loss",
            PlayoffOutcome::QuarterfinalLoss => "quarterfinal_loss",
            PlayoffOutcome::NoPlayoffs => "no_playoffs",
        }
    }
}

impl fmt::Display for PlayoffOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingEntry {
    pub team_id: TeamId,
    pub rank: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: f64,
    pub points_against: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    /// Wins against each opponent of the tie group head-to-head was computed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_to_head_record: Option<BTreeMap<TeamId, u32>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tiebreak_notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playoff_outcome: Option<PlayoffOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_season_rank: Option<u32>,
}

impl StandingEntry {
    pub fn from_record(record: &TeamRecord) -> Self {
        Self {
            team_id: record.team_id,
            rank: 0,
            wins: record.wins,
            losses: record.losses,
            ties: record.ties,
            points_for: record.points_for,
            points_against: record.points_against,
            division_id: record.division_id,
            display_name: record.display_name.clone(),
            seed: record.seed,
            head_to_head_record: None,
            tiebreak_notes: Vec::new(),
            playoff_outcome: None,
            regular_season_rank: None,
        }
    }

    pub fn record_string(&self) -> String {
        if self.ties > 0 {
            format!("{}-{}-{}", self.wins, self.losses, self.ties)
        } else {
            format!("{}-{}", self.wins, self.losses)
        }
    }
}

/// An ordered ranking plus the policy that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    pub entries: Vec<StandingEntry>,
    pub policy: TieBreakPolicy,
    pub summary: String,
}

impl Standings {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn team_ids(&self) -> Vec<TeamId> {
        self.entries.iter().map(|e| e.team_id).collect()
    }

    pub fn get(&self, team: TeamId) -> Option<&StandingEntry> {
        self.entries.iter().find(|e| e.team_id == team)
    }

    pub fn leader(&self) -> Option<&StandingEntry> {
        self.entries.first()
    }

    /// Append a note to every entry
    pub fn annotate(&mut self, note: &str) {
        for entry in &mut self.entries {
            entry.tiebreak_notes.push(note.to_string());
        }
    }
}
