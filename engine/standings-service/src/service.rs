//! Standings request orchestration

use std::fmt;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use standings_core::{
    compose, policy, rank, reconstruct, AuthoritativeBracket, BracketError, BracketFormat,
    BracketOrigin, BracketSource, DivisionRecords, Game, HeadToHeadMatrix, InferredBracket, PlayoffBracket, PolicyInputs,
    PolicySource, RankingContext, Schedule, Seeding, StandingEntry, Standings, TeamId,
    TieBreakPolicy, TieBreaker, Week, WeekRange,
};
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::league_settings::LeagueSettingsStore;
use crate::source::{LeagueDataSource, LeagueInfo};

pub const DEGRADED_NOTE: &str = "playoff bracket validation failed, using regular season standings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StandingsMode {
    RegularSeason,
    Final,
}

impl fmt::Display for StandingsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StandingsMode::RegularSeason => f.write_str("regular_season"),
            StandingsMode::Final => f.write_str("final"),
        }
    }
}

/// Whether final standings were produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FinalStatus {
    NotRequested,
    Complete,
    Degraded { reason: String },
}

/// Response of one standings request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsReport {
    pub league_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league_name: Option<String>,
    pub mode: StandingsMode,
    pub policy: TieBreakPolicy,
    pub policy_source: PolicySource,
    pub standings: Vec<StandingEntry>,
    pub summary: String,
    pub final_status: FinalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket: Option<PlayoffBracket>,
    pub generated_at: DateTime<Utc>,
}

/// Computes standings for leagues served by one data source
pub struct StandingsService<S> {
    source: S,
    config: ServiceConfig,
    settings: LeagueSettingsStore,
}

impl<S: LeagueDataSource> StandingsService<S> {
    pub fn new(source: S, config: ServiceConfig, settings: LeagueSettingsStore) -> Self {
        Self { source, config, settings }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Compute standings under the configured request timeout
    pub async fn compute_standings(
        &self,
        league_id: &str,
        inputs: &PolicyInputs,
        mode: StandingsMode,
    ) -> Result<StandingsReport> {
        let timeout = self.config.request_timeout();
        tokio::time::timeout(timeout, self.compute(league_id, inputs, mode))
            .await
            .map_err(|_| {
                warn!(league_id, ?timeout, "Standings request timed out");
                ServiceError::Timeout(timeout)
            })?
    }

    pub async fn compute_final_standings(
        &self,
        league_id: &str,
        inputs: &PolicyInputs,
    ) -> Result<StandingsReport> {
        self.compute_standings(league_id, inputs, StandingsMode::Final).await
    }

    async fn compute(
        &self,
        league_id: &str,
        inputs: &PolicyInputs,
        mode: StandingsMode,
    ) -> Result<StandingsReport> {
        info!(league_id, %mode, "Computing standings");

        let league = match self.source.league_info(league_id).await {
            Ok(league) => Some(league),
            Err(e) => {
                warn!(league_id, error = %e, "League metadata unavailable, using configured defaults");
                None
            }
        };
        let records = self.source.team_records(league_id).await?;
        if records.is_empty() {
            return Err(ServiceError::NoTeams { league_id: league_id.to_string() });
        }

        let resolved = policy::resolve(
            inputs,
            Some(self.settings.stored_policy(league_id)),
            league.as_ref().and_then(|l| l.playoff_seed_type),
        );
        info!(policy = %resolved.policy, source = ?resolved.source, "Resolved tie-break policy");

        let playoff_start = league.as_ref().and_then(|l| l.playoff_week_start);
        let regular_season = self.regular_season_weeks(playoff_start);
        let playoff_window = self.config.season.playoff_window(playoff_start);

        let schedule = match (mode, resolved.policy.needs_games()) {
            (StandingsMode::Final, _) => {
                self.fetch_schedule(league_id, WeekRange::new(1, playoff_window.end)).await
            }
            (StandingsMode::RegularSeason, true) => {
                self.fetch_schedule(league_id, regular_season).await
            }
            (StandingsMode::RegularSeason, false) => Schedule::new(),
        };

        let matrix = HeadToHeadMatrix::build(&schedule, regular_season);
        let mut context = RankingContext::new();
        if resolved.policy.contains(TieBreaker::Custom) {
            if inputs.custom_metrics.is_empty() {
                warn!(league_id, "Custom tie-break requested without metrics, every team scores 0");
            }
            context = context.with_custom_metrics(inputs.custom_metrics.clone());
        }
        if resolved.policy.contains(TieBreaker::DivisionRecord) {
            context = context.with_division_records(DivisionRecords::build(&schedule, regular_season, &records));
        }
        if resolved.policy.contains(TieBreaker::Random) {
            let teams: Vec<TeamId> = records.iter().map(|r| r.team_id).collect();
            context.assign_random_keys(&teams, &mut rand::thread_rng());
        }

        let regular = rank(&records, &resolved.policy, &matrix, &context)?;

        let (standings, final_status, bracket) = match mode {
            StandingsMode::RegularSeason => (regular, FinalStatus::NotRequested, None),
            StandingsMode::Final => {
                self.final_standings(league_id, league.as_ref(), regular, &schedule, playoff_window)
                    .await
            }
        };

        Ok(StandingsReport {
            league_id: league_id.to_string(),
            league_name: league.map(|l| l.name).filter(|n| !n.is_empty()),
            mode,
            policy: resolved.policy,
            policy_source: resolved.source,
            summary: standings.summary.clone(),
            standings: standings.entries,
            final_status,
            bracket,
            generated_at: Utc::now(),
        })
    }

    /// Regular season ends the week before the league's playoffs when it reports a start
    fn regular_season_weeks(&self, playoff_start: Option<u32>) -> WeekRange {
        match playoff_start {
            Some(start) if start > 1 => WeekRange::new(1, start - 1),
            _ => self.config.season.regular_season(),
        }
    }

    async fn final_standings(
        &self,
        league_id: &str,
        league: Option<&LeagueInfo>,
        regular: Standings,
        schedule: &Schedule,
        playoff_window: WeekRange,
    ) -> (Standings, FinalStatus, Option<PlayoffBracket>) {
        let playoff_teams = league
            .and_then(|l| l.playoff_teams)
            .unwrap_or(self.config.season.default_playoff_teams);
        let seeding = Seeding::from_standings(&regular, playoff_teams);

        let raw = match self.source.bracket(league_id).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(league_id, error = %e, "Bracket unavailable, inferring from schedule");
                Vec::new()
            }
        };
        let authoritative = AuthoritativeBracket::new(raw);
        let inferred = InferredBracket::new(schedule, playoff_window);
        let sources: [&dyn BracketSource; 2] = [&authoritative, &inferred];

        let expects_two_week = league.map(|l| l.two_week_championship);
        let result = reconstruct(&sources, &seeding)
            .and_then(|bracket| check_format(&bracket, expects_two_week).map(|_| bracket));

        match result {
            Ok(bracket) => {
                let standings = compose(&regular, &bracket);
                (standings, FinalStatus::Complete, Some(bracket))
            }
            Err(e) => {
                warn!(league_id, error = %e, "Final standings unavailable");
                let mut standings = regular;
                standings.annotate(DEGRADED_NOTE);
                standings.summary = format!("{} ({DEGRADED_NOTE})", standings.summary);
                (standings, FinalStatus::Degraded { reason: e.to_string() }, None)
            }
        }
    }

    /// Fetch every week in `weeks` concurrently. Weeks that keep failing are left out.
    async fn fetch_schedule(&self, league_id: &str, weeks: WeekRange) -> Schedule {
        let results: Vec<(Week, Result<Vec<Game>>)> = stream::iter(weeks.weeks())
            .map(|week| async move { (week, self.fetch_week(league_id, week).await) })
            .buffer_unordered(self.config.fetch.concurrency.max(1))
            .collect()
            .await;

        let mut schedule = Schedule::new();
        for (week, result) in results {
            match result {
                Ok(games) => schedule.insert_week(week, games),
                Err(e) => warn!(league_id, week, error = %e, "Skipping week after failed fetch"),
            }
        }
        debug!(league_id, %weeks, fetched = schedule.len(), "Fetched schedule");
        schedule
    }

    async fn fetch_week(&self, league_id: &str, week: Week) -> Result<Vec<Game>> {
        let retry = &self.config.fetch.retry;
        let mut attempt = 0;
        loop {
            match self.source.games(league_id, week).await {
                Ok(games) => return Ok(games),
                Err(e) if e.is_transient() && attempt < retry.max_retries => {
                    let delay = retry.delay_for(attempt);
                    debug!(league_id, week, attempt, ?delay, error = %e, "Retrying week fetch");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// An inferred bracket must have the championship format the league is configured for
fn check_format(
    bracket: &PlayoffBracket,
    expects_two_week: Option<bool>,
) -> std::result::Result<(), BracketError> {
    let Some(two_week) = expects_two_week else {
        return Ok(());
    };
    let expected = if two_week { BracketFormat::TwoWeekAggregate } else { BracketFormat::SingleGameFinal };
    if bracket.origin == BracketOrigin::Inferred && bracket.format != expected {
        return Err(BracketError::FormatMismatch { expected, found: bracket.format });
    }
    Ok(())
}
