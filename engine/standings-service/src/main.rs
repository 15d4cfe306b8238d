//! League Standings CLI
//!
//! Computes regular season or final standings for a Sleeper league and prints the report
//! as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sleeper_client::SleeperClient;
use standings_core::{PolicyInputs, TeamId};
use tracing::info;

use standings_service::{
    initialize_logging, load_configuration, LeagueSettingsStore, StandingsMode, StandingsService,
};

#[derive(Parser)]
#[command(name = "league-standings")]
#[command(about = "Fantasy league standings with configurable tie-breakers")]
struct Cli {
    /// Sleeper league id
    #[arg(short, long)]
    league_id: String,

    /// Regular season or final (playoff-aware) standings
    #[arg(short, long, value_enum, default_value = "regular-season")]
    mode: StandingsMode,

    /// Tie-breaker in priority order; repeat for more criteria
    #[arg(short, long = "tiebreak")]
    tiebreaks: Vec<String>,

    /// Free-text tie-break instructions
    #[arg(short, long)]
    instructions: Option<String>,

    /// Value for the custom tie-breaker as TEAM=VALUE; repeat per team
    #[arg(long = "custom", value_parser = parse_custom_metric)]
    custom_metrics: Vec<(TeamId, f64)>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// League settings file, overriding the configured path
    #[arg(short, long)]
    settings: Option<PathBuf>,
}

fn parse_custom_metric(raw: &str) -> std::result::Result<(TeamId, f64), String> {
    let (team, value) = raw.split_once('=').ok_or_else(|| format!("expected TEAM=VALUE, got {raw:?}"))?;
    let team: TeamId = team.trim().parse().map_err(|e| format!("invalid team id {team:?}: {e}"))?;
    let value: f64 = value.trim().parse().map_err(|e| format!("invalid value {value:?}: {e}"))?;
    if !value.is_finite() {
        return Err(format!("value for team {team} must be finite"));
    }
    Ok((team, value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_configuration(cli.config.as_deref())?;
    if let Some(settings) = cli.settings {
        config.settings_file = settings;
    }
    initialize_logging(&config.logging)?;

    info!("Starting League Standings v{}", env!("CARGO_PKG_VERSION"));

    let settings = LeagueSettingsStore::load(&config.settings_file)
        .context("Failed to load league settings")?;
    let client = SleeperClient::new(config.sleeper.clone()).context("Failed to build Sleeper client")?;
    let service = StandingsService::new(client, config, settings);

    let inputs = PolicyInputs {
        tiebreak_order: cli.tiebreaks,
        instructions: cli.instructions,
        custom_metrics: cli.custom_metrics.into_iter().collect(),
    };
    let report = service
        .compute_standings(&cli.league_id, &inputs, cli.mode)
        .await
        .with_context(|| format!("Failed to compute standings for league {}", cli.league_id))?;

    info!(teams = report.standings.len(), status = ?report.final_status, "Standings computed");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
