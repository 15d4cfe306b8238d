//! # Sleeper Client
//!
//! Fetches league metadata, rosters, weekly matchups and the winners bracket from the
//! Sleeper fantasy platform and converts them into standings engine inputs.

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::SleeperClient;
pub use config::SleeperConfig;
pub use error::{Result, SleeperError};
pub use models::{LeagueSettings, SleeperLeague};
