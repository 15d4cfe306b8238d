//! Logging and tracing setup

use tracing_subscriber::{fmt, layer::SubscriberExt, prelude::*, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Result, ServiceError};

/// Initialize logging from configuration. `RUST_LOG` takes precedence over the configured level.
///
/// Logs go to stderr so standings output on stdout stays machine readable.
pub fn initialize_logging(config: &LoggingConfig) -> Result<()> {
    initialize_logging_with_config(&config.level, &config.format)
}

/// Initialize logging with an explicit level and format (json, pretty, compact)
pub fn initialize_logging_with_config(level: &str, format: &str) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| ServiceError::InvalidConfig {
            message: format!("invalid log level {level:?}: {e}"),
        })?,
    };

    let fmt_layer = match format {
        "json" => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        "pretty" => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(true)
            .boxed(),
        "compact" => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
            .boxed(),
        other => {
            return Err(ServiceError::InvalidConfig {
                message: format!("unknown log format {other:?}, expected json, pretty or compact"),
            })
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ServiceError::InvalidConfig { message: format!("logging already initialized: {e}") })
}
