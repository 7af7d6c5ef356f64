// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! The filter is chosen as follows:
//! 1. `--log-level` CLI flag, applied to every target
//! 2. `FORECAST_DAG_LOG`, parsed as an `EnvFilter` directive string
//!    (e.g. `"debug"` or `"forecast_dag::dag=trace,info"`)
//! 3. `info`
//!
//! Logs go to stderr. Stdout carries only the run report.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "FORECAST_DAG_LOG";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(directive_for(lvl)),
        None => match std::env::var(LOG_ENV_VAR) {
            Ok(spec) if !spec.trim().is_empty() => EnvFilter::try_new(spec.trim())
                .with_context(|| format!("invalid {LOG_ENV_VAR} filter '{spec}'"))?,
            _ => EnvFilter::new("info"),
        },
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

fn directive_for(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
