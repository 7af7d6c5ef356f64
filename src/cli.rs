// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `forecast-dag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "forecast-dag",
    version,
    about = "Run a forecasting pipeline as a DAG of shell and in-process tasks.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    ///
    /// Default: `Pipeline.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Pipeline.toml")]
    pub config: String,

    /// Set a pipeline variable, e.g. `--var path_workflow=/tmp/wf`.
    ///
    /// Overrides `FORECAST_DAG_VAR_<NAME>` and the file's `[vars]` table.
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FORECAST_DAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse, validate and resolve variables, print the DAG, but don't
    /// execute any task.
    #[arg(long)]
    pub dry_run: bool,

    /// Also write the run report as JSON to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
