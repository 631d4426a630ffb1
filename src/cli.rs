// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `runflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runflow",
    version,
    about = "Run a workflow of dependent tasks, in parallel where the DAG allows.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run, together with everything they depend on.
    ///
    /// Runs the whole workflow when omitted.
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,

    /// Path to the workflow file (TOML).
    #[arg(long, short = 'c', value_name = "PATH", default_value = "Runflow.toml")]
    pub config: String,

    /// Maximum number of tasks running at once; overrides
    /// `[config].max_parallel`.
    #[arg(long, short = 'j', value_name = "N")]
    pub max_parallel: Option<usize>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate and list the tasks in order, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
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
