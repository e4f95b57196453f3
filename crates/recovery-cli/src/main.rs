//! Recovery CLI
//!
//! Reads a scenario file (JSON, or YAML by extension) and prints:
//! - `summarize`: signal summary and clusters
//! - `plan`: the synthesized plan
//! - `validate`: policy violations; exits with 2 when the plan is disallowed
//! - `simulate`: the simulated run
//! - `run`: all of the above with lifecycle tracking

use anyhow::Result;
use clap::{Parser, Subcommand};
use recovery_engine::{EngineConfig, RecoveryEngine};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;
mod scenario;

use output::OutputFormat;

/// Recovery planner CLI
#[derive(Parser)]
#[command(name = "recovery")]
#[command(about = "Synthesize, validate and simulate recovery plans", long_about = None)]
#[command(version)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(short, long, env = "RECOVERY_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    output: OutputFormat,

    /// Shorthand for `--output json`
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize and cluster the scenario's signals
    Summarize {
        /// Scenario file
        scenario: PathBuf,
    },

    /// Synthesize a plan
    Plan {
        /// Scenario file
        scenario: PathBuf,
    },

    /// Synthesize and validate a plan
    Validate {
        /// Scenario file
        scenario: PathBuf,
    },

    /// Synthesize and simulate a plan
    Simulate {
        /// Scenario file
        scenario: PathBuf,
    },

    /// Summarize, synthesize, simulate and validate
    Run {
        /// Scenario file
        scenario: PathBuf,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().without_time().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = EngineConfig::load(cli.config.as_deref())?;
    let engine = RecoveryEngine::new(config)?;
    let format = if cli.json { OutputFormat::Json } else { cli.output };

    match &cli.command {
        Commands::Summarize { scenario } => commands::summarize(&engine, scenario, format),
        Commands::Plan { scenario } => commands::plan(&engine, scenario, format),
        Commands::Validate { scenario } => commands::validate(&engine, scenario, format),
        Commands::Simulate { scenario } => commands::simulate(&engine, scenario, format),
        Commands::Run { scenario } => commands::run(&engine, scenario, format),
    }
}
