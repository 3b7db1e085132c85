//! # exhibit CLI entry point
//!
//! Parses arguments, installs the tracing subscriber and dispatches to
//! [`exhibit_cli::commands::run`].

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use exhibit_cli::commands::{run, Command};
use exhibit_cli::{Workspace, DEFAULT_STATE_DIR};
use exhibit_service::ServiceConfig;

/// Evidence integrity and chain-of-custody toolkit.
///
/// Fingerprints, signs and timestamps evidence files, re-verifies them,
/// runs tamper checks and records custody transfers.
#[derive(Parser, Debug)]
#[command(name = "exhibit", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    /// State directory holding evidence records and the timestamp key.
    #[arg(long, global = true, default_value = DEFAULT_STATE_DIR)]
    state_dir: PathBuf,

    /// Timeout for one timestamp-authority request, overriding
    /// `EXHIBIT_TSA_TIMEOUT_MS`.
    #[arg(long, global = true)]
    tsa_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn config(cli: &Cli) -> Result<ServiceConfig> {
    let mut config = ServiceConfig::from_env().context("invalid environment configuration")?;
    if let Some(ms) = cli.tsa_timeout_ms {
        anyhow::ensure!(ms > 0, "--tsa-timeout-ms must be positive");
        config.timestamp_timeout = Duration::from_millis(ms);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);
    tracing::debug!(state_dir = %cli.state_dir.display(), "exhibit CLI starting");

    let result = match config(&cli) {
        Ok(config) => run(cli.command, &Workspace::new(cli.state_dir, config)).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
