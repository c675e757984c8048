//! Stockroom CLI - inventory dashboard from the terminal

mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use stockroom_core::{Settings, StateDir};
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(about = "Manage products, batches, warehouses and stock movements")]
#[command(version)]
struct Cli {
    /// Set logging level (defaults to the settings file, then "info")
    #[arg(short = 'l', long, global = true)]
    log_level: Option<LogLevel>,

    /// Settings file (TOML or YAML)
    #[arg(short = 'c', long, global = true, env = "STOCKROOM_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the session file and logs
    #[arg(short = 'd', long, global = true, env = "STOCKROOM_STATE_DIR")]
    data_dir: Option<PathBuf>,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let state_dir = cli
        .data_dir
        .clone()
        .map_or_else(StateDir::new, StateDir::with_override);
    state_dir.create_directories()?;

    let settings = match &cli.config {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::load(&state_dir).context("Failed to load settings")?,
    };

    let level = cli.log_level.map_or_else(
        || settings.logging.level.parse().unwrap_or(Level::INFO),
        Level::from,
    );
    logging::init_logging(level, &state_dir, cli.no_file_log, settings.logging.json)?;

    info!("Starting Stockroom CLI");

    match cli.command.execute(&settings, &state_dir).await {
        Ok(()) => {
            info!("Command completed successfully");
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
