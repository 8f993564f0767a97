//! feenox CLI - Sync tolls and invoice documents from the Feenox billing API
//!
//! Usage:
//!   feenox sync        - Run the full job (groups -> tolls -> documents)
//!   feenox groups      - Sync toll groups
//!   feenox tolls       - Sync tolls of one genre
//!   feenox documents   - Sync documents of one type
//!   feenox token       - Acquire the session token

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use feenox::config::default_config_path;
use feenox::Config;
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = match Config::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config, cli.verbose) {
        eprintln!("Error: {:?}", e);
        return ExitCode::FAILURE;
    }

    match run(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("run aborted: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Sync { dry_run } => cli::commands::sync(config, dry_run),
        Commands::Groups => cli::commands::groups(config),
        Commands::Tolls { genre } => cli::commands::tolls(config, genre),
        Commands::Documents {
            document_type,
            category,
        } => cli::commands::documents(config, &document_type, category.as_deref()),
        Commands::Token { force } => cli::commands::token(config, force),
        Commands::SearchTolls {
            genre,
            exit,
            acquisition,
            invoice,
            groups,
        } => cli::commands::search_tolls(config, genre, exit, acquisition, invoice, &groups),
    }
}

/// Log to `<log_dir>/feenox.log` when configured, otherwise to stderr.
fn init_logging(config: &Config, verbose: bool) -> Result<()> {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("feenox={}", log_level)));

    match config.log_file() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Cannot create log directory: {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Cannot open log file: {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}
