//! CLI definitions and command implementations for feenox.

pub mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use feenox::TollGenre;
use std::path::PathBuf;

/// feenox - Sync tolls and invoice documents from the Feenox billing API
#[derive(Parser)]
#[command(name = "feenox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <config dir>/feenox/feenox.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full job: toll groups, daily tolls, invoice tolls, documents
    Sync {
        /// Roll back every step instead of saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Sync toll groups only
    Groups,

    /// Sync tolls of one genre (P = daily, D = invoice)
    Tolls {
        #[arg(short, long)]
        genre: TollGenre,
    },

    /// Sync and download documents of one type
    Documents {
        /// Document type, e.g. FATTURA
        #[arg(short = 't', long = "type")]
        document_type: String,

        /// Document category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Acquire (or refresh) the session token and show its expiry
    Token {
        /// Authenticate even if a usable session is cached
        #[arg(short, long)]
        force: bool,
    },

    /// Search tolls without saving them, printing the number found
    SearchTolls {
        #[arg(short, long)]
        genre: TollGenre,

        /// Exit date window
        #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
        exit: Option<Vec<NaiveDate>>,

        /// Acquisition date window
        #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
        acquisition: Option<Vec<NaiveDate>>,

        /// Invoice date window
        #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
        invoice: Option<Vec<NaiveDate>>,

        /// Restrict to a toll group (repeatable)
        #[arg(long = "group")]
        groups: Vec<String>,
    },
}
