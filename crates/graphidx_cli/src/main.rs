//! graphidx CLI
//!
//! Command-line tools for inspecting a persisted index-configuration log.
//!
//! # Commands
//!
//! - `list` - Show the indexes recorded in the log
//! - `verify` - Check every record's framing and checksum
//! - `dump` - Print raw records with their offsets for debugging

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use graphidx_core::EntityKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// graphidx command-line index log tools.
#[derive(Parser)]
#[command(name = "graphidx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the index configuration log
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the indexes recorded in the log
    List {
        /// Only show indexes of this kind
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify the log's record framing and checksums
    Verify,

    /// Dump raw log records for debugging
    Dump {
        /// Maximum number of records to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Node,
    Relationship,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Node => EntityKind::Node,
            KindArg::Relationship => EntityKind::Relationship,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::List { kind, format } => {
            let path = cli.path.ok_or("Index log path required for list")?;
            commands::list::run(&path, kind.map(EntityKind::from), &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Index log path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Dump { limit, format } => {
            let path = cli.path.ok_or("Index log path required for dump")?;
            commands::dump::run(&path, limit, &format)?;
        }
        Commands::Version => {
            println!("graphidx CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("graphidx Core v{}", graphidx_core::VERSION);
        }
    }

    Ok(())
}
