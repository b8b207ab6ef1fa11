//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ttcsync - TTC subway closures in your calendar
#[derive(Debug, Parser)]
#[command(name = "ttcsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "TTCSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log as JSON lines (for cron and CI)
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Log the events that would be inserted instead of inserting them
    #[arg(long, short = 'n', global = true)]
    pub dry_run: bool,

    /// Use the bundled advisory snapshot and an in-memory calendar
    #[arg(long, global = true)]
    pub offline: bool,

    /// Destination calendar (overrides the configuration)
    #[arg(long, env = "TTCSYNC_CALENDAR_ID", global = true)]
    pub calendar_id: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch advisories and insert the missing events (default)
    Sync,

    /// Fetch advisories and print the extracted events as JSON
    Advisories,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
