//! Command-line argument definitions.

use std::path::PathBuf;

use att_core::ScanAction;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::import::ImportArgs;

/// Conference attendance tracker.
///
/// Records badge scans at zone checkpoints and reports how long each
/// registrant actually stayed, net of breaks and outside session hours.
#[derive(Debug, Parser)]
#[command(name = "att", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import access logs from stdin (JSONL).
    Import(ImportArgs),

    /// Add a registrant or rename an existing one.
    Register {
        /// Badge (QR) identifier.
        #[arg(long)]
        badge: String,

        /// Display name.
        #[arg(long)]
        name: String,
    },

    /// Record a kiosk scan and update the running total.
    Scan {
        /// Badge (QR) identifier.
        #[arg(long)]
        badge: String,

        /// Zone the kiosk guards.
        #[arg(long)]
        zone: String,

        /// Whether the badge is entering or leaving.
        #[arg(long, value_enum)]
        action: ActionArg,

        /// Scan time (ISO 8601 or relative, e.g. '5 minutes ago'). Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Show per-registrant attendance and completion.
    Report {
        /// Only show this venue day (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export per-zone statistics as CSV to stdout.
    Export,

    /// Show schedule summary and recent scan activity.
    Status,

    /// Inspect the zone schedule.
    #[command(subcommand)]
    Zones(ZonesAction),
}

/// Zone schedule subcommands.
#[derive(Debug, Subcommand)]
pub enum ZonesAction {
    /// List scheduled days, zones and breaks.
    List,

    /// Report configuration problems such as overlapping breaks.
    Check,
}

/// Scan direction as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    Entry,
    Exit,
}

impl From<ActionArg> for ScanAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Entry => Self::Entry,
            ActionArg::Exit => Self::Exit,
        }
    }
}
