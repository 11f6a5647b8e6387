pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scoreline")]
#[command(about = "Track solve progress across problem rosters", long_about = None)]
pub struct Cli {
    /// Roster file to track (overrides the configured path)
    #[arg(long, global = true)]
    pub roster: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show per-group and global tallies
    Status {
        /// Classify from cache only; skip remote lookups
        #[arg(long)]
        no_fetch: bool,
    },
    /// Force-refresh one item's cached submission lookup
    Refresh {
        /// Problem id, as it appears in the lookup URL
        id: String,
    },
    /// Manage the solved-before cutoff
    Threshold {
        #[command(subcommand)]
        action: ThresholdAction,
    },
    /// Manage group exclusion from the global tally
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },
    /// Reload the roster periodically and reprint tallies on changes
    Watch {
        /// Poll interval (e.g. "30s", "5m")
        #[arg(short, long, default_value = "30s")]
        interval: String,
    },
}

#[derive(Subcommand)]
pub enum ThresholdAction {
    /// Hide items last solved before this date
    Set {
        /// Cutoff date, yyyy-mm-dd
        date: String,
    },
    /// Remove the cutoff
    Clear,
    /// Print the active cutoff
    Show,
}

#[derive(Subcommand)]
pub enum GroupAction {
    /// Drop a group from the global tally
    Exclude { name: String },
    /// Restore a group to the global tally
    Include { name: String },
    /// List groups with their exclusion state
    List,
}
