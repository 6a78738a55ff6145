//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::EntityId;

pub mod commands;

/// Change tracker for analysis databases
#[derive(Parser, Debug)]
#[command(name = "ct", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Name of the cache directory next to the database [env: CT_CACHE_DIR_NAME]
    #[arg(long, global = true)]
    pub cache_dir_name: Option<String>,

    /// Annotation database (default: <database dir>/annotations.db) [env: CT_ANNOTATIONS_DB]
    #[arg(long, global = true)]
    pub annotations_db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a notification log against a database snapshot and save
    Replay {
        /// Database snapshot (JSON)
        snapshot: PathBuf,

        /// Notification log (one JSON notification per line)
        events: PathBuf,

        /// Keep pending changes after the save instead of flushing them
        #[arg(long)]
        no_flush: bool,
    },

    /// Show the cache next to a database snapshot
    Status {
        /// Database snapshot (JSON)
        snapshot: PathBuf,
    },

    /// Show annotations
    Annotations {
        /// Database snapshot (JSON)
        snapshot: PathBuf,

        /// Entity id (0x-hex or decimal); omit to list pending annotations
        entity: Option<EntityId>,

        /// Maximum number of annotations to show
        #[arg(short, long)]
        limit: Option<u32>,

        /// Mark pending annotations as committed after listing them
        #[arg(long, conflicts_with = "entity")]
        mark_committed: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
