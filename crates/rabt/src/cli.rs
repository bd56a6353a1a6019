//! Command-line interface for rabt.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rabt_core::Tier;

/// Rabt - Arabic word-grouping puzzle with LLM-generated levels
#[derive(Parser, Debug)]
#[command(name = "rabt")]
#[command(about = "Arabic word-grouping puzzle with LLM-generated levels", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file (optional)
    #[arg(short, long, global = true, default_value = "rabt.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play in the terminal
    Play {
        /// Tier to start at (starts in the lobby when omitted)
        #[arg(long)]
        tier: Option<Tier>,

        /// Level index within the tier
        #[arg(long, default_value = "1")]
        index: u8,

        /// Serve levels from this directory instead of the LLM
        #[arg(long)]
        levels_dir: Option<PathBuf>,

        /// Seed for the hint RNG (deterministic sessions)
        #[arg(long)]
        seed: Option<u64>,

        /// Keep no profile between runs
        #[arg(long)]
        guest: bool,
    },

    /// Generate level files for offline play
    Generate {
        /// Output directory
        #[arg(short, long, default_value = "levels")]
        out: PathBuf,

        /// Only generate this tier (all tiers when omitted)
        #[arg(long)]
        tier: Option<Tier>,

        /// Only generate this index (all indices when omitted)
        #[arg(long)]
        index: Option<u8>,
    },

    /// List the campaign levels
    Levels,
}
