//! Command-line argument definitions.

use std::path::PathBuf;

use ach_core::{Cracker, Shop};
use clap::{Parser, Subcommand};

/// Achievement unlock tracker.
///
/// Watches the unlock files game crackers write and records newly unlocked
/// achievements against each game's canonical achievement list.
#[derive(Debug, Parser)]
#[command(name = "ach", version, about, long_about = None)]
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
    /// Manage installed games.
    #[command(subcommand)]
    Games(GamesAction),

    /// List unlock files found on disk.
    Locate {
        /// Only this cracker (codex, rune, onlinefix, goldberg).
        #[arg(long)]
        cracker: Option<Cracker>,

        /// Only this game id.
        #[arg(long)]
        game: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Import unlock files for installed games with no stored achievements.
    Import,

    /// Run one merge pass for a game.
    Sync {
        /// Game id.
        game: String,
    },

    /// Show a game's stored achievements.
    Show {
        /// Game id.
        game: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Forget a game's stored achievements.
    Reset {
        /// Game id.
        game: String,
    },

    /// Watch unlock files until interrupted.
    Watch {
        /// Games to watch. Defaults to every installed game.
        #[arg(long = "game")]
        games: Vec<String>,
    },
}

/// Game catalog actions.
#[derive(Debug, Subcommand)]
pub enum GamesAction {
    /// Add or restore an installed game.
    Add {
        /// Storefront id of the game.
        id: String,

        /// Display title.
        #[arg(long)]
        title: String,

        /// Storefront.
        #[arg(long, default_value = "steam")]
        shop: Shop,
    },

    /// Mark a game as deleted.
    Remove {
        /// Storefront id of the game.
        id: String,
    },

    /// List games.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
