//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `pmoaltplaylist` binary.
//!
//! ## Examples
//!
//! ```bash
//! pmoaltplaylist queue
//! pmoaltplaylist generate --multiplier 3 --extend 1
//! pmoaltplaylist generate --playlist 37i9dQZF1DXcBWIGoYBM5M --enqueue
//! pmoaltplaylist cache --clear
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "pmoaltplaylist")]
#[command(about = "Generate alternative playlists from your playback queue")]
#[command(version)]
pub struct Args {
    /// Configuration directory
    ///
    /// Defaults to $PMOALT_CONFIG, then `./.pmoalt`, then `~/.pmoalt`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the currently playing track and the player queue
    Queue,

    /// Build an alternative playlist
    ///
    /// Seeds are the currently playing track followed by the queue, or the
    /// tracks of a playlist when `--playlist` is given.
    Generate {
        /// Length multiplier (1-5): suggestions requested per seed
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=5))]
        multiplier: u8,

        /// Use the tracks of this playlist as seeds instead of the queue
        #[arg(long)]
        playlist: Option<String>,

        /// Extend the result this many times, each round seeded with the previous one
        #[arg(long, default_value_t = 0)]
        extend: u32,

        /// Append the generated tracks to the player queue
        #[arg(long)]
        enqueue: bool,
    },

    /// Show validated-ID cache statistics
    Cache {
        /// Drop every cached resolution
        #[arg(long)]
        clear: bool,
    },
}
