// Command-line interface definitions for audio-overlay
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "audio-overlay")]
#[command(author, version, about = "Hotkey-toggled overlay for auditioning audio clips")]
#[command(long_about = "
Audio Overlay lists the audio files of one folder and lets you play,
pause, and copy them. A global hotkey (Ctrl+Shift+Q by default) shows and
hides the overlay from anywhere.

USAGE:
  audio-overlay --folder ~/Sounds     (start the overlay on a folder)
  Then type commands such as: play 2, copy horn, search beep, rebind, quit

Formats without an in-process decoder (opus by default) open in the
desktop's default player.
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Audio folder to list (overrides config)
    #[arg(short, long, value_name = "DIR")]
    pub folder: Option<std::path::PathBuf>,

    /// Playback volume, 1.0 = unchanged (overrides config)
    #[arg(long, value_name = "LEVEL")]
    pub volume: Option<f32>,

    /// Don't register the global hotkey
    #[arg(long)]
    pub no_hotkey: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the overlay (default if no command specified)
    Run,

    /// List audio files in the folder
    List {
        /// Only show files whose name contains this text (case-insensitive)
        #[arg(long, value_name = "TEXT")]
        filter: Option<String>,
    },

    /// Play one file and exit when it finishes
    Play {
        /// Path to audio file
        file: std::path::PathBuf,
    },

    /// Show the persisted global hotkey, or store a new one
    Hotkey {
        /// New binding, e.g. "Ctrl+Alt+K"
        #[arg(long, value_name = "BINDING")]
        set: Option<String>,
    },

    /// Show current configuration
    Config,
}
