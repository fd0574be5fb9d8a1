//! Audio Overlay: hotkey-toggled audition board for a folder of clips
//!
//! This library provides the core functionality for:
//! - Listing and filtering the audio files of one folder
//! - Playing a clip in-process via rodio (one session at a time), or handing
//!   formats it cannot decode to the desktop's default player
//! - Registering a global hotkey via global-hotkey, rebinding it at runtime,
//!   and persisting the choice
//! - Copying a clip to the clipboard as a file reference
//!
//! # Architecture
//!
//! ```text
//!                            ┌─────────────────────────────────────┐
//!                            │               Daemon                │
//!                            │   (single owner, tokio::select!)    │
//!                            └─────────────────────────────────────┘
//!                                  ▲          ▲           ▲      ▲
//!                   stdin commands │          │ hotkey id │      │ flash timers
//!                                  │          │           │      │
//!          ┌──────────────┐        │  ┌──────────────┐    │  ┌──────────────┐
//!          │   Command    │────────┘  │    Hotkey    │────┘  │    tokio     │
//!          │   parser     │           │(global-hotkey│       │    sleep     │
//!          └──────────────┘           └──────────────┘       └──────────────┘
//!                                                 ▲
//!                             end of stream       │ SessionId
//!                                                 │
//!          ┌──────────────┐         ┌──────────────┐         ┌──────────────┐
//!          │   Library    │         │   Playback   │────────▶│ rodio Sink / │
//!          │ (folder scan)│         │  Controller  │         │ open::that   │
//!          └──────────────┘         └──────────────┘         └──────────────┘
//!                   │                        │
//!                   ▼                        ▼
//!          ┌─────────────────────────────────────────────────────────────────┐
//!          │                      OverlayView (console)                      │
//!          └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod clipboard;
pub mod command;
pub mod config;
pub mod daemon;
pub mod error;
pub mod hotkey;
pub mod library;
pub mod playback;
pub mod state;
pub mod view;
pub mod visibility;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{OverlayError, Result};
pub use hotkey::HotkeyBinding;
pub use library::AudioFileRef;
