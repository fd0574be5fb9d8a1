//! Error types for audio-overlay
//!
//! Uses thiserror for ergonomic error definitions. Every failure in the
//! playback and hotkey paths is recovered locally by the daemon; these types
//! carry enough detail to show the user what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the audio-overlay application
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Hotkey error: {0}")]
    Hotkey(#[from] HotkeyError),

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while opening or driving a playback session
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Cannot decode '{path}': {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Audio output unavailable: {0}")]
    Device(String),

    #[error("Cannot launch external player for '{path}': {reason}")]
    Launch { path: PathBuf, reason: String },
}

/// Coarse classification used to pick the error flash shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackErrorKind {
    Decode,
    Device,
    Launch,
}

impl PlaybackError {
    pub fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PlaybackError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> PlaybackErrorKind {
        match self {
            PlaybackError::Decode { .. } => PlaybackErrorKind::Decode,
            PlaybackError::Device(_) => PlaybackErrorKind::Device,
            PlaybackError::Launch { .. } => PlaybackErrorKind::Launch,
        }
    }
}

/// Errors related to global hotkey registration
#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("Hotkey {0} is already in use")]
    RegistrationConflict(String),

    #[error("Previous hotkey {0} could not be restored; no global hotkey is active")]
    RegistrationLost(String),

    #[error("Hotkey registration service unavailable: {0}")]
    Manager(String),

    #[error("Unknown key name: '{0}'")]
    UnknownKey(String),

    #[error("Invalid hotkey binding: {0}")]
    InvalidBinding(String),
}

/// Errors related to copying a file reference to the clipboard
#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("{0} not found in PATH. Install it via your package manager.")]
    ToolNotFound(&'static str),

    #[error("Clipboard copy failed: {0}")]
    CopyFailed(String),

    #[error("All clipboard methods failed. Ensure wl-copy or xclip is available.")]
    AllMethodsFailed,
}

/// Result type alias using OverlayError
pub type Result<T> = std::result::Result<T, OverlayError>;

impl From<global_hotkey::Error> for HotkeyError {
    fn from(e: global_hotkey::Error) -> Self {
        HotkeyError::Manager(e.to_string())
    }
}
