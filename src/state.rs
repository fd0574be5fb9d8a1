//! Playback and button states
//!
//! `PlaybackState` is the controller's state machine:
//! Idle → Playing ⇄ Paused → Idle (stop / end of stream / error)
//!
//! `PlayVisual` is what a file's play button shows. It has extra transient
//! states (external hand-off, error) that revert to `Idle` on a timer.

use std::fmt;

/// Playback controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No session exists
    #[default]
    Idle,
    /// A session exists and is producing audio
    Playing,
    /// A session exists but its sink is paused
    Paused,
}

impl PlaybackState {
    pub fn is_idle(&self) -> bool {
        matches!(self, PlaybackState::Idle)
    }

    /// True when a session (and its decoded source) is alive
    pub fn has_session(&self) -> bool {
        !self.is_idle()
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}

/// Visual state of a single file's play button
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayVisual {
    /// ▶ ready to play
    Idle,
    /// ⏸ playing in-process
    Playing,
    /// ▶ paused mid-stream
    Paused,
    /// Handed off to the external player
    Launched,
    /// ✕ playback failed, with the message shown as tooltip
    Error(String),
}

impl PlayVisual {
    /// Glyph shown on the button
    pub fn glyph(&self) -> &'static str {
        match self {
            PlayVisual::Idle | PlayVisual::Paused => "▶",
            PlayVisual::Playing => "⏸",
            PlayVisual::Launched => "▶",
            PlayVisual::Error(_) => "✕",
        }
    }

    /// Tooltip text for the button
    pub fn tooltip(&self) -> String {
        match self {
            PlayVisual::Launched => "Playing in external player".to_string(),
            PlayVisual::Error(msg) => format!("Playback error: {}", msg),
            _ => "Play audio".to_string(),
        }
    }
}

impl From<PlaybackState> for PlayVisual {
    fn from(state: PlaybackState) -> Self {
        match state {
            PlaybackState::Idle => PlayVisual::Idle,
            PlaybackState::Playing => PlayVisual::Playing,
            PlaybackState::Paused => PlayVisual::Paused,
        }
    }
}
