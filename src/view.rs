//! Presentation seam
//!
//! The daemon never draws anything itself; it tells an [`OverlayView`] what
//! changed. `ConsoleView` renders those changes as lines on stdout, which is
//! what the `run` command uses.

use crate::hotkey::HotkeyBinding;
use crate::library::{AudioFileRef, Listing};
use crate::state::PlayVisual;
use crate::visibility::VisibilityChange;
use std::fmt;

/// What the hotkey button shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyDisplay {
    /// Normal state: the binding in effect
    Binding(HotkeyBinding),
    /// Capture in progress
    Capturing,
    /// New binding registered (highlighted)
    Saved(HotkeyBinding),
    /// Captured key had no modifier
    Rejected,
    /// Candidate already claimed elsewhere
    Conflict,
    /// Neither candidate nor previous binding could be registered
    Lost,
}

impl fmt::Display for HotkeyDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotkeyDisplay::Binding(binding) | HotkeyDisplay::Saved(binding) => {
                write!(f, "{}", binding)
            }
            HotkeyDisplay::Capturing => f.write_str("Press key combination..."),
            HotkeyDisplay::Rejected => f.write_str("Must include Ctrl, Alt, or Shift"),
            HotkeyDisplay::Conflict => f.write_str("Hotkey already in use"),
            HotkeyDisplay::Lost => f.write_str("Hotkey unavailable, choose another"),
        }
    }
}

/// Everything the daemon can ask the overlay window to show
pub trait OverlayView {
    /// Replace the file list. `files` is `listing` after the search filter.
    fn show_files(&mut self, listing: &Listing, files: &[AudioFileRef]);

    fn show_play_state(&mut self, file: &AudioFileRef, visual: &PlayVisual);

    /// Highlight (or un-highlight) a row after a clipboard copy
    fn show_copied(&mut self, file: &AudioFileRef, highlighted: bool);

    fn show_hotkey(&mut self, display: &HotkeyDisplay);

    fn set_visibility(&mut self, change: VisibilityChange);

    /// Transient status text that belongs to no widget
    fn show_message(&mut self, message: &str);
}

/// Line-oriented view on stdout
#[derive(Debug, Default)]
pub struct ConsoleView;

impl OverlayView for ConsoleView {
    fn show_files(&mut self, listing: &Listing, files: &[AudioFileRef]) {
        match listing {
            Listing::NoFolder => println!("No folder selected"),
            Listing::Empty => println!("No audio files found"),
            Listing::Files(_) if files.is_empty() => println!("No matching files"),
            Listing::Files(_) => {
                for (i, file) in files.iter().enumerate() {
                    println!("{:>3}  {}", i + 1, file);
                }
            }
        }
    }

    fn show_play_state(&mut self, file: &AudioFileRef, visual: &PlayVisual) {
        match visual {
            PlayVisual::Error(_) | PlayVisual::Launched => {
                println!("{} {}  ({})", visual.glyph(), file, visual.tooltip())
            }
            _ => println!("{} {}", visual.glyph(), file),
        }
    }

    fn show_copied(&mut self, file: &AudioFileRef, highlighted: bool) {
        if highlighted {
            println!("Copied {}", file);
        }
    }

    fn show_hotkey(&mut self, display: &HotkeyDisplay) {
        println!("Hotkey: {}", display);
    }

    fn set_visibility(&mut self, change: VisibilityChange) {
        match change {
            VisibilityChange::Hidden => println!("[overlay hidden]"),
            VisibilityChange::ShownAndFocused => println!("[overlay shown]"),
        }
    }

    fn show_message(&mut self, message: &str) {
        println!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotkey_display_text() {
        assert_eq!(
            HotkeyDisplay::Binding(HotkeyBinding::default()).to_string(),
            "Ctrl + Shift + Q"
        );
        assert_eq!(HotkeyDisplay::Capturing.to_string(), "Press key combination...");
        assert_eq!(
            HotkeyDisplay::Rejected.to_string(),
            "Must include Ctrl, Alt, or Shift"
        );
        assert_eq!(HotkeyDisplay::Conflict.to_string(), "Hotkey already in use");
    }
}
