//! Persisted hotkey binding
//!
//! A single line `<modifier bits>,<virtual key>` in decimal, e.g. `6,81`
//! for Ctrl + Shift + Q. Any read or parse failure falls back to
//! [`HotkeyBinding::default`]; a missing store never blocks startup.

use super::{HotkeyBinding, KeyCode, Modifiers};
use crate::error::OverlayError;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct BindingStore {
    path: Option<PathBuf>,
}

impl BindingStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the persisted binding, or the default
    pub fn load(&self) -> HotkeyBinding {
        let Some(path) = self.path.as_deref() else {
            return HotkeyBinding::default();
        };

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::debug!("No stored hotkey at {:?} ({}), using default", path, e);
                return HotkeyBinding::default();
            }
        };

        match parse_record(&contents) {
            Some(binding) => {
                tracing::debug!("Loaded hotkey {} from {:?}", binding, path);
                binding
            }
            None => {
                tracing::warn!("Ignoring malformed hotkey store {:?}, using default", path);
                HotkeyBinding::default()
            }
        }
    }

    /// Persist `binding`, creating the parent directory if needed
    pub fn save(&self, binding: &HotkeyBinding) -> Result<(), OverlayError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, format_record(binding))?;
        tracing::debug!("Saved hotkey {} to {:?}", binding, path);
        Ok(())
    }
}

fn format_record(binding: &HotkeyBinding) -> String {
    format!("{},{}", binding.modifiers.bits(), binding.key.0)
}

/// Parse `<mods>,<key>`. Bindings without a modifier are treated as
/// malformed, since they could never have been registered.
fn parse_record(contents: &str) -> Option<HotkeyBinding> {
    let (mods, key) = contents.trim().split_once(',')?;
    let modifiers = Modifiers::from_bits(mods.trim().parse().ok()?)?;
    let key: u32 = key.trim().parse().ok()?;

    if modifiers.is_empty() || key == 0 {
        return None;
    }
    Some(HotkeyBinding::new(modifiers, KeyCode(key)))
}
