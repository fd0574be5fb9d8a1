//! Interactive key capture for rebinding the hotkey
//!
//! While a capture is active it consumes every key press. The first
//! non-modifier key decides the outcome; Escape cancels at any point.
//! Exactly one outcome is produced, after which the capture ignores input.

use super::{HotkeyBinding, KeyCode, Modifiers};

/// Which modifier key was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKey {
    Ctrl,
    Alt,
    Shift,
}

impl ModifierKey {
    pub fn as_modifiers(self) -> Modifiers {
        match self {
            ModifierKey::Ctrl => Modifiers::CTRL,
            ModifierKey::Alt => Modifiers::ALT,
            ModifierKey::Shift => Modifiers::SHIFT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// A raw key as seen by the capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKey {
    Escape,
    Modifier(ModifierKey, Side),
    /// Alt-chorded system key reported without its real key
    System,
    Key(KeyCode),
}

impl RawKey {
    /// Classify a virtual-key code
    pub fn from_code(code: KeyCode) -> RawKey {
        match code.0 {
            0x1B => RawKey::Escape,
            0x10 | 0xA0 => RawKey::Modifier(ModifierKey::Shift, Side::Left),
            0xA1 => RawKey::Modifier(ModifierKey::Shift, Side::Right),
            0x11 | 0xA2 => RawKey::Modifier(ModifierKey::Ctrl, Side::Left),
            0xA3 => RawKey::Modifier(ModifierKey::Ctrl, Side::Right),
            0x12 | 0xA4 => RawKey::Modifier(ModifierKey::Alt, Side::Left),
            0xA5 => RawKey::Modifier(ModifierKey::Alt, Side::Right),
            _ => RawKey::Key(code),
        }
    }
}

/// A key press plus the modifier state of the keyboard at that moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: RawKey,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(key: RawKey, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A bare key would swallow that key system-wide
    NoModifier,
}

/// Terminal result of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Cancelled,
    Rejected(RejectReason),
    Candidate(HotkeyBinding),
}

/// Result of feeding one key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStep {
    /// Press consumed, capture still waiting
    Pending,
    Finished(CaptureOutcome),
    /// Capture already finished; the press was not consumed
    Inactive,
}

/// Capture state for one rebind interaction
#[derive(Debug)]
pub struct KeyCapture {
    previous: HotkeyBinding,
    pending_modifiers: Modifiers,
    attempts: u32,
    finished: bool,
}

impl KeyCapture {
    /// Start capturing. `previous` is the binding shown again on cancel or
    /// rejection.
    pub fn begin(previous: HotkeyBinding) -> Self {
        tracing::debug!("Key capture started (current: {})", previous);
        Self {
            previous,
            pending_modifiers: Modifiers::NONE,
            attempts: 0,
            finished: false,
        }
    }

    pub fn previous(&self) -> HotkeyBinding {
        self.previous
    }

    /// Modifiers held during the most recent press
    pub fn pending_modifiers(&self) -> Modifiers {
        self.pending_modifiers
    }

    /// Key presses consumed so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_active(&self) -> bool {
        !self.finished
    }

    pub fn handle(&mut self, press: KeyPress) -> CaptureStep {
        if self.finished {
            return CaptureStep::Inactive;
        }

        self.attempts += 1;
        self.pending_modifiers = press.modifiers;

        let outcome = match press.key {
            RawKey::Escape => CaptureOutcome::Cancelled,
            RawKey::Modifier(modifier, _) => {
                self.pending_modifiers |= modifier.as_modifiers();
                return CaptureStep::Pending;
            }
            RawKey::System => return CaptureStep::Pending,
            RawKey::Key(_) if press.modifiers.is_empty() => {
                CaptureOutcome::Rejected(RejectReason::NoModifier)
            }
            RawKey::Key(key) => CaptureOutcome::Candidate(HotkeyBinding::new(press.modifiers, key)),
        };

        self.finished = true;
        tracing::debug!("Key capture finished after {} press(es): {:?}", self.attempts, outcome);
        CaptureStep::Finished(outcome)
    }
}
