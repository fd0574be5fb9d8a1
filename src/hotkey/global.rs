//! OS hotkey registration through the `global-hotkey` crate
//!
//! Works on Windows, macOS, and X11. Press events arrive on the crate's
//! process-wide channel; [`spawn_event_forwarder`] moves them onto a tokio
//! channel so the daemon can sequence them with everything else.

use super::{HotkeyBinding, HotkeyRegistrar, KeyCode, Modifiers};
use crate::error::HotkeyError;
use global_hotkey::hotkey::{Code, HotKey, Modifiers as OsModifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tokio::sync::mpsc;

/// Registrar backed by the platform hotkey manager
pub struct GlobalRegistrar {
    manager: GlobalHotKeyManager,
    current: Option<HotKey>,
}

impl GlobalRegistrar {
    pub fn new() -> Result<Self, HotkeyError> {
        let manager = GlobalHotKeyManager::new()?;
        Ok(Self {
            manager,
            current: None,
        })
    }
}

impl HotkeyRegistrar for GlobalRegistrar {
    fn register(&mut self, binding: &HotkeyBinding) -> Result<(), HotkeyError> {
        let hotkey = to_os_hotkey(binding)?;
        self.manager
            .register(hotkey)
            .map_err(|e| HotkeyError::RegistrationConflict(format!("{} ({})", binding, e)))?;
        self.current = Some(hotkey);
        Ok(())
    }

    fn unregister(&mut self) -> Result<(), HotkeyError> {
        match self.current.take() {
            Some(hotkey) => Ok(self.manager.unregister(hotkey)?),
            None => Ok(()),
        }
    }

    fn owns_event(&self, id: u32) -> bool {
        self.current.map(|h| h.id() == id).unwrap_or(false)
    }
}

/// Convert a binding into the crate's hotkey type
pub fn to_os_hotkey(binding: &HotkeyBinding) -> Result<HotKey, HotkeyError> {
    let mut mods = OsModifiers::empty();
    if binding.modifiers.contains(Modifiers::CTRL) {
        mods |= OsModifiers::CONTROL;
    }
    if binding.modifiers.contains(Modifiers::ALT) {
        mods |= OsModifiers::ALT;
    }
    if binding.modifiers.contains(Modifiers::SHIFT) {
        mods |= OsModifiers::SHIFT;
    }

    let code = to_code(binding.key).ok_or_else(|| HotkeyError::UnknownKey(binding.key.name()))?;
    Ok(HotKey::new(Some(mods), code))
}

fn to_code(key: KeyCode) -> Option<Code> {
    const LETTERS: [Code; 26] = [
        Code::KeyA,
        Code::KeyB,
        Code::KeyC,
        Code::KeyD,
        Code::KeyE,
        Code::KeyF,
        Code::KeyG,
        Code::KeyH,
        Code::KeyI,
        Code::KeyJ,
        Code::KeyK,
        Code::KeyL,
        Code::KeyM,
        Code::KeyN,
        Code::KeyO,
        Code::KeyP,
        Code::KeyQ,
        Code::KeyR,
        Code::KeyS,
        Code::KeyT,
        Code::KeyU,
        Code::KeyV,
        Code::KeyW,
        Code::KeyX,
        Code::KeyY,
        Code::KeyZ,
    ];
    const DIGITS: [Code; 10] = [
        Code::Digit0,
        Code::Digit1,
        Code::Digit2,
        Code::Digit3,
        Code::Digit4,
        Code::Digit5,
        Code::Digit6,
        Code::Digit7,
        Code::Digit8,
        Code::Digit9,
    ];
    const FUNCTION: [Code; 24] = [
        Code::F1,
        Code::F2,
        Code::F3,
        Code::F4,
        Code::F5,
        Code::F6,
        Code::F7,
        Code::F8,
        Code::F9,
        Code::F10,
        Code::F11,
        Code::F12,
        Code::F13,
        Code::F14,
        Code::F15,
        Code::F16,
        Code::F17,
        Code::F18,
        Code::F19,
        Code::F20,
        Code::F21,
        Code::F22,
        Code::F23,
        Code::F24,
    ];

    let vk = key.0;
    match vk {
        0x41..=0x5A => Some(LETTERS[(vk - 0x41) as usize]),
        0x30..=0x39 => Some(DIGITS[(vk - 0x30) as usize]),
        0x70..=0x87 => Some(FUNCTION[(vk - 0x70) as usize]),
        0x08 => Some(Code::Backspace),
        0x09 => Some(Code::Tab),
        0x0D => Some(Code::Enter),
        0x1B => Some(Code::Escape),
        0x20 => Some(Code::Space),
        0x21 => Some(Code::PageUp),
        0x22 => Some(Code::PageDown),
        0x23 => Some(Code::End),
        0x24 => Some(Code::Home),
        0x25 => Some(Code::ArrowLeft),
        0x26 => Some(Code::ArrowUp),
        0x27 => Some(Code::ArrowRight),
        0x28 => Some(Code::ArrowDown),
        0x2D => Some(Code::Insert),
        0x2E => Some(Code::Delete),
        _ => None,
    }
}

/// Forward hotkey press events (by id) from the crate's global channel.
/// The thread exits once the receiving side is dropped and another event
/// arrives.
pub fn spawn_event_forwarder(tx: mpsc::UnboundedSender<u32>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("hotkey-events".to_string())
        .spawn(move || {
            let receiver = GlobalHotKeyEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if event.state != HotKeyState::Pressed {
                    continue;
                }
                tracing::trace!("Global hotkey {} pressed", event.id);
                if tx.send(event.id).is_err() {
                    break;
                }
            }
            tracing::debug!("Hotkey event forwarder stopped");
        })?;
    Ok(())
}
