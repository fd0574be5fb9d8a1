//! Global hotkey module
//!
//! A binding is a modifier set plus a key code. Key codes are Windows
//! virtual-key numbers and modifier bits follow the `RegisterHotKey`
//! layout (Alt=1, Ctrl=2, Shift=4); the persisted store uses the same numbers
//! so binding files stay portable between platforms.
//!
//! OS registration sits behind [`HotkeyRegistrar`]; [`global`] implements it
//! with the `global-hotkey` crate.

pub mod capture;
pub mod global;
pub mod rebind;
pub mod store;

use crate::error::HotkeyError;
use std::fmt;
use std::str::FromStr;

/// Set of held modifier keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const ALT: Modifiers = Modifiers(0x0001);
    pub const CTRL: Modifiers = Modifiers(0x0002);
    pub const SHIFT: Modifiers = Modifiers(0x0004);

    const ALL: u32 = 0x0007;

    /// Build from raw bits; unknown bits are rejected
    pub fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::ALL == 0 {
            Some(Modifiers(bits))
        } else {
            None
        }
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        self.0 |= rhs.0;
    }
}

/// Virtual-key code of the non-modifier key in a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const BACKSPACE: KeyCode = KeyCode(0x08);
    pub const TAB: KeyCode = KeyCode(0x09);
    pub const ENTER: KeyCode = KeyCode(0x0D);
    pub const SHIFT: KeyCode = KeyCode(0x10);
    pub const CONTROL: KeyCode = KeyCode(0x11);
    pub const MENU: KeyCode = KeyCode(0x12);
    pub const ESCAPE: KeyCode = KeyCode(0x1B);
    pub const SPACE: KeyCode = KeyCode(0x20);

    const NAMED: [(u32, &'static str); 15] = [
        (0x08, "Backspace"),
        (0x09, "Tab"),
        (0x0D, "Enter"),
        (0x1B, "Esc"),
        (0x20, "Space"),
        (0x21, "PageUp"),
        (0x22, "PageDown"),
        (0x23, "End"),
        (0x24, "Home"),
        (0x25, "Left"),
        (0x26, "Up"),
        (0x27, "Right"),
        (0x28, "Down"),
        (0x2D, "Insert"),
        (0x2E, "Delete"),
    ];

    /// Human-readable key name
    pub fn name(&self) -> String {
        let vk = self.0;
        match vk {
            0x41..=0x5A | 0x30..=0x39 => char::from_u32(vk)
                .map(String::from)
                .unwrap_or_else(|| format!("Key{}", vk)),
            0x70..=0x87 => format!("F{}", vk - 0x6F),
            _ => Self::NAMED
                .iter()
                .find(|(code, _)| *code == vk)
                .map(|(_, name)| name.to_string())
                .unwrap_or_else(|| format!("Key{}", vk)),
        }
    }

    /// Parse a key name as produced by [`KeyCode::name`], case-insensitive.
    /// Also accepts `Escape`, `Return` and `KeyNN` forms.
    pub fn from_name(name: &str) -> Result<KeyCode, HotkeyError> {
        let upper = name.trim().to_uppercase();
        let mut chars = upper.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_uppercase() || c.is_ascii_digit() {
                return Ok(KeyCode(c as u32));
            }
        }

        if let Some(n) = upper.strip_prefix('F').and_then(|n| n.parse::<u32>().ok()) {
            if (1..=24).contains(&n) {
                return Ok(KeyCode(0x6F + n));
            }
        }

        if let Some(n) = upper.strip_prefix("KEY").and_then(|n| n.parse::<u32>().ok()) {
            return Ok(KeyCode(n));
        }

        match upper.as_str() {
            "ESCAPE" => return Ok(KeyCode::ESCAPE),
            "RETURN" => return Ok(KeyCode::ENTER),
            _ => {}
        }

        Self::NAMED
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(&upper))
            .map(|(code, _)| KeyCode(*code))
            .ok_or_else(|| HotkeyError::UnknownKey(name.to_string()))
    }
}

/// A modifier set plus key registered as the show/hide hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotkeyBinding {
    pub modifiers: Modifiers,
    pub key: KeyCode,
}

impl HotkeyBinding {
    pub fn new(modifiers: Modifiers, key: KeyCode) -> Self {
        Self { modifiers, key }
    }
}

impl Default for HotkeyBinding {
    /// Ctrl + Shift + Q
    fn default() -> Self {
        Self {
            modifiers: Modifiers::CTRL | Modifiers::SHIFT,
            key: KeyCode(0x51),
        }
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Modifiers::CTRL, "Ctrl"),
            (Modifiers::ALT, "Alt"),
            (Modifiers::SHIFT, "Shift"),
        ];
        for (modifier, name) in names {
            if self.modifiers.contains(modifier) {
                write!(f, "{} + ", name)?;
            }
        }
        f.write_str(&self.key.name())
    }
}

impl FromStr for HotkeyBinding {
    type Err = HotkeyError;

    /// Parse `Ctrl+Shift+Q` style strings (`+` separated, spaces ignored)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::NONE;
        let mut key = None;

        for part in s.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= Modifiers::CTRL,
                "alt" => modifiers |= Modifiers::ALT,
                "shift" => modifiers |= Modifiers::SHIFT,
                _ if key.is_some() => {
                    return Err(HotkeyError::InvalidBinding(format!(
                        "more than one key in '{}'",
                        s
                    )))
                }
                _ => key = Some(KeyCode::from_name(part)?),
            }
        }

        let key = key.ok_or_else(|| HotkeyError::InvalidBinding(format!("no key in '{}'", s)))?;
        if modifiers.is_empty() {
            return Err(HotkeyError::InvalidBinding(format!(
                "'{}' must include Ctrl, Alt, or Shift",
                s
            )));
        }

        Ok(HotkeyBinding { modifiers, key })
    }
}

/// OS-level hotkey registration. At most one binding is registered through
/// a registrar at a time.
pub trait HotkeyRegistrar {
    /// Register `binding` as the global hotkey
    fn register(&mut self, binding: &HotkeyBinding) -> Result<(), HotkeyError>;

    /// Unregister the current binding. Succeeds when nothing is registered.
    fn unregister(&mut self) -> Result<(), HotkeyError>;

    /// True when an OS hotkey event with `id` belongs to the registered binding
    fn owns_event(&self, id: u32) -> bool;

    /// False when there is no OS service to register with at all
    fn is_available(&self) -> bool {
        true
    }
}

/// `None` stands in when no platform hotkey manager could be created
impl<R: HotkeyRegistrar> HotkeyRegistrar for Option<R> {
    fn register(&mut self, binding: &HotkeyBinding) -> Result<(), HotkeyError> {
        match self {
            Some(registrar) => registrar.register(binding),
            None => Err(HotkeyError::Manager(format!(
                "no hotkey manager to register {}",
                binding
            ))),
        }
    }

    fn unregister(&mut self) -> Result<(), HotkeyError> {
        match self {
            Some(registrar) => registrar.unregister(),
            None => Ok(()),
        }
    }

    fn owns_event(&self, id: u32) -> bool {
        self.as_ref().map(|r| r.owns_event(id)).unwrap_or(false)
    }

    fn is_available(&self) -> bool {
        self.as_ref().map(|r| r.is_available()).unwrap_or(false)
    }
}
