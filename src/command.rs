//! Line commands for driving the overlay from a terminal
//!
//! Each stdin line is one user action (the equivalent of a click in the
//! overlay window). While a rebind capture is active, lines are instead
//! read as key chords, e.g. `ctrl+shift+q`, `ctrl`, `escape`.

use crate::error::HotkeyError;
use crate::hotkey::capture::{KeyPress, ModifierKey, RawKey, Side};
use crate::hotkey::{KeyCode, Modifiers};
use std::path::PathBuf;

/// Identifies a file in the currently displayed list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// 1-based position in the list
    Index(usize),
    /// File name, or part of it
    Name(String),
}

impl Selector {
    fn parse(arg: &str) -> Selector {
        match arg.parse::<usize>() {
            Ok(n) => Selector::Index(n),
            Err(_) => Selector::Name(arg.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Search(String),
    Play(Selector),
    Stop,
    Copy(Selector),
    Folder(PathBuf),
    Rebind,
    /// Same as the global hotkey firing
    Toggle,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  list              show files
  search <text>     filter files by name (empty to clear)
  play <n|name>     play, pause or resume a file
  stop              stop playback
  copy <n|name>     copy a file to the clipboard
  folder <dir>      choose the audio folder
  rebind            capture a new hotkey (then type e.g. ctrl+shift+q, or escape)
  toggle            show/hide the overlay
  quit              exit";

/// Parse one command line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (line, ""),
    };

    let needs_arg = |cmd: &str| -> Result<(), String> {
        if arg.is_empty() {
            Err(format!("'{}' needs an argument", cmd))
        } else {
            Ok(())
        }
    };

    let command = match word.to_lowercase().as_str() {
        "list" | "ls" => Command::List,
        "search" | "find" => Command::Search(arg.to_string()),
        "play" | "p" => {
            needs_arg("play")?;
            Command::Play(Selector::parse(arg))
        }
        "stop" => Command::Stop,
        "copy" | "c" => {
            needs_arg("copy")?;
            Command::Copy(Selector::parse(arg))
        }
        "folder" | "cd" => {
            needs_arg("folder")?;
            Command::Folder(PathBuf::from(arg))
        }
        "rebind" => Command::Rebind,
        "toggle" => Command::Toggle,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("Unknown command '{}' (try 'help')", other)),
    };

    Ok(Some(command))
}

/// Turn a chord such as `ctrl+shift+q` into the key presses a keyboard
/// would produce, with modifier state accumulating left to right.
pub fn parse_key_chord(line: &str) -> Result<Vec<KeyPress>, HotkeyError> {
    let mut held = Modifiers::NONE;
    let mut presses = Vec::new();

    for token in line.split('+').map(str::trim).filter(|t| !t.is_empty()) {
        let key = match token.to_lowercase().as_str() {
            "ctrl" | "control" | "lctrl" => RawKey::Modifier(ModifierKey::Ctrl, Side::Left),
            "rctrl" => RawKey::Modifier(ModifierKey::Ctrl, Side::Right),
            "alt" | "lalt" => RawKey::Modifier(ModifierKey::Alt, Side::Left),
            "ralt" | "altgr" => RawKey::Modifier(ModifierKey::Alt, Side::Right),
            "shift" | "lshift" => RawKey::Modifier(ModifierKey::Shift, Side::Left),
            "rshift" => RawKey::Modifier(ModifierKey::Shift, Side::Right),
            _ => RawKey::from_code(KeyCode::from_name(token)?),
        };

        presses.push(KeyPress::new(key, held));
        if let RawKey::Modifier(modifier, _) = key {
            held |= modifier.as_modifiers();
        }
    }

    Ok(presses)
}
