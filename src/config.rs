//! Configuration loading and types for audio-overlay
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/audio-overlay/config.toml)
//! 3. Environment variables (AUDIO_OVERLAY_*)
//! 4. CLI arguments (highest priority)
//!
//! The hotkey binding itself lives in a separate store file
//! (see [`crate::hotkey::store`]) so a rebind never rewrites this file.

use crate::error::OverlayError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Audio Overlay Configuration
#
# Location: ~/.config/audio-overlay/config.toml
# All settings can be overridden via CLI flags

[library]
# Folder whose audio files are listed in the overlay (set via `folder <dir>`)
# folder = "/home/me/Sounds"

# Extensions listed in the overlay (case-insensitive, leading dot)
extensions = [".mp3", ".wav", ".ogg", ".flac", ".m4a", ".aac", ".wma", ".opus", ".aiff", ".alac"]

[playback]
# Output volume (0.0 to 2.0)
volume = 1.0

# Extensions handed to the desktop's default player instead of being decoded
external_extensions = ["opus"]

[hotkey]
# Register the show/hide hotkey with the OS
enabled = true

# Where the active binding is persisted: "auto" or an explicit path
store = "auto"

[feedback]
# How long transient button states stay visible, in milliseconds
launched_ms = 1000
error_ms = 3000
rebind_success_ms = 500
rebind_failure_ms = 2000
copied_ms = 200
"#;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub hotkey: HotkeyConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,
}

/// Folder listing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Selected folder, persisted whenever the user picks a new one
    #[serde(default)]
    pub folder: Option<PathBuf>,

    /// Extension allow-list, compared case-insensitively
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// Playback configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Output volume (0.0 to 2.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Extensions (without dot) routed to the external player
    #[serde(default = "default_external_extensions")]
    pub external_extensions: Vec<String>,
}

/// Global hotkey configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HotkeyConfig {
    /// Register the show/hide hotkey with the OS (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Binding store location: "auto" or an explicit path
    #[serde(default = "default_store")]
    pub store: String,
}

/// Durations of transient visual feedback
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackConfig {
    /// External player hand-off indicator
    #[serde(default = "default_launched_ms")]
    pub launched_ms: u64,

    /// Playback error indicator
    #[serde(default = "default_error_ms")]
    pub error_ms: u64,

    /// Successful rebind highlight
    #[serde(default = "default_rebind_success_ms")]
    pub rebind_success_ms: u64,

    /// Rejected or conflicting rebind message
    #[serde(default = "default_rebind_failure_ms")]
    pub rebind_failure_ms: u64,

    /// Row highlight after a clipboard copy
    #[serde(default = "default_copied_ms")]
    pub copied_ms: u64,
}

impl FeedbackConfig {
    pub fn launched(&self) -> Duration {
        Duration::from_millis(self.launched_ms)
    }

    pub fn error(&self) -> Duration {
        Duration::from_millis(self.error_ms)
    }

    pub fn rebind_success(&self) -> Duration {
        Duration::from_millis(self.rebind_success_ms)
    }

    pub fn rebind_failure(&self) -> Duration {
        Duration::from_millis(self.rebind_failure_ms)
    }

    pub fn copied(&self) -> Duration {
        Duration::from_millis(self.copied_ms)
    }
}

fn default_extensions() -> Vec<String> {
    [
        ".mp3", ".wav", ".ogg", ".flac", ".m4a", ".aac", ".wma", ".opus", ".aiff", ".alac",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_volume() -> f32 {
    1.0
}

fn default_external_extensions() -> Vec<String> {
    vec!["opus".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_store() -> String {
    "auto".to_string()
}

fn default_launched_ms() -> u64 {
    1000
}

fn default_error_ms() -> u64 {
    3000
}

fn default_rebind_success_ms() -> u64 {
    500
}

fn default_rebind_failure_ms() -> u64 {
    2000
}

fn default_copied_ms() -> u64 {
    200
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            folder: None,
            extensions: default_extensions(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            external_extensions: default_external_extensions(),
        }
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store: default_store(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            launched_ms: default_launched_ms(),
            error_ms: default_error_ms(),
            rebind_success_ms: default_rebind_success_ms(),
            rebind_failure_ms: default_rebind_failure_ms(),
            copied_ms: default_copied_ms(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "audio-overlay")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Resolve the hotkey binding store path
    /// Returns None only when "auto" is requested and no config dir exists
    pub fn resolve_binding_store(&self) -> Option<PathBuf> {
        match self.hotkey.store.to_lowercase().as_str() {
            "auto" => Self::config_dir().map(|dir| dir.join("hotkey.txt")),
            _ => Some(PathBuf::from(&self.hotkey.store)),
        }
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, OverlayError> {
    let mut config = Config::default();

    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| OverlayError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| OverlayError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    if let Ok(folder) = std::env::var("AUDIO_OVERLAY_FOLDER") {
        config.library.folder = Some(PathBuf::from(folder));
    }
    if let Ok(volume) = std::env::var("AUDIO_OVERLAY_VOLUME") {
        match volume.parse::<f32>() {
            Ok(v) => config.playback.volume = v,
            Err(_) => tracing::warn!("Ignoring invalid AUDIO_OVERLAY_VOLUME: {:?}", volume),
        }
    }

    config.playback.volume = config.playback.volume.clamp(0.0, 2.0);

    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &Config, path: &Path) -> Result<(), OverlayError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| OverlayError::Config(format!("Failed to create config dir: {}", e)))?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| OverlayError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(path, contents)
        .map_err(|e| OverlayError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}
