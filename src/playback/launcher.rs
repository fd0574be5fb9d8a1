//! External player hand-off
//!
//! Opens a file with the desktop's default handler (xdg-open, `open`,
//! ShellExecute). The spawned process is detached; its exit is never
//! observed, so the overlay only shows a fixed-length "launched" indicator.

use super::ExternalLauncher;
use crate::error::PlaybackError;
use crate::library::AudioFileRef;

/// Launches files with the system default application
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl ExternalLauncher for SystemLauncher {
    fn launch(&self, file: &AudioFileRef) -> Result<(), PlaybackError> {
        open::that_detached(file.path()).map_err(|e| PlaybackError::Launch {
            path: file.path().to_path_buf(),
            reason: e.to_string(),
        })
    }
}
