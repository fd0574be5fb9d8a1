//! Audio folder listing
//!
//! Produces the ordered list of playable files shown in the overlay.
//! Listing is non-recursive and filtered by the configured extension
//! allow-list.

use crate::config::LibraryConfig;
use std::fmt;
use std::path::{Path, PathBuf};

/// A playable file. Display name and extension are derived once, at
/// construction, and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioFileRef {
    path: PathBuf,
    name: String,
    extension: String,
}

impl AudioFileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let path = std::path::absolute(&path).unwrap_or(path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            path,
            name,
            extension,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name including extension
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased extension without the leading dot
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl fmt::Display for AudioFileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Outcome of listing the selected folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// No folder configured, or it does not exist
    NoFolder,
    /// Folder exists but has no allow-listed files
    Empty,
    Files(Vec<AudioFileRef>),
}

impl Listing {
    pub fn files(&self) -> &[AudioFileRef] {
        match self {
            Listing::Files(files) => files,
            _ => &[],
        }
    }
}

/// Lists the allow-listed audio files in a folder
pub struct Library {
    folder: Option<PathBuf>,
    extensions: Vec<String>,
}

impl Library {
    pub fn new(config: &LibraryConfig) -> Self {
        let extensions = config
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();

        Self {
            folder: config.folder.clone(),
            extensions,
        }
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn set_folder(&mut self, folder: PathBuf) {
        self.folder = Some(folder);
    }

    fn is_allowed(&self, file: &AudioFileRef) -> bool {
        self.extensions.iter().any(|e| e == file.extension())
    }

    /// List the folder, sorted by file name
    pub fn list(&self) -> Listing {
        let Some(folder) = self.folder.as_deref().filter(|f| f.is_dir()) else {
            return Listing::NoFolder;
        };

        let entries = match std::fs::read_dir(folder) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to read folder {:?}: {}", folder, e);
                return Listing::NoFolder;
            }
        };

        let mut files: Vec<AudioFileRef> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .map(AudioFileRef::new)
            .filter(|file| self.is_allowed(file))
            .collect();

        files.sort_by(|a, b| a.name().cmp(b.name()));
        tracing::debug!("Listed {} audio file(s) in {:?}", files.len(), folder);

        if files.is_empty() {
            Listing::Empty
        } else {
            Listing::Files(files)
        }
    }
}

/// Case-insensitive substring filter over file names.
/// A blank query keeps every file.
pub fn filter_files(files: &[AudioFileRef], query: &str) -> Vec<AudioFileRef> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return files.to_vec();
    }

    files
        .iter()
        .filter(|f| f.name().to_lowercase().contains(&query))
        .cloned()
        .collect()
}
