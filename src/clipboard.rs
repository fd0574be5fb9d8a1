//! Copy audio files to the clipboard as file references
//!
//! The file is offered as `text/uri-list` so file managers, chat clients and
//! editors paste the file itself rather than its path.
//!
//! Fallback chain:
//! 1. wl-copy - Wayland
//! 2. xclip - X11

use crate::error::ClipboardError;
use crate::library::AudioFileRef;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const URI_LIST: &str = "text/uri-list";

/// Trait for clipboard implementations
#[async_trait::async_trait]
pub trait FileClipboard: Send + Sync {
    /// Put `uri_list` on the clipboard
    async fn copy(&self, uri_list: &str) -> Result<(), ClipboardError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Build a `text/uri-list` body for one file (CRLF terminated)
pub fn uri_list(path: &Path) -> Result<String, ClipboardError> {
    let url = url::Url::from_file_path(path)
        .map_err(|_| ClipboardError::CopyFailed(format!("{:?} is not an absolute path", path)))?;
    Ok(format!("{}\r\n", url))
}

/// Pipe `data` into `program args...`, mapping spawn failures
async fn pipe_to(program: &'static str, args: &[&str], data: &str) -> Result<(), ClipboardError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ClipboardError::ToolNotFound(program)
            } else {
                ClipboardError::CopyFailed(e.to_string())
            }
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(data.as_bytes())
            .await
            .map_err(|e| ClipboardError::CopyFailed(e.to_string()))?;
        // Close stdin to signal EOF
        drop(stdin);
    }

    let status = child
        .wait()
        .await
        .map_err(|e| ClipboardError::CopyFailed(e.to_string()))?;

    if !status.success() {
        return Err(ClipboardError::CopyFailed(format!(
            "{} exited with {}",
            program, status
        )));
    }
    Ok(())
}

/// Wayland clipboard via wl-copy
pub struct WlCopy;

#[async_trait::async_trait]
impl FileClipboard for WlCopy {
    async fn copy(&self, uri_list: &str) -> Result<(), ClipboardError> {
        pipe_to("wl-copy", &["--type", URI_LIST], uri_list).await
    }

    fn name(&self) -> &'static str {
        "wl-copy"
    }
}

/// X11 clipboard via xclip
pub struct Xclip;

#[async_trait::async_trait]
impl FileClipboard for Xclip {
    async fn copy(&self, uri_list: &str) -> Result<(), ClipboardError> {
        pipe_to("xclip", &["-selection", "clipboard", "-t", URI_LIST], uri_list).await
    }

    fn name(&self) -> &'static str {
        "xclip"
    }
}

/// Default fallback chain
pub fn create_clipboard_chain() -> Vec<Box<dyn FileClipboard>> {
    vec![Box::new(WlCopy), Box::new(Xclip)]
}

/// Copy `file` using the first clipboard method that succeeds
pub async fn copy_file(
    chain: &[Box<dyn FileClipboard>],
    file: &AudioFileRef,
) -> Result<(), ClipboardError> {
    let body = uri_list(file.path())?;

    for clipboard in chain {
        match clipboard.copy(&body).await {
            Ok(()) => {
                tracing::info!("Copied {} to clipboard via {}", file, clipboard.name());
                return Ok(());
            }
            Err(e) => {
                tracing::debug!("{} failed: {}, trying next", clipboard.name(), e);
            }
        }
    }

    Err(ClipboardError::AllMethodsFailed)
}
