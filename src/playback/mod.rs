//! Audio playback module
//!
//! The controller keeps at most one decoded source and output sink alive.
//! Decoding and output go through the [`AudioBackend`] trait (rodio in
//! production); one extension family bypasses the backend and is handed to
//! the desktop's default player through [`ExternalLauncher`].

pub mod controller;
pub mod launcher;
pub mod rodio_backend;

pub use controller::PlaybackController;

use crate::error::PlaybackError;
use crate::library::AudioFileRef;
use tokio::sync::mpsc;

/// Decoding route for a file, resolved once per `play()` from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// Ogg Vorbis streams
    Vorbis,
    /// Formats decoded directly (mp3, wav)
    Direct,
    /// Container or transcoded formats (flac, m4a, aac, wma, aiff, alac)
    Container,
    /// Handed to the external player, never decoded in-process
    External,
    /// Unknown extension: sniff the content and hope for the best
    Fallback,
}

impl DecodeStrategy {
    /// Pick the route for a file. `external` lists extensions (no dot,
    /// lower-case) that go to the external player.
    pub fn for_file(file: &AudioFileRef, external: &[String]) -> Self {
        let ext = file.extension();
        if external.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            return DecodeStrategy::External;
        }

        match ext {
            "ogg" => DecodeStrategy::Vorbis,
            "mp3" | "wav" => DecodeStrategy::Direct,
            "flac" | "m4a" | "aac" | "wma" | "aiff" | "alac" => DecodeStrategy::Container,
            _ => DecodeStrategy::Fallback,
        }
    }
}

/// Identifies one playback session. Monotonic per controller, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// One-shot end-of-stream notification handed to the backend.
///
/// The backend fires it from whatever thread observes the end of the
/// stream; the notification is only a message carrying the session id, the
/// owner loop decides whether it still applies.
#[derive(Debug)]
pub struct CompletionSignal {
    session: SessionId,
    tx: mpsc::UnboundedSender<SessionId>,
}

impl CompletionSignal {
    pub fn new(session: SessionId, tx: mpsc::UnboundedSender<SessionId>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn notify(self) {
        if self.tx.send(self.session).is_err() {
            tracing::trace!("Completion for {:?} dropped, owner gone", self.session);
        }
    }
}

/// A live decoded source bound to an output sink
pub trait ActiveStream {
    fn pause(&self);

    fn resume(&self);

    /// Stop output and release the decoded source. Called exactly once.
    fn stop(&self);
}

/// Opens decoded sources on an output device
pub trait AudioBackend {
    /// Decode `file` using `strategy` and start playing it.
    /// `done` must be fired once when the stream ends on its own or is stopped.
    fn open(
        &mut self,
        file: &AudioFileRef,
        strategy: DecodeStrategy,
        done: CompletionSignal,
    ) -> Result<Box<dyn ActiveStream>, PlaybackError>;
}

/// Fire-and-forget hand-off to an external player process
pub trait ExternalLauncher {
    fn launch(&self, file: &AudioFileRef) -> Result<(), PlaybackError>;
}

/// Lifecycle events emitted by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// A new session started; `replaced` is the file whose session was released
    Started {
        file: AudioFileRef,
        replaced: Option<AudioFileRef>,
    },
    Paused(AudioFileRef),
    Resumed(AudioFileRef),
    /// The file was handed to the external player
    Launched {
        file: AudioFileRef,
        replaced: Option<AudioFileRef>,
    },
    /// Session released by an explicit stop
    Stopped(AudioFileRef),
    /// Session released at natural end of stream
    Finished(AudioFileRef),
}
