//! Single-slot playback controller
//!
//! Owns at most one session (decoded source + output sink). Every path that
//! starts a new session releases the previous one first, so two decoded
//! sources are never open at once.

use super::{
    ActiveStream, AudioBackend, CompletionSignal, DecodeStrategy, ExternalLauncher, PlaybackEvent,
    SessionId,
};
use crate::error::PlaybackError;
use crate::library::AudioFileRef;
use crate::state::PlaybackState;
use tokio::sync::mpsc;

struct Session {
    id: SessionId,
    file: AudioFileRef,
    stream: Box<dyn ActiveStream>,
    state: PlaybackState,
}

pub struct PlaybackController<B, L> {
    backend: B,
    launcher: L,
    external_extensions: Vec<String>,
    session: Option<Session>,
    next_session: u64,
    completions: mpsc::UnboundedSender<SessionId>,
}

impl<B: AudioBackend, L: ExternalLauncher> PlaybackController<B, L> {
    /// Create a controller. End-of-stream notifications are sent on
    /// `completions` and must be fed back through [`Self::handle_finished`]
    /// by the owner of the controller.
    pub fn new(
        backend: B,
        launcher: L,
        external_extensions: Vec<String>,
        completions: mpsc::UnboundedSender<SessionId>,
    ) -> Self {
        Self {
            backend,
            launcher,
            external_extensions,
            session: None,
            next_session: 0,
            completions,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(PlaybackState::Idle)
    }

    pub fn current_file(&self) -> Option<&AudioFileRef> {
        self.session.as_ref().map(|s| &s.file)
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Play `file`, or pause/resume it in place if it is the current session
    pub fn play(&mut self, file: &AudioFileRef) -> Result<PlaybackEvent, PlaybackError> {
        if self.current_file() == Some(file) {
            if let Some(event) = self.toggle() {
                return Ok(event);
            }
        }

        let replaced = self.release();

        if !file.path().is_file() {
            return Err(PlaybackError::decode(file.path(), "file not found"));
        }

        let strategy = DecodeStrategy::for_file(file, &self.external_extensions);
        tracing::debug!("Playing {} via {:?}", file, strategy);

        if strategy == DecodeStrategy::External {
            self.launcher.launch(file)?;
            tracing::info!("Handed {} to the external player", file);
            return Ok(PlaybackEvent::Launched {
                file: file.clone(),
                replaced,
            });
        }

        self.next_session += 1;
        let id = SessionId(self.next_session);
        let done = CompletionSignal::new(id, self.completions.clone());
        let stream = self.backend.open(file, strategy, done)?;

        self.session = Some(Session {
            id,
            file: file.clone(),
            stream,
            state: PlaybackState::Playing,
        });
        tracing::info!("Playing {} ({:?})", file, id);

        Ok(PlaybackEvent::Started {
            file: file.clone(),
            replaced,
        })
    }

    /// Flip the current session between playing and paused.
    /// Returns None when there is no session.
    pub fn toggle(&mut self) -> Option<PlaybackEvent> {
        let session = self.session.as_mut()?;
        match session.state {
            PlaybackState::Playing => {
                session.stream.pause();
                session.state = PlaybackState::Paused;
                tracing::debug!("Paused {}", session.file);
                Some(PlaybackEvent::Paused(session.file.clone()))
            }
            PlaybackState::Paused => {
                session.stream.resume();
                session.state = PlaybackState::Playing;
                tracing::debug!("Resumed {}", session.file);
                Some(PlaybackEvent::Resumed(session.file.clone()))
            }
            PlaybackState::Idle => None,
        }
    }

    /// Release the current session. No-op without a session.
    pub fn stop(&mut self) -> Option<PlaybackEvent> {
        self.release().map(PlaybackEvent::Stopped)
    }

    /// Apply an end-of-stream notification. Notifications from sessions that
    /// were already stopped or replaced are dropped.
    pub fn handle_finished(&mut self, id: SessionId) -> Option<PlaybackEvent> {
        if self.current_session() != Some(id) {
            tracing::trace!("Ignoring stale completion for {:?}", id);
            return None;
        }

        let file = self.release()?;
        tracing::info!("Finished {}", file);
        Some(PlaybackEvent::Finished(file))
    }

    fn release(&mut self) -> Option<AudioFileRef> {
        let session = self.session.take()?;
        session.stream.stop();
        tracing::debug!("Released {:?} ({})", session.id, session.file);
        Some(session.file)
    }
}

impl<B, L> Drop for PlaybackController<B, L> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.stream.stop();
        }
    }
}
