//! Daemon module - main event loop orchestration
//!
//! The daemon is the single owner of the playback session, the active
//! hotkey and the capture state. Everything that can change them arrives
//! as a message on a channel and is applied here, one at a time:
//!
//! - user actions (stdin lines)
//! - global hotkey presses (forwarded from the hotkey thread)
//! - end-of-stream notifications (from sink watcher threads, tagged with
//!   the session they belong to)
//! - flash reversions (tokio timers, tagged with a generation)

use crate::clipboard::{self, FileClipboard};
use crate::command::{self, Command, Selector};
use crate::config::{self, Config};
use crate::error::{HotkeyError, Result};
use crate::hotkey::capture::{CaptureOutcome, CaptureStep, KeyCapture};
use crate::hotkey::rebind::HotkeyService;
use crate::hotkey::store::BindingStore;
use crate::hotkey::HotkeyRegistrar;
use crate::library::{filter_files, AudioFileRef, Library, Listing};
use crate::playback::{
    AudioBackend, ExternalLauncher, PlaybackController, PlaybackEvent, SessionId,
};
use crate::state::PlayVisual;
use crate::view::{HotkeyDisplay, OverlayView};
use crate::visibility::VisibilityToggle;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Whether the loop keeps running after a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A transient visual that reverts after a delay
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlashTarget {
    /// Play button of a file (launched / error indicator)
    Play(PathBuf),
    /// Row highlight after copying a file
    Copied(PathBuf),
    /// Hotkey button message
    Hotkey,
}

/// Timer expiry for a flash; ignored unless `generation` is still current
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reversion {
    target: FlashTarget,
    generation: u64,
}

/// Main daemon that orchestrates all components
pub struct Daemon<B, L, R, V> {
    config: Config,
    config_path: Option<PathBuf>,
    library: Library,
    listing: Listing,
    query: String,
    shown: Vec<AudioFileRef>,
    playback: PlaybackController<B, L>,
    hotkeys: HotkeyService<R>,
    capture: Option<KeyCapture>,
    visibility: VisibilityToggle,
    view: V,
    clipboard: Vec<Box<dyn FileClipboard>>,
    completions: Option<mpsc::UnboundedReceiver<SessionId>>,
    flash_tx: mpsc::UnboundedSender<Reversion>,
    flashes: Option<mpsc::UnboundedReceiver<Reversion>>,
    /// Pending flashes; an entry is dropped when its timer fires or is cancelled
    generations: HashMap<FlashTarget, u64>,
    next_generation: u64,
}

impl<B, L, R, V> Daemon<B, L, R, V>
where
    B: AudioBackend,
    L: ExternalLauncher,
    R: HotkeyRegistrar,
    V: OverlayView,
{
    /// Create a new daemon with the given configuration and collaborators
    pub fn new(
        config: Config,
        backend: B,
        launcher: L,
        registrar: R,
        view: V,
        clipboard: Vec<Box<dyn FileClipboard>>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (flash_tx, flash_rx) = mpsc::unbounded_channel();

        let playback = PlaybackController::new(
            backend,
            launcher,
            config.playback.external_extensions.clone(),
            completion_tx,
        );
        let store = BindingStore::new(config.resolve_binding_store());
        let hotkeys = HotkeyService::new(registrar, store);

        Self {
            library: Library::new(&config.library),
            config,
            config_path: None,
            listing: Listing::NoFolder,
            query: String::new(),
            shown: Vec::new(),
            playback,
            hotkeys,
            capture: None,
            visibility: VisibilityToggle::new(true),
            view,
            clipboard,
            completions: Some(completion_rx),
            flash_tx,
            flashes: Some(flash_rx),
            generations: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Persist folder changes to this config file
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn playback(&self) -> &PlaybackController<B, L> {
        &self.playback
    }

    pub fn hotkeys(&self) -> &HotkeyService<R> {
        &self.hotkeys
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.visibility.is_visible()
    }

    /// Number of flashes still waiting to revert
    pub fn pending_flashes(&self) -> usize {
        self.generations.len()
    }

    /// Files currently displayed (after the search filter)
    pub fn shown_files(&self) -> &[AudioFileRef] {
        &self.shown
    }

    /// Run until `lines` closes, `quit` is entered, or Ctrl+C
    pub async fn run(
        &mut self,
        mut lines: mpsc::Receiver<String>,
        mut hotkey_events: mpsc::UnboundedReceiver<u32>,
    ) -> Result<()> {
        let (Some(mut completions), Some(mut flashes)) =
            (self.completions.take(), self.flashes.take())
        else {
            return Err(crate::error::OverlayError::Config(
                "daemon is already running".to_string(),
            ));
        };

        self.start();

        loop {
            tokio::select! {
                line = lines.recv() => {
                    let Some(line) = line else {
                        tracing::debug!("Input closed");
                        break;
                    };
                    if self.handle_line(&line).await == Flow::Quit {
                        break;
                    }
                }

                Some(id) = hotkey_events.recv() => {
                    self.handle_hotkey(id);
                }

                Some(session) = completions.recv() => {
                    self.handle_finished(session);
                }

                Some(reversion) = flashes.recv() => {
                    self.handle_reversion(reversion);
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down...");
                    break;
                }
            }
        }

        self.shutdown();
        self.completions = Some(completions);
        self.flashes = Some(flashes);
        Ok(())
    }

    /// Load the folder and register the hotkey
    pub fn start(&mut self) {
        self.refresh_listing();

        if !self.config.hotkey.enabled {
            tracing::info!("Global hotkey disabled in config");
            self.view
                .show_hotkey(&HotkeyDisplay::Binding(self.hotkeys.binding()));
            return;
        }

        if !self.hotkeys.is_available() {
            self.view
                .show_hotkey(&HotkeyDisplay::Binding(self.hotkeys.binding()));
            self.view
                .show_message("Global hotkey unavailable on this desktop");
            return;
        }

        match self.hotkeys.activate() {
            Ok(binding) => self.view.show_hotkey(&HotkeyDisplay::Binding(binding)),
            Err(e) => {
                tracing::warn!("Global hotkey not registered: {}", e);
                self.view
                    .show_hotkey(&HotkeyDisplay::Binding(self.hotkeys.binding()));
                self.view
                    .show_message(&format!("Global hotkey unavailable: {}", e));
            }
        }
    }

    /// Stop playback and release the hotkey
    pub fn shutdown(&mut self) {
        if let Some(event) = self.playback.stop() {
            self.apply_playback_event(event);
        }
        self.hotkeys.shutdown();
        tracing::debug!("Daemon shut down");
    }

    /// Apply one line of user input
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        if self.capture.is_some() {
            self.handle_capture_line(line);
            return Flow::Continue;
        }

        match command::parse_command(line) {
            Ok(Some(command)) => self.execute(command).await,
            Ok(None) => Flow::Continue,
            Err(message) => {
                self.view.show_message(&message);
                Flow::Continue
            }
        }
    }

    async fn execute(&mut self, command: Command) -> Flow {
        tracing::debug!("Command: {:?}", command);
        match command {
            Command::List => self.refresh_listing(),
            Command::Search(query) => {
                self.query = query;
                self.show_listing();
            }
            Command::Play(selector) => {
                if let Some(file) = self.resolve(&selector) {
                    self.play(file);
                }
            }
            Command::Stop => {
                if let Some(event) = self.playback.stop() {
                    self.apply_playback_event(event);
                }
            }
            Command::Copy(selector) => {
                if let Some(file) = self.resolve(&selector) {
                    self.copy(file).await;
                }
            }
            Command::Folder(folder) => self.select_folder(folder),
            Command::Rebind => self.begin_capture(),
            Command::Toggle => self.toggle_visibility(),
            Command::Help => self.view.show_message(command::HELP),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn resolve(&mut self, selector: &Selector) -> Option<AudioFileRef> {
        let found = match selector {
            Selector::Index(n) => n.checked_sub(1).and_then(|i| self.shown.get(i)),
            Selector::Name(name) => {
                let name = name.to_lowercase();
                self.shown
                    .iter()
                    .find(|f| f.name().to_lowercase() == name)
                    .or_else(|| {
                        self.shown
                            .iter()
                            .find(|f| f.name().to_lowercase().contains(&name))
                    })
            }
        };

        let found = found.cloned();
        if found.is_none() {
            self.view.show_message("No such file in the list");
        }
        found
    }

    // === Library ===

    fn refresh_listing(&mut self) {
        self.listing = self.library.list();
        self.show_listing();
    }

    fn show_listing(&mut self) {
        self.shown = filter_files(self.listing.files(), &self.query);
        self.view.show_files(&self.listing, &self.shown);
    }

    fn select_folder(&mut self, folder: PathBuf) {
        if !folder.is_dir() {
            self.view
                .show_message(&format!("Not a folder: {}", folder.display()));
            return;
        }

        tracing::info!("Audio folder set to {:?}", folder);
        self.library.set_folder(folder.clone());
        self.config.library.folder = Some(folder);

        if let Some(path) = &self.config_path {
            if let Err(e) = config::save_config(&self.config, path) {
                tracing::warn!("Failed to save folder selection: {}", e);
            }
        }

        self.refresh_listing();
    }

    // === Playback ===

    fn play(&mut self, file: AudioFileRef) {
        let previous = self.playback.current_file().cloned();

        match self.playback.play(&file) {
            Ok(event) => self.apply_playback_event(event),
            Err(e) => {
                tracing::warn!("Playback of {} failed ({:?}): {}", file, e.kind(), e);
                if let Some(previous) = previous.filter(|p| p != &file) {
                    self.view.show_play_state(&previous, &PlayVisual::Idle);
                }
                self.view
                    .show_play_state(&file, &PlayVisual::Error(e.to_string()));
                let delay = self.config.feedback.error();
                self.flash(FlashTarget::Play(file.path().to_path_buf()), delay);
            }
        }
    }

    fn apply_playback_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Started { file, replaced } => {
                if let Some(replaced) = replaced.filter(|r| r != &file) {
                    self.view.show_play_state(&replaced, &PlayVisual::Idle);
                }
                // a pending error/launch flash must not reset a live button
                self.cancel_flash(&FlashTarget::Play(file.path().to_path_buf()));
                self.view.show_play_state(&file, &PlayVisual::Playing);
            }
            PlaybackEvent::Paused(file) => self.view.show_play_state(&file, &PlayVisual::Paused),
            PlaybackEvent::Resumed(file) => {
                self.view.show_play_state(&file, &PlayVisual::Playing)
            }
            PlaybackEvent::Launched { file, replaced } => {
                if let Some(replaced) = replaced {
                    self.view.show_play_state(&replaced, &PlayVisual::Idle);
                }
                self.view.show_play_state(&file, &PlayVisual::Launched);
                let delay = self.config.feedback.launched();
                self.flash(FlashTarget::Play(file.path().to_path_buf()), delay);
            }
            PlaybackEvent::Stopped(file) | PlaybackEvent::Finished(file) => {
                self.view.show_play_state(&file, &PlayVisual::Idle)
            }
        }
    }

    /// Apply an end-of-stream notification
    pub fn handle_finished(&mut self, session: SessionId) {
        if let Some(event) = self.playback.handle_finished(session) {
            self.apply_playback_event(event);
        }
    }

    // === Clipboard ===

    async fn copy(&mut self, file: AudioFileRef) {
        match clipboard::copy_file(&self.clipboard, &file).await {
            Ok(()) => {
                self.view.show_copied(&file, true);
                let delay = self.config.feedback.copied();
                self.flash(FlashTarget::Copied(file.path().to_path_buf()), delay);
            }
            Err(e) => {
                tracing::warn!("Failed to copy {}: {}", file, e);
                self.view.show_message(&e.to_string());
            }
        }
    }

    // === Hotkey ===

    /// Apply a global hotkey press
    pub fn handle_hotkey(&mut self, id: u32) {
        if self.hotkeys.owns_event(id) {
            self.toggle_visibility();
        } else {
            tracing::trace!("Ignoring hotkey event {}", id);
        }
    }

    fn toggle_visibility(&mut self) {
        let change = self.visibility.toggle();
        tracing::debug!("Visibility: {:?}", change);
        self.view.set_visibility(change);
    }

    fn begin_capture(&mut self) {
        if !self.config.hotkey.enabled {
            self.view.show_message("Global hotkey is disabled in config");
            return;
        }
        if !self.hotkeys.is_available() {
            self.view
                .show_message("Global hotkey unavailable on this desktop");
            return;
        }
        if self.capture.is_some() {
            return;
        }

        self.cancel_flash(&FlashTarget::Hotkey);
        self.capture = Some(KeyCapture::begin(self.hotkeys.binding()));
        self.view.show_hotkey(&HotkeyDisplay::Capturing);
    }

    fn handle_capture_line(&mut self, line: &str) {
        let presses = match command::parse_key_chord(line) {
            Ok(presses) => presses,
            Err(e) => {
                self.view.show_message(&e.to_string());
                return;
            }
        };

        for press in presses {
            let Some(capture) = self.capture.as_mut() else {
                break;
            };
            match capture.handle(press) {
                CaptureStep::Pending => {}
                CaptureStep::Finished(outcome) => {
                    self.capture = None;
                    self.finish_capture(outcome);
                }
                CaptureStep::Inactive => self.capture = None,
            }
        }
    }

    fn finish_capture(&mut self, outcome: CaptureOutcome) {
        let failure = self.config.feedback.rebind_failure();

        match outcome {
            CaptureOutcome::Cancelled => {
                self.view
                    .show_hotkey(&HotkeyDisplay::Binding(self.hotkeys.binding()));
            }
            CaptureOutcome::Rejected(_) => {
                self.view.show_hotkey(&HotkeyDisplay::Rejected);
                self.flash(FlashTarget::Hotkey, failure);
            }
            CaptureOutcome::Candidate(candidate) => match self.hotkeys.rebind(candidate) {
                Ok(binding) => {
                    self.view.show_hotkey(&HotkeyDisplay::Saved(binding));
                    let delay = self.config.feedback.rebind_success();
                    self.flash(FlashTarget::Hotkey, delay);
                }
                Err(HotkeyError::RegistrationLost(previous)) => {
                    tracing::error!("No global hotkey active (lost {})", previous);
                    self.view.show_hotkey(&HotkeyDisplay::Lost);
                    self.flash(FlashTarget::Hotkey, failure);
                }
                Err(e) => {
                    tracing::warn!("Rebind to {} failed: {}", candidate, e);
                    self.view.show_hotkey(&HotkeyDisplay::Conflict);
                    self.flash(FlashTarget::Hotkey, failure);
                }
            },
        }
    }

    // === Flashes ===

    fn cancel_flash(&mut self, target: &FlashTarget) {
        self.generations.remove(target);
    }

    /// Revert `target` to its resting visual after `delay`
    fn flash(&mut self, target: FlashTarget, delay: Duration) {
        // one counter for every target, so numbers are never reused
        self.next_generation += 1;
        let generation = self.next_generation;
        self.generations.insert(target.clone(), generation);
        let tx = self.flash_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Reversion { target, generation });
        });
    }

    /// Apply a flash timer expiry
    pub fn handle_reversion(&mut self, reversion: Reversion) {
        if self.generations.get(&reversion.target) != Some(&reversion.generation) {
            tracing::trace!("Dropping superseded reversion {:?}", reversion.target);
            return;
        }
        self.generations.remove(&reversion.target);

        match reversion.target {
            FlashTarget::Play(path) => {
                let file = AudioFileRef::new(path);
                if self.playback.current_file() != Some(&file) {
                    self.view.show_play_state(&file, &PlayVisual::Idle);
                }
            }
            FlashTarget::Copied(path) => {
                self.view.show_copied(&AudioFileRef::new(path), false);
            }
            FlashTarget::Hotkey => {
                if self.capture.is_none() {
                    self.view
                        .show_hotkey(&HotkeyDisplay::Binding(self.hotkeys.binding()));
                }
            }
        }
    }
}
