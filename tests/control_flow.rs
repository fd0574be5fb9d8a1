//! Integration tests for the daemon's control flow
//!
//! The daemon is driven through its public API with fake audio, launcher,
//! registrar and view implementations, so no sound device, desktop session
//! or hotkey manager is needed.

use audio_overlay::clipboard::FileClipboard;
use audio_overlay::config::Config;
use audio_overlay::daemon::{Daemon, Flow};
use audio_overlay::error::{ClipboardError, HotkeyError, PlaybackError};
use audio_overlay::hotkey::{HotkeyBinding, HotkeyRegistrar, KeyCode, Modifiers};
use audio_overlay::library::{AudioFileRef, Listing};
use audio_overlay::playback::{
    ActiveStream, AudioBackend, CompletionSignal, DecodeStrategy, ExternalLauncher,
};
use audio_overlay::state::{PlayVisual, PlaybackState};
use audio_overlay::view::{HotkeyDisplay, OverlayView};
use audio_overlay::visibility::VisibilityChange;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

type Log = Arc<Mutex<Vec<String>>>;

struct FakeStream {
    name: String,
    log: Log,
}

impl ActiveStream for FakeStream {
    fn pause(&self) {
        self.log.lock().unwrap().push(format!("pause {}", self.name));
    }

    fn resume(&self) {
        self.log.lock().unwrap().push(format!("resume {}", self.name));
    }

    fn stop(&self) {
        self.log.lock().unwrap().push(format!("stop {}", self.name));
    }
}

#[derive(Clone, Default)]
struct FakeBackend {
    log: Log,
    signals: Arc<Mutex<Vec<CompletionSignal>>>,
}

impl AudioBackend for FakeBackend {
    fn open(
        &mut self,
        file: &AudioFileRef,
        strategy: DecodeStrategy,
        done: CompletionSignal,
    ) -> Result<Box<dyn ActiveStream>, PlaybackError> {
        if file.name().starts_with("broken") {
            return Err(PlaybackError::decode(file.path(), "not audio"));
        }
        self.log
            .lock()
            .unwrap()
            .push(format!("open {} {:?}", file.name(), strategy));
        self.signals.lock().unwrap().push(done);
        Ok(Box::new(FakeStream {
            name: file.name().to_string(),
            log: self.log.clone(),
        }))
    }
}

#[derive(Clone, Default)]
struct FakeLauncher {
    log: Log,
}

impl ExternalLauncher for FakeLauncher {
    fn launch(&self, file: &AudioFileRef) -> Result<(), PlaybackError> {
        self.log.lock().unwrap().push(format!("launch {}", file.name()));
        Ok(())
    }
}

/// Registrar where `claimed` bindings belong to another program
#[derive(Default)]
struct FakeRegistrar {
    claimed: Arc<Mutex<HashSet<HotkeyBinding>>>,
    registered: Option<HotkeyBinding>,
}

impl HotkeyRegistrar for FakeRegistrar {
    fn register(&mut self, binding: &HotkeyBinding) -> Result<(), HotkeyError> {
        if self.claimed.lock().unwrap().contains(binding) {
            return Err(HotkeyError::RegistrationConflict(binding.to_string()));
        }
        self.registered = Some(*binding);
        Ok(())
    }

    fn unregister(&mut self) -> Result<(), HotkeyError> {
        self.registered = None;
        Ok(())
    }

    fn owns_event(&self, id: u32) -> bool {
        self.registered.is_some() && id == 7
    }
}

struct NoClipboard;

#[async_trait::async_trait]
impl FileClipboard for NoClipboard {
    async fn copy(&self, _uri_list: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::ToolNotFound("none"))
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Shown {
    Files(Vec<String>),
    Play(String, PlayVisual),
    Copied(String, bool),
    Hotkey(HotkeyDisplay),
    Visibility(VisibilityChange),
    Message(String),
}

#[derive(Default)]
struct RecordingView {
    shown: Vec<Shown>,
}

impl RecordingView {
    fn last_play(&self, name: &str) -> Option<&PlayVisual> {
        self.shown.iter().rev().find_map(|s| match s {
            Shown::Play(n, visual) if n == name => Some(visual),
            _ => None,
        })
    }

    fn last_hotkey(&self) -> Option<&HotkeyDisplay> {
        self.shown.iter().rev().find_map(|s| match s {
            Shown::Hotkey(display) => Some(display),
            _ => None,
        })
    }

    fn last_files(&self) -> Option<&Vec<String>> {
        self.shown.iter().rev().find_map(|s| match s {
            Shown::Files(files) => Some(files),
            _ => None,
        })
    }
}

impl OverlayView for RecordingView {
    fn show_files(&mut self, _listing: &Listing, files: &[AudioFileRef]) {
        self.shown.push(Shown::Files(
            files.iter().map(|f| f.name().to_string()).collect(),
        ));
    }

    fn show_play_state(&mut self, file: &AudioFileRef, visual: &PlayVisual) {
        self.shown
            .push(Shown::Play(file.name().to_string(), visual.clone()));
    }

    fn show_copied(&mut self, file: &AudioFileRef, highlighted: bool) {
        self.shown
            .push(Shown::Copied(file.name().to_string(), highlighted));
    }

    fn show_hotkey(&mut self, display: &HotkeyDisplay) {
        self.shown.push(Shown::Hotkey(display.clone()));
    }

    fn set_visibility(&mut self, change: VisibilityChange) {
        self.shown.push(Shown::Visibility(change));
    }

    fn show_message(&mut self, message: &str) {
        self.shown.push(Shown::Message(message.to_string()));
    }
}

type TestDaemon = Daemon<FakeBackend, FakeLauncher, FakeRegistrar, RecordingView>;

struct Harness {
    dir: TempDir,
    backend: FakeBackend,
    launcher: FakeLauncher,
    claimed: Arc<Mutex<HashSet<HotkeyBinding>>>,
    daemon: TestDaemon,
}

fn sound_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in ["airhorn.wav", "beep.ogg", "chime.opus", "broken.mp3", "notes.txt"] {
        std::fs::write(dir.path().join(name), b"data").unwrap();
    }
    dir
}

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.library.folder = Some(dir.path().to_path_buf());
    config.hotkey.store = dir.path().join("hotkey.txt").display().to_string();
    config.feedback.launched_ms = 20;
    config.feedback.error_ms = 20;
    config.feedback.rebind_success_ms = 20;
    config.feedback.rebind_failure_ms = 20;
    config.feedback.copied_ms = 20;
    config
}

fn harness_with(claimed: &[HotkeyBinding]) -> Harness {
    let dir = sound_dir();
    let config = test_config(&dir);

    let backend = FakeBackend::default();
    let launcher = FakeLauncher::default();
    let claimed = Arc::new(Mutex::new(claimed.iter().copied().collect()));
    let registrar = FakeRegistrar {
        claimed: claimed.clone(),
        registered: None,
    };

    let daemon = Daemon::new(
        config,
        backend.clone(),
        launcher.clone(),
        registrar,
        RecordingView::default(),
        vec![Box::new(NoClipboard)],
    );

    Harness {
        dir,
        backend,
        launcher,
        claimed,
        daemon,
    }
}

fn harness() -> Harness {
    harness_with(&[])
}

fn ctrl_alt(key: char) -> HotkeyBinding {
    HotkeyBinding::new(Modifiers::CTRL | Modifiers::ALT, KeyCode(key as u32))
}

#[tokio::test]
async fn test_startup_lists_audio_files_and_registers_hotkey() {
    let mut h = harness();
    h.daemon.start();

    let view = h.daemon.view();
    assert_eq!(
        view.last_files().unwrap(),
        &vec!["airhorn.wav", "beep.ogg", "broken.mp3", "chime.opus"]
    );
    assert_eq!(
        view.last_hotkey(),
        Some(&HotkeyDisplay::Binding(HotkeyBinding::default()))
    );
    assert_eq!(h.daemon.hotkeys().active(), Some(HotkeyBinding::default()));
}

#[tokio::test]
async fn test_switching_files_releases_previous_session_first() {
    let mut h = harness();
    h.daemon.start();

    h.daemon.handle_line("play airhorn").await;
    h.daemon.handle_line("play beep").await;

    assert_eq!(
        *h.backend.log.lock().unwrap(),
        vec!["open airhorn.wav Direct", "stop airhorn.wav", "open beep.ogg Vorbis"]
    );
    let view = h.daemon.view();
    assert_eq!(view.last_play("airhorn.wav"), Some(&PlayVisual::Idle));
    assert_eq!(view.last_play("beep.ogg"), Some(&PlayVisual::Playing));
}

#[tokio::test]
async fn test_same_file_pauses_and_resumes() {
    let mut h = harness();
    h.daemon.start();

    h.daemon.handle_line("play 1").await;
    h.daemon.handle_line("play 1").await;
    assert_eq!(h.daemon.playback().state(), PlaybackState::Paused);
    assert_eq!(h.daemon.view().last_play("airhorn.wav"), Some(&PlayVisual::Paused));

    h.daemon.handle_line("play 1").await;
    assert_eq!(h.daemon.playback().state(), PlaybackState::Playing);
    assert_eq!(
        *h.backend.log.lock().unwrap(),
        vec!["open airhorn.wav Direct", "pause airhorn.wav", "resume airhorn.wav"]
    );
}

#[tokio::test]
async fn test_stale_end_of_stream_is_ignored() {
    let mut h = harness();
    h.daemon.start();

    h.daemon.handle_line("play airhorn").await;
    h.daemon.handle_line("play beep").await;

    let signals: Vec<CompletionSignal> = h.backend.signals.lock().unwrap().drain(..).collect();
    let first = signals[0].session();
    let second = signals[1].session();

    h.daemon.handle_finished(first);
    assert_eq!(h.daemon.playback().state(), PlaybackState::Playing);
    assert_eq!(h.daemon.view().last_play("beep.ogg"), Some(&PlayVisual::Playing));

    h.daemon.handle_finished(second);
    assert_eq!(h.daemon.playback().state(), PlaybackState::Idle);
    assert_eq!(h.daemon.view().last_play("beep.ogg"), Some(&PlayVisual::Idle));
}

#[tokio::test]
async fn test_external_format_is_launched_not_decoded() {
    let mut h = harness();
    h.daemon.start();

    h.daemon.handle_line("play airhorn").await;
    h.daemon.handle_line("play chime").await;

    assert_eq!(*h.launcher.log.lock().unwrap(), vec!["launch chime.opus"]);
    assert_eq!(
        *h.backend.log.lock().unwrap(),
        vec!["open airhorn.wav Direct", "stop airhorn.wav"]
    );
    let view = h.daemon.view();
    assert_eq!(view.last_play("airhorn.wav"), Some(&PlayVisual::Idle));
    assert_eq!(view.last_play("chime.opus"), Some(&PlayVisual::Launched));
    assert_eq!(h.daemon.playback().state(), PlaybackState::Idle);
}

#[tokio::test]
async fn test_decode_failure_shows_error_and_leaves_nothing_playing() {
    let mut h = harness();
    h.daemon.start();

    h.daemon.handle_line("play airhorn").await;
    h.daemon.handle_line("play broken").await;

    assert_eq!(h.daemon.playback().state(), PlaybackState::Idle);
    let view = h.daemon.view();
    assert_eq!(view.last_play("airhorn.wav"), Some(&PlayVisual::Idle));
    assert!(matches!(
        view.last_play("broken.mp3"),
        Some(PlayVisual::Error(_))
    ));
}

#[tokio::test]
async fn test_search_filters_displayed_files() {
    let mut h = harness();
    h.daemon.start();

    h.daemon.handle_line("search B").await;
    assert_eq!(h.daemon.shown_files().len(), 2);
    assert_eq!(
        h.daemon.view().last_files().unwrap(),
        &vec!["beep.ogg", "broken.mp3"]
    );

    // indices follow the filtered list
    h.daemon.handle_line("play 1").await;
    assert_eq!(
        h.daemon.playback().current_file().map(|f| f.name()),
        Some("beep.ogg")
    );

    h.daemon.handle_line("search").await;
    assert_eq!(h.daemon.shown_files().len(), 4);
}

#[tokio::test]
async fn test_unknown_selection_reports_message() {
    let mut h = harness();
    h.daemon.start();

    h.daemon.handle_line("play 9").await;
    assert_eq!(h.daemon.playback().state(), PlaybackState::Idle);
    assert!(matches!(
        h.daemon.view().shown.last(),
        Some(Shown::Message(_))
    ));
}

#[tokio::test]
async fn test_rebind_success_is_persisted() {
    let mut h = harness();
    h.daemon.start();

    h.daemon.handle_line("rebind").await;
    assert!(h.daemon.is_capturing());
    assert_eq!(h.daemon.view().last_hotkey(), Some(&HotkeyDisplay::Capturing));

    // modifier alone keeps waiting
    h.daemon.handle_line("ctrl").await;
    assert!(h.daemon.is_capturing());

    h.daemon.handle_line("ctrl+alt+k").await;
    assert!(!h.daemon.is_capturing());
    assert_eq!(h.daemon.hotkeys().active(), Some(ctrl_alt('K')));
    assert_eq!(
        h.daemon.view().last_hotkey(),
        Some(&HotkeyDisplay::Saved(ctrl_alt('K')))
    );

    let stored = std::fs::read_to_string(h.dir.path().join("hotkey.txt")).unwrap();
    assert_eq!(stored.trim(), "3,75");
}

#[tokio::test]
async fn test_rebind_conflict_keeps_previous_binding() {
    let mut h = harness_with(&[ctrl_alt('J')]);
    h.daemon.start();

    h.daemon.handle_line("rebind").await;
    h.daemon.handle_line("ctrl+alt+j").await;

    assert_eq!(h.daemon.hotkeys().active(), Some(HotkeyBinding::default()));
    assert_eq!(h.daemon.view().last_hotkey(), Some(&HotkeyDisplay::Conflict));
    assert!(!h.dir.path().join("hotkey.txt").exists());
}

#[tokio::test]
async fn test_rebind_reports_lost_when_previous_cannot_be_restored() {
    let mut h = harness();
    h.daemon.start();
    assert_eq!(h.daemon.hotkeys().active(), Some(HotkeyBinding::default()));

    // another program grabs both the candidate and our current binding
    h.claimed
        .lock()
        .unwrap()
        .extend([HotkeyBinding::default(), ctrl_alt('J')]);

    h.daemon.handle_line("rebind").await;
    h.daemon.handle_line("ctrl+alt+j").await;

    assert!(!h.daemon.is_capturing());
    assert_eq!(h.daemon.view().last_hotkey(), Some(&HotkeyDisplay::Lost));
    assert_eq!(h.daemon.hotkeys().active(), None);
    assert!(!h.dir.path().join("hotkey.txt").exists());
}

#[tokio::test]
async fn test_missing_hotkey_manager_is_not_reported_as_disabled() {
    let dir = sound_dir();
    let mut daemon: Daemon<FakeBackend, FakeLauncher, Option<FakeRegistrar>, RecordingView> =
        Daemon::new(
            test_config(&dir),
            FakeBackend::default(),
            FakeLauncher::default(),
            None,
            RecordingView::default(),
            vec![Box::new(NoClipboard)],
        );
    daemon.start();

    let messages = |view: &RecordingView| -> Vec<String> {
        view.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Message(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    };

    let shown = messages(daemon.view());
    assert!(shown.iter().any(|m| m.contains("unavailable")));
    assert!(!shown.iter().any(|m| m.contains("disabled")));
    assert_eq!(
        daemon.view().last_hotkey(),
        Some(&HotkeyDisplay::Binding(HotkeyBinding::default()))
    );
    assert_eq!(daemon.hotkeys().active(), None);

    daemon.handle_line("rebind").await;
    assert!(!daemon.is_capturing());
    let shown = messages(daemon.view());
    assert!(shown.last().unwrap().contains("unavailable"));
    assert!(!shown.iter().any(|m| m.contains("disabled")));
}

#[tokio::test]
async fn test_capture_without_modifier_is_rejected() {
    let mut h = harness();
    h.daemon.start();

    h.daemon.handle_line("rebind").await;
    h.daemon.handle_line("k").await;

    assert!(!h.daemon.is_capturing());
    assert_eq!(h.daemon.view().last_hotkey(), Some(&HotkeyDisplay::Rejected));
    assert_eq!(h.daemon.hotkeys().active(), Some(HotkeyBinding::default()));
}

#[tokio::test]
async fn test_escape_cancels_capture() {
    let mut h = harness();
    h.daemon.start();

    h.daemon.handle_line("rebind").await;
    h.daemon.handle_line("escape").await;

    assert!(!h.daemon.is_capturing());
    assert_eq!(
        h.daemon.view().last_hotkey(),
        Some(&HotkeyDisplay::Binding(HotkeyBinding::default()))
    );
}

#[tokio::test]
async fn test_commands_are_not_run_during_capture() {
    let mut h = harness();
    h.daemon.start();

    h.daemon.handle_line("rebind").await;
    assert_eq!(h.daemon.handle_line("quit").await, Flow::Continue);
    assert!(h.daemon.is_capturing());
    assert_eq!(h.daemon.playback().state(), PlaybackState::Idle);
}

#[tokio::test]
async fn test_hotkey_event_toggles_visibility() {
    let mut h = harness();
    h.daemon.start();
    assert!(h.daemon.is_visible());

    h.daemon.handle_hotkey(7);
    assert!(!h.daemon.is_visible());
    h.daemon.handle_hotkey(99);
    assert!(!h.daemon.is_visible());
    h.daemon.handle_hotkey(7);
    assert!(h.daemon.is_visible());

    let changes: Vec<_> = h
        .daemon
        .view()
        .shown
        .iter()
        .filter(|s| matches!(s, Shown::Visibility(_)))
        .cloned()
        .collect();
    assert_eq!(
        changes,
        vec![
            Shown::Visibility(VisibilityChange::Hidden),
            Shown::Visibility(VisibilityChange::ShownAndFocused),
        ]
    );
}

#[tokio::test]
async fn test_copy_failure_is_reported() {
    let mut h = harness();
    h.daemon.start();

    h.daemon.handle_line("copy airhorn").await;
    let view = h.daemon.view();
    assert!(!view.shown.iter().any(|s| matches!(s, Shown::Copied(_, true))));
    assert!(matches!(view.shown.last(), Some(Shown::Message(_))));
}

#[tokio::test]
async fn test_run_loop_reverts_launch_indicator_and_stops_on_quit() {
    let mut h = harness();
    let (line_tx, line_rx) = mpsc::channel(8);
    let (_hotkey_tx, hotkey_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        line_tx.send("play chime".to_string()).await.unwrap();
        line_tx.send("play airhorn".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        line_tx.send("quit".to_string()).await.unwrap();
    });

    h.daemon.run(line_rx, hotkey_rx).await.unwrap();

    let view = h.daemon.view();
    let chime: Vec<_> = view
        .shown
        .iter()
        .filter_map(|s| match s {
            Shown::Play(name, visual) if name == "chime.opus" => Some(visual.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(chime, vec![PlayVisual::Launched, PlayVisual::Idle]);

    // shutdown stops the live session and releases the hotkey
    assert_eq!(view.last_play("airhorn.wav"), Some(&PlayVisual::Idle));
    assert_eq!(h.daemon.hotkeys().active(), None);

    // the launch indicator's timer fired and the pending entry is gone
    assert_eq!(h.daemon.pending_flashes(), 0);
}
