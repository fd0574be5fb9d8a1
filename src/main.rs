//! Audio Overlay - hotkey-toggled audition board for audio clips
//!
//! Run with `audio-overlay` or `audio-overlay run` to start the overlay.
//! Use `audio-overlay list` to print the folder contents.
//! Use `audio-overlay play <file>` to play a single file.

use audio_overlay::cli::{Cli, Commands};
use audio_overlay::config::{self, Config};
use audio_overlay::hotkey::global::{self, GlobalRegistrar};
use audio_overlay::hotkey::store::BindingStore;
use audio_overlay::hotkey::HotkeyBinding;
use audio_overlay::library::{filter_files, Library, Listing};
use audio_overlay::playback::launcher::SystemLauncher;
use audio_overlay::playback::rodio_backend::RodioBackend;
use audio_overlay::playback::{PlaybackController, PlaybackEvent};
use audio_overlay::view::ConsoleView;
use audio_overlay::{clipboard, AudioFileRef, Daemon};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("audio_overlay={},warn", log_level))),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;
    let config_path = cli.config.clone().or_else(Config::default_path);

    // Apply CLI overrides
    if let Some(folder) = cli.folder {
        config.library.folder = Some(folder);
    }
    if let Some(volume) = cli.volume {
        config.playback.volume = volume.clamp(0.0, 2.0);
    }
    if cli.no_hotkey {
        config.hotkey.enabled = false;
    }

    // Run the appropriate command
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_overlay(config, config_path).await?,

        Commands::List { filter } => list_files(&config, filter.as_deref()),

        Commands::Play { file } => play_file(&config, &file).await?,

        Commands::Hotkey { set } => hotkey_command(&config, set.as_deref())?,

        Commands::Config => show_config(&config, config_path.as_deref()),
    }

    Ok(())
}

/// Run the interactive overlay until quit or Ctrl+C
async fn run_overlay(config: Config, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (hotkey_tx, hotkey_rx) = mpsc::unbounded_channel();

    let registrar = if config.hotkey.enabled {
        match GlobalRegistrar::new() {
            Ok(registrar) => {
                global::spawn_event_forwarder(hotkey_tx)?;
                Some(registrar)
            }
            Err(e) => {
                tracing::warn!("Global hotkeys unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let (line_tx, line_rx) = mpsc::channel(32);
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line_tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });

    let backend = RodioBackend::new(config.playback.volume);
    let mut daemon = Daemon::new(
        config,
        backend,
        SystemLauncher,
        registrar,
        ConsoleView,
        clipboard::create_clipboard_chain(),
    )
    .with_config_path(config_path);

    println!("Type 'help' for commands.");
    daemon.run(line_rx, hotkey_rx).await?;
    Ok(())
}

/// Print the folder listing
fn list_files(config: &Config, filter: Option<&str>) {
    match Library::new(&config.library).list() {
        Listing::NoFolder => println!("No folder selected (use --folder or set [library] folder)"),
        Listing::Empty => println!("No audio files found"),
        listing => {
            let files = filter_files(listing.files(), filter.unwrap_or(""));
            if files.is_empty() {
                println!("No matching files");
            }
            for file in files {
                println!("{}", file.path().display());
            }
        }
    }
}

/// Play one file to the end (or hand it to the default player)
async fn play_file(config: &Config, path: &Path) -> anyhow::Result<()> {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let mut controller = PlaybackController::new(
        RodioBackend::new(config.playback.volume),
        SystemLauncher,
        config.playback.external_extensions.clone(),
        done_tx,
    );

    let file = AudioFileRef::new(path);
    match controller.play(&file)? {
        PlaybackEvent::Launched { .. } => {
            println!("Opened {} in the default player", file);
            return Ok(());
        }
        event => tracing::debug!("{:?}", event),
    }

    println!("Playing {} (Ctrl+C to stop)", file);
    loop {
        tokio::select! {
            Some(session) = done_rx.recv() => {
                if let Some(PlaybackEvent::Finished(_)) = controller.handle_finished(session) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                controller.stop();
                break;
            }
        }
    }

    Ok(())
}

/// Show or replace the persisted hotkey
fn hotkey_command(config: &Config, set: Option<&str>) -> anyhow::Result<()> {
    let store = BindingStore::new(config.resolve_binding_store());

    match set {
        Some(text) => {
            let binding: HotkeyBinding = text.parse()?;
            // reject keys the OS layer cannot register
            global::to_os_hotkey(&binding)?;
            store.save(&binding)?;
            println!("Hotkey set to {}", binding);
            println!("Restart the overlay to apply it.");
        }
        None => println!("{}", store.load()),
    }

    if let Some(path) = store.path() {
        tracing::debug!("Binding store: {:?}", path);
    }
    Ok(())
}

fn show_config(config: &Config, path: Option<&Path>) {
    println!("Current Configuration\n");
    println!("=====================\n");

    if let Some(path) = path {
        println!("# {}\n", path.display());
    }

    println!("[library]");
    println!("  folder = {:?}", config.library.folder);
    println!("  extensions = {:?}", config.library.extensions);

    println!("\n[playback]");
    println!("  volume = {}", config.playback.volume);
    println!(
        "  external_extensions = {:?}",
        config.playback.external_extensions
    );

    println!("\n[hotkey]");
    println!("  enabled = {}", config.hotkey.enabled);
    println!("  store = {:?}", config.hotkey.store);
    if let Some(store) = config.resolve_binding_store() {
        println!("  # binding file: {:?}", store);
    }

    println!("\n[feedback]");
    println!("  launched_ms = {}", config.feedback.launched_ms);
    println!("  error_ms = {}", config.feedback.error_ms);
    println!("  rebind_success_ms = {}", config.feedback.rebind_success_ms);
    println!("  rebind_failure_ms = {}", config.feedback.rebind_failure_ms);
    println!("  copied_ms = {}", config.feedback.copied_ms);
}
