//! Renders roff man pages for the CLI with clap_mangen.
//!
//! Pages are written when `AUDIO_OVERLAY_MAN_DIR` names a directory
//! (`cargo xtask man` sets it) and on release builds, which place them
//! under `$OUT_DIR/man`.

use clap::CommandFactory;
use clap_mangen::Man;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

include!("src/cli.rs");

const MAN_DIR_VAR: &str = "AUDIO_OVERLAY_MAN_DIR";

/// Where pages go for this build, if anywhere
fn target_dir() -> Option<PathBuf> {
    if let Some(dir) = env::var_os(MAN_DIR_VAR).filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    if env::var("PROFILE").as_deref() == Ok("release") {
        return env::var_os("OUT_DIR").map(|out| PathBuf::from(out).join("man"));
    }
    None
}

fn render(cmd: clap::Command, page: &str, dir: &Path) -> io::Result<()> {
    let mut buf = Vec::new();
    Man::new(cmd).render(&mut buf)?;
    fs::write(dir.join(format!("{}.1", page)), buf)
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-env-changed={}", MAN_DIR_VAR);

    let Some(dir) = target_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&dir)?;

    let cli = Cli::command();
    let bin = cli.get_name().to_string();

    let pages: Vec<(String, clap::Command)> = cli
        .get_subcommands()
        .filter(|sub| !sub.is_hide_set() && sub.get_name() != "help")
        .map(|sub| (format!("{}-{}", bin, sub.get_name()), sub.clone()))
        .collect();

    render(cli, &bin, &dir)?;
    for (page, sub) in pages {
        render(sub, &page, &dir)?;
    }

    println!("cargo:warning=man pages written to {}", dir.display());
    Ok(())
}
