#![deny(warnings)]

//! Persistence layer: JSON snapshots of the player aggregate.
//!
//! The snapshot is the whole [`Player`] aggregate, every field, written as
//! pretty JSON and losslessly round-trippable. Loading validates the aggregate
//! before handing it back, so a tampered or truncated save surfaces as an
//! error rather than a corrupt session.

use anyhow::{Context, Result};
use sim_core::{validate_player, Player};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default location for local saves.
pub fn default_save_path() -> PathBuf {
    PathBuf::from("./saves/fortune.json")
}

/// Whether a snapshot exists at the path.
pub fn has_snapshot(path: &Path) -> bool {
    path.is_file()
}

/// Write the player snapshot, creating parent directories as needed.
pub fn save_snapshot(path: &Path, player: &Player) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating save directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(player).context("serializing snapshot")?;
    std::fs::write(path, json)
        .with_context(|| format!("writing snapshot to {}", path.display()))?;
    info!(path = %path.display(), age = player.age, "snapshot saved");
    Ok(())
}

/// Read a snapshot back and validate it.
pub fn load_snapshot(path: &Path) -> Result<Player> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot from {}", path.display()))?;
    let player: Player = serde_json::from_str(&json).context("parsing snapshot")?;
    validate_player(&player).context("validating snapshot")?;
    info!(path = %path.display(), age = player.age, "snapshot loaded");
    Ok(player)
}
