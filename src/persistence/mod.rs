//! Save/load persistence with integrity verification
//!
//! Features:
//! - Versioned JSON envelope
//! - SHA-256 integrity digest
//! - Backup rotation (tmp -> save, old save -> backup)
//! - Corruption detection and recovery from the backup

pub mod envelope;
pub mod validation;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use envelope::{SAVE_VERSION, SaveEnvelope, decode, encode};
pub use validation::validate_state;

use crate::sim::GameState;

fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(ext);
    PathBuf::from(name)
}

/// Write a save, keeping the previous one as a backup
pub fn save_to_file(path: &Path, state: &GameState) -> Result<()> {
    let json = encode(state)?;
    let tmp = sibling(path, ".tmp");
    fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    if path.exists() {
        let backup = sibling(path, ".bak");
        fs::rename(path, &backup)
            .with_context(|| format!("failed to rotate {} to backup", path.display()))?;
    }
    fs::rename(&tmp, path).with_context(|| format!("failed to move save into {}", path.display()))?;
    log::info!("saved level {} to {}", state.level, path.display());
    Ok(())
}

fn load_one(path: &Path) -> Result<GameState> {
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    decode(&json).with_context(|| format!("failed to load {}", path.display()))
}

/// Load a save, falling back to the backup if the main file is bad
pub fn load_from_file(path: &Path) -> Result<GameState> {
    match load_one(path) {
        Ok(state) => Ok(state),
        Err(err) => {
            let backup = sibling(path, ".bak");
            if !backup.exists() {
                return Err(err);
            }
            log::warn!("{err:#}; trying backup {}", backup.display());
            load_one(&backup)
        }
    }
}
