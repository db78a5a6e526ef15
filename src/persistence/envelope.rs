//! Versioned save envelope
//!
//! The game state is serialized to a JSON payload and wrapped with a format
//! version and a SHA-256 digest of the payload. Decoding checks the version,
//! then the digest, then the state invariants.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::validation::validate_state;
use crate::sim::GameState;

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

/// Domain prefix mixed into every digest
const DIGEST_PREFIX: &[u8] = b"BLASTSAVEv1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub version: u32,
    /// Summary fields so save lists can be shown without decoding the payload
    pub level: u32,
    pub score: u64,
    /// Hex SHA-256 of the payload
    pub digest: String,
    /// Serialized `GameState`
    pub payload: String,
}

/// Hex SHA-256 of a payload
pub fn payload_digest(payload: &str) -> String {
    let mut h = Sha256::new();
    h.update(DIGEST_PREFIX);
    h.update(payload.as_bytes());
    hex::encode(h.finalize())
}

impl SaveEnvelope {
    pub fn wrap(state: &GameState) -> Result<Self> {
        let payload = serde_json::to_string(state).context("failed to serialize game state")?;
        Ok(Self {
            version: SAVE_VERSION,
            level: state.level,
            score: state.score(),
            digest: payload_digest(&payload),
            payload,
        })
    }

    pub fn unwrap_state(&self) -> Result<GameState> {
        if self.version != SAVE_VERSION {
            bail!(
                "unsupported save version {} (expected {})",
                self.version,
                SAVE_VERSION
            );
        }
        if payload_digest(&self.payload) != self.digest {
            bail!("save digest mismatch, file is corrupt");
        }
        let mut state: GameState =
            serde_json::from_str(&self.payload).context("invalid game state payload")?;
        validate_state(&state).context("save failed validation")?;
        state.normalize_order();
        Ok(state)
    }
}

/// Serialize a state into envelope JSON
pub fn encode(state: &GameState) -> Result<String> {
    let envelope = SaveEnvelope::wrap(state)?;
    serde_json::to_string_pretty(&envelope).context("failed to serialize save envelope")
}

/// Parse envelope JSON back into a validated state
pub fn decode(json: &str) -> Result<GameState> {
    let envelope: SaveEnvelope = serde_json::from_str(json).context("invalid save envelope")?;
    envelope.unwrap_state().inspect_err(|err| {
        log::warn!("rejected save for level {}: {err:#}", envelope.level);
    })
}
