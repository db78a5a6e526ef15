//! Blast Breaker - brick-breaker simulation core
//!
//! Core modules:
//! - `sim`: Per-frame physics and game rules (collisions, explosions, effects)
//! - `tuning`: Data-driven game balance
//! - `settings`: Difficulty presets and player preferences
//! - `persistence`: Versioned save envelope with validation
//! - `audio`: Event to sound cue bridge

pub mod audio;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{Difficulty, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Arena dimensions (origin top-left, y grows downward)
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 600.0;

    /// Top edge of the paddle
    pub const PADDLE_TOP: f32 = 560.0;
    /// Gap between a stuck ball and the paddle top
    pub const STUCK_BALL_GAP: f32 = 1.0;

    /// Spacing between neighbouring bricks in a level grid
    pub const BRICK_GAP_X: f32 = 8.0;
    pub const BRICK_GAP_Y: f32 = 6.0;
    pub const BRICK_WIDTH: f32 = 64.0;
    pub const BRICK_HEIGHT: f32 = 22.0;

    /// Barrier line sits just under the paddle
    pub const BARRIER_Y: f32 = 590.0;
}

/// Rescale a velocity to exactly `speed`, keeping its direction.
///
/// A zero vector has no direction, so it falls back to straight up.
#[inline]
pub fn renormalize(vel: Vec2, speed: f32) -> Vec2 {
    let dir = vel.normalize_or_zero();
    if dir == Vec2::ZERO {
        Vec2::new(0.0, -speed)
    } else {
        dir * speed
    }
}

/// Unit vector pointing `angle` radians away from straight up (positive = right)
#[inline]
pub fn upward_at(angle: f32) -> Vec2 {
    Vec2::new(angle.sin(), -angle.cos())
}
