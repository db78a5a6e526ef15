//! Data-driven game balance
//!
//! Every gameplay number the simulation reads lives here so that difficulty
//! presets and JSON overrides can reshape the game without code changes.

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::sim::powerup::{DEFAULT_WEIGHTS, PowerUpKind, PowerUpWeight};

/// Gameplay tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Ball ===
    /// Base speed every ball velocity is normalized to (px/s)
    pub ball_speed: f32,
    pub ball_radius: f32,
    /// Maximum horizontal component of a launch direction (vertical is -1)
    pub launch_spread: f32,
    /// Maximum paddle bounce angle from vertical (degrees)
    pub max_bounce_angle_deg: f32,

    // === Paddle ===
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_speed: f32,
    pub paddle_min_width: f32,
    pub paddle_max_width: f32,

    // === Laser ===
    pub laser_cooldown: f32,
    pub bullet_speed: f32,
    pub bullet_width: f32,
    pub bullet_height: f32,

    // === Scoring ===
    pub destroy_score: u32,
    pub chip_score: u32,
    pub boss_hit_score: u32,
    pub boss_defeat_score: u32,
    pub starting_lives: u8,

    // === Power-ups ===
    pub powerup_spawn_chance: f32,
    pub powerup_fall_speed: f32,
    pub powerup_size: f32,
    pub powerup_weights: Vec<PowerUpWeight>,
    pub expand_factor: f32,
    pub shrink_factor: f32,
    pub tiny_factor: f32,
    pub slow_factor: f32,
    pub fast_factor: f32,
    pub score_factor: f32,
    pub expand_secs: f32,
    pub shrink_secs: f32,
    pub tiny_secs: f32,
    pub slow_secs: f32,
    pub fast_secs: f32,
    pub double_score_secs: f32,
    pub laser_secs: f32,
    pub fireball_secs: f32,
    /// Multi-ball split angle from vertical (degrees)
    pub multiball_spread_deg: f32,

    // === Explosions ===
    /// Fraction of brick size allowed as grid misalignment
    pub explosion_tolerance: f32,
    /// Cardinal blast reach in cells
    pub explosion_reach: u32,
    pub explosion_shake: f32,
    pub explosion_flash: f32,

    // === Boss ===
    pub boss_width: f32,
    pub boss_height: f32,
    pub boss_health: u32,
    pub boss_speed: f32,
    pub boss_shoot_interval: f32,
    pub boss_bullet_speed: f32,
    pub boss_ball_damage: u32,
    pub boss_bullet_damage: u32,

    // === Transitions ===
    pub shockwave_speed: f32,
    pub shockwave_thickness: f32,
    pub portal_pull: f32,
    pub portal_drift: f32,
    pub portal_capture_radius: f32,
    pub portal_flash_secs: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ball_speed: 360.0,
            ball_radius: 8.0,
            launch_spread: 0.5,
            max_bounce_angle_deg: 75.0,

            paddle_width: 110.0,
            paddle_height: 16.0,
            paddle_speed: 620.0,
            paddle_min_width: 48.0,
            paddle_max_width: 260.0,

            laser_cooldown: 0.25,
            bullet_speed: 720.0,
            bullet_width: 4.0,
            bullet_height: 14.0,

            destroy_score: 100,
            chip_score: 10,
            boss_hit_score: 50,
            boss_defeat_score: 1000,
            starting_lives: 3,

            powerup_spawn_chance: 0.3,
            powerup_fall_speed: 140.0,
            powerup_size: 22.0,
            powerup_weights: DEFAULT_WEIGHTS
                .iter()
                .map(|&(kind, weight)| PowerUpWeight { kind, weight })
                .collect(),
            expand_factor: 1.5,
            shrink_factor: 0.6,
            tiny_factor: 0.5,
            slow_factor: 0.6,
            fast_factor: 1.4,
            score_factor: 2.0,
            expand_secs: 10.0,
            shrink_secs: 8.0,
            tiny_secs: 8.0,
            slow_secs: 10.0,
            fast_secs: 8.0,
            double_score_secs: 15.0,
            laser_secs: 10.0,
            fireball_secs: 6.0,
            multiball_spread_deg: 20.0,

            explosion_tolerance: 0.6,
            explosion_reach: 2,
            explosion_shake: 0.5,
            explosion_flash: 0.8,

            boss_width: 160.0,
            boss_height: 48.0,
            boss_health: 30,
            boss_speed: 120.0,
            boss_shoot_interval: 1.6,
            boss_bullet_speed: 260.0,
            boss_ball_damage: 1,
            boss_bullet_damage: 1,

            shockwave_speed: 650.0,
            shockwave_thickness: 40.0,
            portal_pull: 60_000.0,
            portal_drift: 120.0,
            portal_capture_radius: 18.0,
            portal_flash_secs: 0.6,
        }
    }
}

impl Tuning {
    /// Parse tuning overrides from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Self = serde_json::from_str(json).context("invalid tuning JSON")?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize tuning")
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(self.ball_speed > 0.0, "ball_speed must be positive");
        ensure!(self.ball_radius > 0.0, "ball_radius must be positive");
        ensure!(
            self.paddle_min_width > 0.0 && self.paddle_min_width <= self.paddle_max_width,
            "paddle width bounds are inverted"
        );
        ensure!(
            (0.0..=1.0).contains(&self.powerup_spawn_chance),
            "powerup_spawn_chance must be within [0, 1]"
        );
        ensure!(
            !self.powerup_weights.is_empty() && self.powerup_weights.iter().all(|w| w.weight > 0),
            "power-up weights must be non-empty and positive"
        );
        ensure!(self.boss_health > 0, "boss_health must be positive");
        Ok(())
    }

    /// Duration of a timed power-up, `None` for instantaneous kinds
    pub fn effect_secs(&self, kind: PowerUpKind) -> Option<f32> {
        match kind {
            PowerUpKind::ExpandPaddle => Some(self.expand_secs),
            PowerUpKind::ShrinkPaddle => Some(self.shrink_secs),
            PowerUpKind::TinyBall => Some(self.tiny_secs),
            PowerUpKind::SlowBall => Some(self.slow_secs),
            PowerUpKind::FastBall => Some(self.fast_secs),
            PowerUpKind::DoubleScore => Some(self.double_score_secs),
            PowerUpKind::Laser => Some(self.laser_secs),
            PowerUpKind::Fireball => Some(self.fireball_secs),
            PowerUpKind::ExtraLife
            | PowerUpKind::MultiBall
            | PowerUpKind::Barrier
            | PowerUpKind::Weaken
            | PowerUpKind::NextLevel => None,
        }
    }
}
