//! Power-up kinds and weighted spawn selection

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geom::Rect;

/// Every collectible power-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    ExpandPaddle,
    ShrinkPaddle,
    TinyBall,
    SlowBall,
    FastBall,
    DoubleScore,
    Laser,
    Fireball,
    ExtraLife,
    MultiBall,
    Barrier,
    Weaken,
    NextLevel,
}

/// State a timed power-up mutates; two kinds sharing a field interact on expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectField {
    PaddleWidth,
    BallRadius,
    BallSpeed,
    BallFireball,
    ScoreMultiplier,
    Laser,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 13] = [
        PowerUpKind::ExpandPaddle,
        PowerUpKind::ShrinkPaddle,
        PowerUpKind::TinyBall,
        PowerUpKind::SlowBall,
        PowerUpKind::FastBall,
        PowerUpKind::DoubleScore,
        PowerUpKind::Laser,
        PowerUpKind::Fireball,
        PowerUpKind::ExtraLife,
        PowerUpKind::MultiBall,
        PowerUpKind::Barrier,
        PowerUpKind::Weaken,
        PowerUpKind::NextLevel,
    ];

    /// Field a timed kind mutates; `None` for instantaneous kinds
    pub fn field(self) -> Option<EffectField> {
        match self {
            PowerUpKind::ExpandPaddle | PowerUpKind::ShrinkPaddle => Some(EffectField::PaddleWidth),
            PowerUpKind::TinyBall => Some(EffectField::BallRadius),
            PowerUpKind::SlowBall | PowerUpKind::FastBall => Some(EffectField::BallSpeed),
            PowerUpKind::Fireball => Some(EffectField::BallFireball),
            PowerUpKind::DoubleScore => Some(EffectField::ScoreMultiplier),
            PowerUpKind::Laser => Some(EffectField::Laser),
            PowerUpKind::ExtraLife
            | PowerUpKind::MultiBall
            | PowerUpKind::Barrier
            | PowerUpKind::Weaken
            | PowerUpKind::NextLevel => None,
        }
    }

    pub fn is_timed(self) -> bool {
        self.field().is_some()
    }

    /// Whether collecting it helps the player (drives the pickup sound)
    pub fn is_beneficial(self) -> bool {
        !matches!(
            self,
            PowerUpKind::ShrinkPaddle | PowerUpKind::TinyBall | PowerUpKind::FastBall
        )
    }

    pub fn touches_balls(self) -> bool {
        matches!(
            self.field(),
            Some(EffectField::BallRadius | EffectField::BallSpeed | EffectField::BallFireball)
        )
    }
}

/// One row of the spawn table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpWeight {
    pub kind: PowerUpKind,
    pub weight: u32,
}

/// Default spawn weights (all distinct, all positive)
pub const DEFAULT_WEIGHTS: [(PowerUpKind, u32); 13] = [
    (PowerUpKind::ExpandPaddle, 14),
    (PowerUpKind::MultiBall, 13),
    (PowerUpKind::SlowBall, 12),
    (PowerUpKind::Laser, 11),
    (PowerUpKind::DoubleScore, 10),
    (PowerUpKind::ShrinkPaddle, 9),
    (PowerUpKind::FastBall, 8),
    (PowerUpKind::TinyBall, 7),
    (PowerUpKind::Fireball, 6),
    (PowerUpKind::Barrier, 5),
    (PowerUpKind::Weaken, 4),
    (PowerUpKind::ExtraLife, 3),
    (PowerUpKind::NextLevel, 1),
];

/// Spawn gate rolled once per eligible brick destruction
pub fn roll_spawn<R: Rng + ?Sized>(rng: &mut R, chance: f32) -> bool {
    rng.random::<f32>() < chance
}

/// Weighted draw over the table
pub fn pick_weighted<R: Rng + ?Sized>(rng: &mut R, table: &[PowerUpWeight]) -> Option<PowerUpKind> {
    let total: u32 = table.iter().map(|w| w.weight).sum();
    if total == 0 {
        return None;
    }
    let draw = rng.random_range(0..total);
    pick_at(draw, table)
}

/// Walk cumulative weights until `draw` falls inside a row
pub fn pick_at(draw: u32, table: &[PowerUpWeight]) -> Option<PowerUpKind> {
    let mut cumulative = 0u32;
    for row in table {
        cumulative += row.weight;
        if draw < cumulative {
            return Some(row.kind);
        }
    }
    None
}

/// A falling pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
}

impl PowerUp {
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, Vec2::splat(self.size))
    }

    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }
}
