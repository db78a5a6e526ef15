//! Discrete events emitted by the simulation for audio and UI layers
//!
//! The core never plays sounds itself; it queues events and the host flushes
//! them into whatever sink it owns.

use serde::{Deserialize, Serialize};

use super::powerup::PowerUpKind;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// Ball bounced off a side or the top wall
    WallBounce,
    /// Ball bounced off the paddle
    PaddleBounce,
    /// Brick was hit but survived (or is indestructible)
    BrickHit { brick_id: u32 },
    /// Brick destroyed
    BrickBreak { brick_id: u32 },
    /// Explosive chain went off
    Explosion { bricks_destroyed: u32 },
    /// Helpful power-up collected
    PowerUpGood { kind: PowerUpKind },
    /// Harmful power-up collected
    PowerUpBad { kind: PowerUpKind },
    /// Timed power-up ran out
    EffectExpired { kind: PowerUpKind },
    LaserShot,
    BossHit { health: u32 },
    BossDefeated,
    /// Barrier saved a ball
    BarrierUsed,
    /// A ball fell out of the arena
    BallLost,
    /// A spare life was spent
    LifeLost { lives: u8 },
    LevelComplete { level: u32 },
    GameComplete,
    GameOver,
}

/// Receiver for simulation events (audio bridge, UI, logging)
pub trait EventSink {
    fn emit(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn emit(&mut self, event: GameEvent) {
        self.push(event);
    }
}
