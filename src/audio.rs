//! Audio cue bridge
//!
//! Maps simulation events onto named sound effects. Playback belongs to the
//! host; this module only decides which cue a frame asks for and at what
//! volume, and keeps a tally for headless runs.

use std::collections::BTreeMap;

use crate::settings::Settings;
use crate::sim::{EventSink, GameEvent};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SoundEffect {
    /// Ball hits paddle
    PaddleHit,
    /// Ball hits wall
    WallHit,
    /// Ball hits brick (doesn't break)
    BrickHit,
    /// Brick breaks
    BrickBreak,
    /// Explosive chain
    Explosion,
    /// Helpful pickup collected
    PickupGood,
    /// Harmful pickup collected
    PickupBad,
    /// Timed effect wore off
    EffectEnd,
    LaserShot,
    BossHit,
    BossDefeated,
    /// Barrier caught a ball
    Barrier,
    /// Ball fell out of the arena
    BallLost,
    LevelClear,
    Victory,
    GameOver,
}

impl SoundEffect {
    /// Cue for an event, `None` for silent events
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        let effect = match event {
            GameEvent::WallBounce => SoundEffect::WallHit,
            GameEvent::PaddleBounce => SoundEffect::PaddleHit,
            GameEvent::BrickHit { .. } => SoundEffect::BrickHit,
            GameEvent::BrickBreak { .. } => SoundEffect::BrickBreak,
            GameEvent::Explosion { .. } => SoundEffect::Explosion,
            GameEvent::PowerUpGood { .. } => SoundEffect::PickupGood,
            GameEvent::PowerUpBad { .. } => SoundEffect::PickupBad,
            GameEvent::EffectExpired { .. } => SoundEffect::EffectEnd,
            GameEvent::LaserShot => SoundEffect::LaserShot,
            GameEvent::BossHit { .. } => SoundEffect::BossHit,
            GameEvent::BossDefeated => SoundEffect::BossDefeated,
            GameEvent::BarrierUsed => SoundEffect::Barrier,
            GameEvent::BallLost => SoundEffect::BallLost,
            GameEvent::LevelComplete { .. } => SoundEffect::LevelClear,
            GameEvent::GameComplete => SoundEffect::Victory,
            GameEvent::GameOver => SoundEffect::GameOver,
            // The ball-lost cue already covers it
            GameEvent::LifeLost { .. } => return None,
        };
        Some(effect)
    }

    /// Relative loudness before the player's volume is applied
    fn base_gain(&self) -> f32 {
        match self {
            SoundEffect::WallHit | SoundEffect::PaddleHit | SoundEffect::BrickHit => 0.4,
            SoundEffect::Explosion | SoundEffect::BossDefeated | SoundEffect::GameOver => 1.0,
            _ => 0.7,
        }
    }
}

/// Event sink that turns events into cues
#[derive(Debug, Default)]
pub struct AudioBridge {
    sfx_volume: f32,
    /// Cues requested since the last drain, with their gain
    pending: Vec<(SoundEffect, f32)>,
    played: BTreeMap<SoundEffect, u32>,
}

impl AudioBridge {
    pub fn new(settings: &Settings) -> Self {
        Self {
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    /// Cues for the host to play
    pub fn drain(&mut self) -> Vec<(SoundEffect, f32)> {
        std::mem::take(&mut self.pending)
    }

    /// How often each cue fired over the whole run
    pub fn tally(&self) -> &BTreeMap<SoundEffect, u32> {
        &self.played
    }
}

impl EventSink for AudioBridge {
    fn emit(&mut self, event: GameEvent) {
        log::debug!("event: {:?}", event);
        let Some(effect) = SoundEffect::for_event(&event) else {
            return;
        };
        *self.played.entry(effect).or_insert(0) += 1;
        if self.sfx_volume > 0.0 {
            self.pending.push((effect, effect.base_gain() * self.sfx_volume));
        }
    }
}
