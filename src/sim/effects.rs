//! Timed power-up effects with exact snapshot restoration
//!
//! Each timed effect records the values it overwrote. On expiry those values
//! are written back verbatim. When a later effect on the same field is still
//! running, the expiring snapshot is handed down to it and the later
//! mutations are replayed on top, so overlapping effects unwind exactly no
//! matter which one ends first.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use super::pool::{BallId, BallPool};
use super::powerup::{EffectField, PowerUpKind};
use super::state::{Ball, GamePhase, GameState, Paddle};
use super::transition::{PortalTransition, Shockwave};
use crate::consts::*;
use crate::tuning::Tuning;
use crate::upward_at;

/// Where the portal opens for a next-level warp
const PORTAL_POINT: Vec2 = Vec2::new(ARENA_WIDTH / 2.0, 80.0);
/// Extra lives cap
const MAX_LIVES: u8 = 9;

/// Pre-effect values of one ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub ball: BallId,
    pub base_speed: f32,
    pub radius: f32,
    pub fireball: bool,
}

impl BallSnapshot {
    fn of(id: BallId, ball: &Ball) -> Self {
        Self {
            ball: id,
            base_speed: ball.base_speed,
            radius: ball.radius,
            fireball: ball.fireball,
        }
    }
}

/// Everything an effect must restore when it ends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectSnapshot {
    pub paddle_width: Option<f32>,
    pub balls: Vec<BallSnapshot>,
    pub score_multiplier: Option<f32>,
    pub has_laser: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    pub remaining_secs: f32,
    /// Application order, used to unwind overlapping effects
    pub sequence: u64,
    pub snapshot: EffectSnapshot,
}

/// Mutable state the ledger is allowed to touch
pub struct EffectTargets<'a> {
    pub paddle: &'a mut Paddle,
    pub balls: &'a mut BallPool,
    pub score_multiplier: &'a mut f32,
    pub tuning: &'a Tuning,
}

/// Whether a timed application created a record or extended one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Started,
    Extended,
}

fn mutated_width(kind: PowerUpKind, width: f32, tuning: &Tuning) -> f32 {
    match kind {
        PowerUpKind::ExpandPaddle => (width * tuning.expand_factor).min(tuning.paddle_max_width),
        PowerUpKind::ShrinkPaddle => (width * tuning.shrink_factor).max(tuning.paddle_min_width),
        _ => width,
    }
}

fn mutated_radius(kind: PowerUpKind, radius: f32, tuning: &Tuning) -> f32 {
    match kind {
        PowerUpKind::TinyBall => radius * tuning.tiny_factor,
        _ => radius,
    }
}

fn mutated_speed(kind: PowerUpKind, speed: f32, tuning: &Tuning) -> f32 {
    match kind {
        PowerUpKind::SlowBall => speed * tuning.slow_factor,
        PowerUpKind::FastBall => speed * tuning.fast_factor,
        _ => speed,
    }
}

fn mutated_multiplier(kind: PowerUpKind, multiplier: f32, tuning: &Tuning) -> f32 {
    match kind {
        PowerUpKind::DoubleScore => multiplier * tuning.score_factor,
        _ => multiplier,
    }
}

fn mutate_ball(kind: PowerUpKind, ball: &mut Ball, tuning: &Tuning) {
    match kind.field() {
        Some(EffectField::BallRadius) => ball.radius = mutated_radius(kind, ball.radius, tuning),
        Some(EffectField::BallSpeed) => {
            ball.set_base_speed(mutated_speed(kind, ball.base_speed, tuning))
        }
        Some(EffectField::BallFireball) => ball.fireball = true,
        _ => {}
    }
}

/// Ledger of running timed effects (at most one per kind)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectLedger {
    active: Vec<ActiveEffect>,
    next_sequence: u64,
}

impl EffectLedger {
    pub fn active(&self) -> &[ActiveEffect] {
        &self.active
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.active.iter().any(|e| e.kind == kind)
    }

    pub fn remaining(&self, kind: PowerUpKind) -> Option<f32> {
        self.active
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.remaining_secs)
    }

    /// Start a timed effect, or extend the running one of the same kind
    pub fn apply(&mut self, kind: PowerUpKind, duration: f32, t: EffectTargets<'_>) -> Applied {
        if let Some(existing) = self.active.iter_mut().find(|e| e.kind == kind) {
            existing.remaining_secs += duration;
            return Applied::Extended;
        }

        let Some(field) = kind.field() else {
            return Applied::Extended;
        };

        let mut snapshot = EffectSnapshot::default();
        match field {
            EffectField::PaddleWidth => {
                snapshot.paddle_width = Some(t.paddle.width);
                t.paddle
                    .set_width(mutated_width(kind, t.paddle.width, t.tuning));
            }
            EffectField::BallRadius | EffectField::BallSpeed | EffectField::BallFireball => {
                for (id, ball) in t.balls.iter_mut() {
                    snapshot.balls.push(BallSnapshot::of(id, ball));
                    mutate_ball(kind, ball, t.tuning);
                }
            }
            EffectField::ScoreMultiplier => {
                snapshot.score_multiplier = Some(*t.score_multiplier);
                *t.score_multiplier = mutated_multiplier(kind, *t.score_multiplier, t.tuning);
            }
            EffectField::Laser => {
                snapshot.has_laser = Some(t.paddle.has_laser);
                t.paddle.has_laser = true;
            }
        }

        self.active.push(ActiveEffect {
            kind,
            remaining_secs: duration,
            sequence: self.next_sequence,
            snapshot,
        });
        self.next_sequence += 1;
        Applied::Started
    }

    /// Age every effect; restore and drop the ones that ran out.
    ///
    /// Returns the kinds that expired, oldest first.
    pub fn update(&mut self, dt: f32, mut t: EffectTargets<'_>) -> Vec<PowerUpKind> {
        for effect in &mut self.active {
            effect.remaining_secs = (effect.remaining_secs - dt).max(0.0);
        }

        let mut expired = Vec::new();
        while let Some(idx) = self.active.iter().position(|e| e.remaining_secs <= 0.0) {
            self.restore(idx, &mut t);
            expired.push(self.active.remove(idx).kind);
        }
        expired
    }

    /// Restore every effect, newest first
    pub fn expire_all(&mut self, mut t: EffectTargets<'_>) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        while let Some(idx) = self.active.len().checked_sub(1) {
            self.restore(idx, &mut t);
            expired.push(self.active.remove(idx).kind);
        }
        expired
    }

    /// Record a new ball's plain values in every running ball effect and
    /// apply those effects to it, in application order
    pub fn enroll_ball(&mut self, id: BallId, balls: &mut BallPool, tuning: &Tuning) {
        let Some(ball) = balls.get_mut(id) else {
            return;
        };
        for effect in self.active.iter_mut().filter(|e| e.kind.touches_balls()) {
            effect.snapshot.balls.push(BallSnapshot::of(id, ball));
            mutate_ball(effect.kind, ball, tuning);
        }
    }

    /// Indices of running effects on `field` applied after `idx`, in order
    fn later_on_field(&self, idx: usize, field: EffectField) -> Vec<usize> {
        let sequence = self.active[idx].sequence;
        let mut later: Vec<usize> = (0..self.active.len())
            .filter(|&i| {
                self.active[i].sequence > sequence && self.active[i].kind.field() == Some(field)
            })
            .collect();
        later.sort_by_key(|&i| self.active[i].sequence);
        later
    }

    fn restore(&mut self, idx: usize, t: &mut EffectTargets<'_>) {
        let kind = self.active[idx].kind;
        let Some(field) = kind.field() else {
            return;
        };
        let later = self.later_on_field(idx, field);
        let snapshot = self.active[idx].snapshot.clone();
        log::debug!("restoring {:?} ({} later on same field)", kind, later.len());

        match field {
            EffectField::PaddleWidth => {
                if let Some(mut width) = snapshot.paddle_width {
                    for &i in &later {
                        self.active[i].snapshot.paddle_width = Some(width);
                        width = mutated_width(self.active[i].kind, width, t.tuning);
                    }
                    t.paddle.set_width(width);
                }
            }
            EffectField::ScoreMultiplier => {
                if let Some(mut multiplier) = snapshot.score_multiplier {
                    for &i in &later {
                        self.active[i].snapshot.score_multiplier = Some(multiplier);
                        multiplier = mutated_multiplier(self.active[i].kind, multiplier, t.tuning);
                    }
                    *t.score_multiplier = multiplier;
                }
            }
            EffectField::Laser => {
                if let Some(mut laser) = snapshot.has_laser {
                    for &i in &later {
                        self.active[i].snapshot.has_laser = Some(laser);
                        laser = true;
                    }
                    t.paddle.has_laser = laser;
                }
            }
            EffectField::BallRadius | EffectField::BallSpeed | EffectField::BallFireball => {
                for original in &snapshot.balls {
                    let mut value = *original;
                    for &i in &later {
                        let later_kind = self.active[i].kind;
                        if let Some(entry) = self.active[i]
                            .snapshot
                            .balls
                            .iter_mut()
                            .find(|s| s.ball == original.ball)
                        {
                            match field {
                                EffectField::BallRadius => entry.radius = value.radius,
                                EffectField::BallSpeed => entry.base_speed = value.base_speed,
                                _ => entry.fireball = value.fireball,
                            }
                        }
                        value.radius = mutated_radius(later_kind, value.radius, t.tuning);
                        value.base_speed = mutated_speed(later_kind, value.base_speed, t.tuning);
                        value.fireball |= later_kind == PowerUpKind::Fireball;
                    }

                    // Ball lost since the effect started: nothing to restore
                    let Some(ball) = t.balls.get_mut(original.ball) else {
                        continue;
                    };
                    match field {
                        EffectField::BallRadius => ball.radius = value.radius,
                        EffectField::BallSpeed => ball.set_base_speed(value.base_speed),
                        _ => ball.fireball = value.fireball,
                    }
                }
            }
        }
    }
}

impl GameState {
    /// Apply a collected power-up
    pub fn apply_power_up(&mut self, kind: PowerUpKind) {
        if kind.is_beneficial() {
            self.emit(GameEvent::PowerUpGood { kind });
        } else {
            self.emit(GameEvent::PowerUpBad { kind });
        }

        if let Some(duration) = self.tuning.effect_secs(kind) {
            let (ledger, targets) = self.effect_parts();
            let applied = ledger.apply(kind, duration, targets);
            log::debug!("power-up {:?} {:?} for {:.1}s", kind, applied, duration);
            return;
        }

        match kind {
            PowerUpKind::ExtraLife => {
                self.lives = self.lives.saturating_add(1).min(MAX_LIVES);
            }
            PowerUpKind::MultiBall => self.split_balls(),
            PowerUpKind::Barrier => {
                self.barrier_active = true;
            }
            PowerUpKind::Weaken => self.weaken_bricks(),
            PowerUpKind::NextLevel => self.open_portal(),
            _ => {}
        }
    }

    /// Age timed effects, restoring whatever expires
    pub fn update_active_effects(&mut self, dt: f32) {
        let (ledger, targets) = self.effect_parts();
        let expired = ledger.update(dt, targets);
        for kind in expired {
            log::debug!("effect {:?} expired", kind);
            self.emit(GameEvent::EffectExpired { kind });
        }
    }

    /// End every running effect immediately
    pub fn clear_active_effects(&mut self) {
        let (ledger, targets) = self.effect_parts();
        let expired = ledger.expire_all(targets);
        for kind in expired {
            self.emit(GameEvent::EffectExpired { kind });
        }
    }

    /// Two extra balls above the paddle, split either side of vertical
    fn split_balls(&mut self) {
        if self.balls.is_empty() {
            return;
        }
        let spawn = Vec2::new(
            self.paddle.center_x,
            self.paddle.top - self.tuning.ball_radius - STUCK_BALL_GAP,
        );
        let spread = self.tuning.multiball_spread_deg.to_radians();
        for angle in [-spread, spread] {
            self.spawn_ball_free(spawn, upward_at(angle));
        }
        if self.phase == GamePhase::Serve {
            self.phase = GamePhase::Playing;
        }
    }

    /// Knock one hit off every multi-hit brick, then send out the ring
    fn weaken_bricks(&mut self) {
        for brick in self.bricks.iter_mut().filter(|b| b.is_destructible()) {
            if brick.hits_remaining > 1 {
                brick.hits_remaining -= 1;
            }
        }
        let origin = Vec2::new(self.paddle.center_x, self.paddle.top);
        let max_radius = Vec2::new(ARENA_WIDTH, ARENA_HEIGHT).length();
        self.shockwave = Some(Shockwave::new(
            origin,
            max_radius,
            self.tuning.shockwave_speed,
            self.tuning.shockwave_thickness,
        ));
    }

    /// Start the next-level warp
    fn open_portal(&mut self) {
        let bricks = std::mem::take(&mut self.bricks);
        log::info!("portal opened, {} bricks in flight", bricks.len());
        self.portal = Some(PortalTransition::new(PORTAL_POINT, &bricks));
        self.boss = None;
        self.bullets.clear();
        self.power_ups.clear();
        self.shockwave = None;
    }
}
