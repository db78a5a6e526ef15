//! Game state and core simulation types
//!
//! All state that must survive a save/restore lives here. Visual particles and
//! queued events are skipped by serde.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::Boss;
use super::effects::{EffectLedger, EffectTargets};
use super::events::{EventSink, GameEvent};
use super::geom::Rect;
use super::pool::{BallId, BallPool};
use super::powerup::PowerUp;
use super::transition::{PortalTransition, Shockwave};
use crate::consts::*;
use crate::renormalize;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball stuck to paddle, waiting for launch input
    Serve,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Level finished, waiting for the host to load the next one
    LevelComplete,
    /// Run ended
    GameOver,
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Magnitude every velocity assignment is normalized to
    pub base_speed: f32,
    pub radius: f32,
    pub stuck_to_paddle: bool,
    /// Passes through bricks without bouncing
    pub fireball: bool,
}

impl Ball {
    pub fn new(pos: Vec2, radius: f32, base_speed: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            base_speed,
            radius,
            stuck_to_paddle: false,
            fireball: false,
        }
    }

    /// Point the ball along `dir` at its base speed
    pub fn set_direction(&mut self, dir: Vec2) {
        self.vel = renormalize(dir, self.base_speed);
    }

    /// Change base speed, rescaling current motion to match
    pub fn set_base_speed(&mut self, speed: f32) {
        self.base_speed = speed;
        if self.vel != Vec2::ZERO {
            self.vel = renormalize(self.vel, speed);
        }
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.pos, Vec2::splat(self.radius * 2.0))
    }

    pub fn advance(&mut self, dt: f32) {
        if !self.stuck_to_paddle {
            self.pos += self.vel * dt;
        }
    }

    /// Keep a stuck ball at its fixed offset above paddle center
    pub fn pin_to(&mut self, paddle: &Paddle) {
        self.pos = Vec2::new(
            paddle.center_x,
            paddle.top - self.radius - STUCK_BALL_GAP,
        );
    }

    /// Release from the paddle with a randomized horizontal component
    pub fn launch<R: Rng + ?Sized>(&mut self, rng: &mut R, spread: f32) {
        let vx = if spread > 0.0 {
            rng.random_range(-spread..=spread)
        } else {
            0.0
        };
        self.set_direction(Vec2::new(vx, -1.0));
        self.stuck_to_paddle = false;
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub center_x: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    /// Horizontal speed (px/s)
    pub speed: f32,
    /// Held movement direction in [-1, 1]
    pub direction: f32,
    pub has_laser: bool,
    /// Seconds until the laser can fire again
    pub laser_cooldown: f32,
}

impl Paddle {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            center_x: ARENA_WIDTH / 2.0,
            top: PADDLE_TOP,
            width: tuning.paddle_width,
            height: tuning.paddle_height,
            speed: tuning.paddle_speed,
            direction: 0.0,
            has_laser: false,
            laser_cooldown: 0.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(
            self.center_x - self.width / 2.0,
            self.top,
            self.width,
            self.height,
        )
    }

    pub fn advance(&mut self, dt: f32) {
        self.center_x += self.direction * self.speed * dt;
        self.clamp_to_arena();
        self.laser_cooldown = (self.laser_cooldown - dt).max(0.0);
    }

    /// Resize around the current center
    pub fn set_width(&mut self, width: f32) {
        self.width = width.min(ARENA_WIDTH);
        self.clamp_to_arena();
    }

    fn clamp_to_arena(&mut self) {
        let half = self.width / 2.0;
        self.center_x = self.center_x.clamp(half, ARENA_WIDTH - half);
    }
}

/// Brick behaviour, with per-kind payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BrickKind {
    Normal,
    /// Never destroyed, never counts toward level clear
    Indestructible,
    /// Starts a chain reaction when destroyed
    Explosive,
    /// Patrols horizontally between `min_x` and `max_x` (left edge bounds)
    Moving {
        velocity_x: f32,
        min_x: f32,
        max_x: f32,
    },
}

/// A brick entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub id: u32,
    pub rect: Rect,
    pub hits_remaining: u8,
    pub kind: BrickKind,
}

impl Brick {
    pub fn new(id: u32, rect: Rect, kind: BrickKind, hits: u8) -> Self {
        Self {
            id,
            rect,
            // A brick always starts alive; indestructible ones stay that way
            hits_remaining: hits.max(1),
            kind,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    pub fn is_destructible(&self) -> bool {
        !matches!(self.kind, BrickKind::Indestructible)
    }

    pub fn is_explosive(&self) -> bool {
        matches!(self.kind, BrickKind::Explosive)
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.kind, BrickKind::Moving { .. })
    }

    /// Apply one hit. Returns true when the brick is now destroyed.
    pub fn hit(&mut self) -> bool {
        if !self.is_destructible() {
            return false;
        }
        self.hits_remaining = self.hits_remaining.saturating_sub(1);
        self.hits_remaining == 0
    }
}

/// Player laser bullet or boss bullet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub rect: Rect,
    pub vel: Vec2,
    pub alive: bool,
}

impl Bullet {
    pub fn new(center: Vec2, size: Vec2, vel: Vec2) -> Self {
        Self {
            rect: Rect::from_center(center, size),
            vel,
            alive: true,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.rect.translate(self.vel * dt);
        if self.rect.bottom() < 0.0 || self.rect.top() > ARENA_HEIGHT {
            self.alive = false;
        }
    }
}

/// Visual flavour of a particle (renderer picks colors)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Debris,
    Explosion,
    Spark,
    Portal,
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: ParticleKind,
    pub life: f32, // 0-1, decreases over time
    pub size: f32,
}

/// Maximum particles
pub const MAX_PARTICLES: usize = 512;

/// Complete game state (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    /// Current level number (1-based once a level is loaded)
    pub level: u32,
    /// Clearing this level ends the campaign
    pub final_level: bool,
    /// Spare lives
    pub lives: u8,
    score: u64,
    score_multiplier: f32,
    pub phase: GamePhase,
    pub(crate) paddle: Paddle,
    pub(crate) balls: BallPool,
    pub bricks: Vec<Brick>,
    /// Player laser bullets
    pub bullets: Vec<Bullet>,
    pub boss: Option<Boss>,
    pub power_ups: Vec<PowerUp>,
    pub(crate) effects: EffectLedger,
    /// One-shot floor that bounces the next lost ball
    pub barrier_active: bool,
    pub shockwave: Option<Shockwave>,
    pub portal: Option<PortalTransition>,
    /// Screen shake intensity (0-1)
    pub screen_shake: f32,
    /// Full-screen flash intensity (0-1)
    pub flash: f32,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    #[serde(skip)]
    events: Vec<GameEvent>,
    /// Frames simulated, used to seed particle spreads
    pub time_ticks: u64,
    next_id: u32,
}

impl GameState {
    /// Create a new game state with the given seed and balance values
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            level: 0,
            final_level: false,
            lives: tuning.starting_lives,
            score: 0,
            score_multiplier: 1.0,
            phase: GamePhase::Serve,
            paddle: Paddle::new(&tuning),
            balls: BallPool::new(),
            bricks: Vec::new(),
            bullets: Vec::new(),
            boss: None,
            power_ups: Vec::new(),
            effects: EffectLedger::default(),
            barrier_active: false,
            shockwave: None,
            portal: None,
            screen_shake: 0.0,
            flash: 0.0,
            particles: Vec::new(),
            events: Vec::new(),
            time_ticks: 0,
            next_id: 1,
            tuning,
        };

        state.spawn_ball_stuck();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn paddle(&self) -> &Paddle {
        &self.paddle
    }

    pub fn balls(&self) -> &BallPool {
        &self.balls
    }

    pub fn effects(&self) -> &EffectLedger {
        &self.effects
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn score_multiplier(&self) -> f32 {
        self.score_multiplier
    }

    /// Only affects points awarded after the call
    pub fn set_score_multiplier(&mut self, multiplier: f32) {
        self.score_multiplier = multiplier;
    }

    /// Split borrow of the ledger and the values it may overwrite
    pub(crate) fn effect_parts(&mut self) -> (&mut EffectLedger, EffectTargets<'_>) {
        (
            &mut self.effects,
            EffectTargets {
                paddle: &mut self.paddle,
                balls: &mut self.balls,
                score_multiplier: &mut self.score_multiplier,
                tuning: &self.tuning,
            },
        )
    }

    /// Add `round(base * multiplier)` to the score
    pub fn add_score(&mut self, base: u32) {
        let points = (base as f32 * self.score_multiplier).round();
        self.score += points.max(0.0) as u64;
    }

    /// Spawn a ball stuck to the paddle, enrolled in active effects
    pub fn spawn_ball_stuck(&mut self) -> BallId {
        let mut ball = Ball::new(Vec2::ZERO, self.tuning.ball_radius, self.tuning.ball_speed);
        ball.stuck_to_paddle = true;
        ball.pin_to(&self.paddle);
        let id = self.balls.insert(ball);
        self.effects.enroll_ball(id, &mut self.balls, &self.tuning);
        id
    }

    /// Spawn a free ball at `pos` heading along `dir`, enrolled in active effects
    pub(crate) fn spawn_ball_free(&mut self, pos: Vec2, dir: Vec2) -> BallId {
        let ball = Ball::new(pos, self.tuning.ball_radius, self.tuning.ball_speed);
        let id = self.balls.insert(ball);
        self.effects.enroll_ball(id, &mut self.balls, &self.tuning);
        if let Some(ball) = self.balls.get_mut(id) {
            ball.set_direction(dir);
        }
        id
    }

    /// Bricks that must be destroyed to clear the level
    pub fn destructible_remaining(&self) -> usize {
        self.bricks.iter().filter(|b| b.is_destructible()).count()
    }

    pub fn boss_alive(&self) -> bool {
        self.boss.as_ref().is_some_and(|b| b.is_alive())
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Hand queued events to the host's sink
    pub fn flush_events<S: EventSink + ?Sized>(&mut self, sink: &mut S) {
        for event in self.events.drain(..) {
            sink.emit(event);
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn add_shake(&mut self, amount: f32) {
        self.screen_shake = (self.screen_shake + amount).min(1.0);
    }

    /// Flash never dims because a second pulse arrives in the same frame
    pub(crate) fn pulse_flash(&mut self, intensity: f32) {
        self.flash = self.flash.max(intensity);
    }

    /// Spray particles around `center`
    pub(crate) fn burst(&mut self, center: Vec2, count: u32, kind: ParticleKind, speed: f32) {
        let particle_seed = (self.time_ticks as u32).wrapping_add(self.particles.len() as u32);
        for i in 0..count {
            if self.particles.len() >= MAX_PARTICLES {
                // Remove oldest particles to make room
                self.particles.remove(0);
            }
            let hash = particle_seed
                .wrapping_mul(2654435761)
                .wrapping_add(i * 7919);
            let angle = (hash % 1000) as f32 / 1000.0 * std::f32::consts::TAU;
            let spread = 0.5 + ((hash >> 10) % 1000) as f32 / 1000.0;
            let size = 2.0 + ((hash >> 20) % 100) as f32 / 25.0;
            self.particles.push(Particle {
                pos: center,
                vel: Vec2::from_angle(angle) * speed * spread,
                kind,
                life: 1.0,
                size,
            });
        }
    }

    pub(crate) fn update_particles(&mut self, dt: f32) {
        for particle in self.particles.iter_mut() {
            particle.pos += particle.vel * dt;
            // Light gravity and drag
            particle.vel.y += 240.0 * dt;
            particle.vel *= 0.98;
            particle.life -= dt * 1.5; // ~0.67 second lifetime
            particle.size *= 0.995;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    /// Ensure bricks are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.bricks.sort_by_key(|b| b.id);
        self.power_ups.sort_by_key(|p| p.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(42, Tuning::default())
    }

    #[test]
    fn test_new_state_has_stuck_ball() {
        let state = state();
        assert_eq!(state.phase, GamePhase::Serve);
        assert_eq!(state.balls.len(), 1);
        let (_, ball) = state.balls.iter().next().unwrap();
        assert!(ball.stuck_to_paddle);
        assert!((ball.pos.x - state.paddle.center_x).abs() < 1e-4);
        assert!(ball.pos.y < state.paddle.top);
    }

    #[test]
    fn test_add_score_with_multiplier() {
        let mut state = state();
        state.add_score(100);
        assert_eq!(state.score(), 100);
        state.set_score_multiplier(2.0);
        state.add_score(100);
        assert_eq!(state.score(), 300);
        state.set_score_multiplier(3.0);
        state.add_score(100);
        assert_eq!(state.score(), 600);
    }

    #[test]
    fn test_add_score_rounds() {
        let mut state = state();
        state.set_score_multiplier(1.5);
        state.add_score(5); // 7.5 rounds to 8
        assert_eq!(state.score(), 8);
    }

    #[test]
    fn test_launch_normalizes_speed() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            let mut ball = Ball::new(Vec2::new(400.0, 500.0), 8.0, 360.0);
            ball.stuck_to_paddle = true;
            ball.launch(&mut rng, 0.5);
            assert!(!ball.stuck_to_paddle);
            assert!((ball.speed() - 360.0).abs() < 1e-3);
            assert!(ball.vel.y < 0.0);
        }
    }

    #[test]
    fn test_paddle_clamped_to_arena() {
        let mut paddle = Paddle::new(&Tuning::default());
        paddle.direction = -1.0;
        paddle.advance(10.0);
        assert!((paddle.rect().left() - 0.0).abs() < 1e-4);
        paddle.direction = 1.0;
        paddle.advance(10.0);
        assert!((paddle.rect().right() - ARENA_WIDTH).abs() < 1e-4);
    }

    #[test]
    fn test_indestructible_never_breaks() {
        let mut brick = Brick::new(1, Rect::new(0.0, 0.0, 60.0, 20.0), BrickKind::Indestructible, 1);
        for _ in 0..5 {
            assert!(!brick.hit());
        }
        assert_eq!(brick.hits_remaining, 1);
    }

    #[test]
    fn test_bullet_dies_offscreen() {
        let mut bullet = Bullet::new(Vec2::new(100.0, 5.0), Vec2::new(4.0, 14.0), Vec2::new(0.0, -700.0));
        bullet.advance(0.1);
        assert!(!bullet.alive);
    }

    #[test]
    fn test_flash_keeps_max() {
        let mut state = state();
        state.pulse_flash(0.8);
        state.pulse_flash(0.3);
        assert_eq!(state.flash, 0.8);
    }
}
