//! Collision detection and response
//!
//! Balls against walls, paddle, bricks and boss; bullets against bricks and
//! boss; boss bullets and power-ups against the paddle. Every velocity the
//! resolver assigns is renormalized to the ball's base speed, and reflections
//! only ever negate components, so speed never drifts.

use glam::Vec2;

use super::events::GameEvent;
use super::geom::{Axis, Penetration, Rect, Side, circle_rect_penetration, entry_side};
use super::pool::BallId;
use super::powerup::{PowerUp, PowerUpKind, pick_weighted, roll_spawn};
use super::state::{Ball, Brick, BrickKind, GameState, Paddle, ParticleKind};
use crate::consts::*;
use crate::upward_at;

/// What the resolver observed this frame
#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    /// The last ball left the arena
    pub ball_lost: bool,
    /// No destructible bricks remain and no boss is alive
    pub level_cleared: bool,
    /// Power-ups caught by the paddle, in pickup order
    pub collected: Vec<PowerUpKind>,
    pub boss_defeated: bool,
}

/// Reflect off the side walls and ceiling. Returns true on a bounce.
pub fn bounce_walls(ball: &mut Ball) -> bool {
    let mut bounced = false;
    if ball.pos.x - ball.radius < 0.0 {
        ball.pos.x = ball.radius;
        ball.vel.x = ball.vel.x.abs();
        bounced = true;
    } else if ball.pos.x + ball.radius > ARENA_WIDTH {
        ball.pos.x = ARENA_WIDTH - ball.radius;
        ball.vel.x = -ball.vel.x.abs();
        bounced = true;
    }
    if ball.pos.y - ball.radius < 0.0 {
        ball.pos.y = ball.radius;
        ball.vel.y = ball.vel.y.abs();
        bounced = true;
    }
    bounced
}

/// Bounce off the paddle with an angle set by where the ball struck.
///
/// The center offset, normalized to [-1, 1], maps linearly onto
/// `±max_angle` from vertical. The ball is placed exactly on the paddle top.
pub fn bounce_paddle(ball: &mut Ball, paddle: &Paddle, max_angle: f32) -> bool {
    if ball.stuck_to_paddle || !ball.bounds().overlaps(&paddle.rect()) {
        return false;
    }
    let half = (paddle.width / 2.0).max(f32::EPSILON);
    let offset = ((ball.pos.x - paddle.center_x) / half).clamp(-1.0, 1.0);
    ball.pos.y = paddle.top - ball.radius;
    ball.set_direction(upward_at(offset * max_angle));
    true
}

/// First brick the ball overlaps, in traversal order
pub fn pick_brick(ball: &Ball, bricks: &[Brick]) -> Option<(usize, Penetration)> {
    bricks.iter().enumerate().find_map(|(idx, brick)| {
        circle_rect_penetration(ball.pos, ball.radius, &brick.rect).map(|pen| (idx, pen))
    })
}

/// Push the ball out along the collision normal and negate that axis.
///
/// Fireballs keep their course.
pub fn deflect_off(ball: &mut Ball, pen: &Penetration) {
    if ball.fireball {
        return;
    }
    let push_x = pen.delta.x.signum() * pen.depth.x;
    let push_y = pen.delta.y.signum() * pen.depth.y;
    match pen.normal_axis() {
        Some(Axis::X) => {
            ball.pos.x += push_x;
            ball.vel.x = -ball.vel.x;
        }
        Some(Axis::Y) => {
            ball.pos.y += push_y;
            ball.vel.y = -ball.vel.y;
        }
        None => {
            ball.pos += Vec2::new(push_x, push_y);
            ball.vel = -ball.vel;
        }
    }
}

/// Reflect a ball off the boss side it entered through
fn deflect_off_boss(ball: &mut Ball, boss: &Rect, side: Side) {
    match side {
        Side::Left => {
            ball.pos.x = boss.left() - ball.radius;
            ball.vel.x = -ball.vel.x.abs();
        }
        Side::Right => {
            ball.pos.x = boss.right() + ball.radius;
            ball.vel.x = ball.vel.x.abs();
        }
        Side::Top => {
            ball.pos.y = boss.top() - ball.radius;
            ball.vel.y = -ball.vel.y.abs();
        }
        Side::Bottom => {
            ball.pos.y = boss.bottom() + ball.radius;
            ball.vel.y = ball.vel.y.abs();
        }
    }
}

impl GameState {
    /// Resolve every collision for this frame
    pub fn resolve_collisions(&mut self) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();

        for id in self.balls.ids() {
            self.collide_ball(id, &mut outcome);
        }
        self.collide_bullets(&mut outcome);
        self.collide_boss_bullets();
        self.collect_power_ups(&mut outcome);

        let had_balls = !self.balls.is_empty();
        self.remove_fallen_balls();
        outcome.ball_lost = had_balls && self.balls.is_empty();

        outcome.level_cleared =
            self.level > 0 && self.destructible_remaining() == 0 && !self.boss_alive();
        outcome
    }

    fn collide_ball(&mut self, id: BallId, outcome: &mut FrameOutcome) {
        let max_angle = self.tuning.max_bounce_angle_deg.to_radians();
        let (wall, paddle) = {
            let Some(ball) = self.balls.get_mut(id) else {
                return;
            };
            if ball.stuck_to_paddle {
                return;
            }
            (bounce_walls(ball), bounce_paddle(ball, &self.paddle, max_angle))
        };
        if wall {
            self.emit(GameEvent::WallBounce);
        }
        if paddle {
            self.emit(GameEvent::PaddleBounce);
        }

        // One brick per ball per frame
        let hit = self
            .balls
            .get(id)
            .and_then(|ball| pick_brick(ball, &self.bricks));
        if let Some((idx, pen)) = hit {
            let fireball = match self.balls.get_mut(id) {
                Some(ball) => {
                    deflect_off(ball, &pen);
                    ball.fireball
                }
                None => false,
            };
            self.strike_brick(idx, fireball);
        }

        self.collide_ball_with_boss(id, outcome);
    }

    fn collide_ball_with_boss(&mut self, id: BallId, outcome: &mut FrameOutcome) {
        let Some(boss_rect) = self.boss.as_ref().filter(|b| b.is_alive()).map(|b| b.rect) else {
            return;
        };
        let struck = match self.balls.get_mut(id) {
            Some(ball) => match entry_side(&ball.bounds(), &boss_rect) {
                Some((side, _)) => {
                    deflect_off_boss(ball, &boss_rect, side);
                    true
                }
                None => false,
            },
            None => false,
        };
        if struck {
            let damage = self.tuning.boss_ball_damage;
            self.damage_boss(damage, outcome);
        }
    }

    /// Ball contact with a brick. Fireballs destroy any destructible brick.
    fn strike_brick(&mut self, idx: usize, fireball: bool) {
        let brick = &mut self.bricks[idx];
        let id = brick.id;
        if !brick.is_destructible() {
            if !fireball {
                self.emit(GameEvent::BrickHit { brick_id: id });
            }
            return;
        }

        let destroyed = fireball || brick.hit();
        if destroyed {
            let brick = self.bricks.remove(idx);
            self.destroy_brick(brick);
        } else {
            self.add_score(self.tuning.chip_score);
            self.emit(GameEvent::BrickHit { brick_id: id });
        }
    }

    /// Shared destroy path for a brick already taken out of play
    pub(crate) fn destroy_brick(&mut self, brick: Brick) {
        let center = brick.center();
        self.add_score(self.tuning.destroy_score);
        self.burst(center, 10, ParticleKind::Debris, 160.0);
        self.emit(GameEvent::BrickBreak { brick_id: brick.id });
        self.maybe_spawn_power_up(center);
        if brick.is_explosive() {
            self.detonate(&brick);
        }
    }

    fn maybe_spawn_power_up(&mut self, center: Vec2) {
        if !roll_spawn(&mut self.rng, self.tuning.powerup_spawn_chance) {
            return;
        }
        let Some(kind) = pick_weighted(&mut self.rng, &self.tuning.powerup_weights) else {
            return;
        };
        let id = self.next_entity_id();
        self.power_ups.push(PowerUp {
            id,
            kind,
            pos: center,
            vel: Vec2::new(0.0, self.tuning.powerup_fall_speed),
            size: self.tuning.powerup_size,
        });
    }

    fn damage_boss(&mut self, damage: u32, outcome: &mut FrameOutcome) {
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        let defeated = boss.take_damage(damage);
        let health = boss.health;
        let center = boss.rect.center();

        self.add_score(self.tuning.boss_hit_score);
        self.emit(GameEvent::BossHit { health });
        if defeated {
            log::info!("boss defeated on level {}", self.level);
            self.add_score(self.tuning.boss_defeat_score);
            self.burst(center, 48, ParticleKind::Explosion, 300.0);
            self.add_shake(1.0);
            self.pulse_flash(1.0);
            self.emit(GameEvent::BossDefeated);
            outcome.boss_defeated = true;
        }
    }

    /// Player bullets: one-hit kill on destructible bricks, absorbed by
    /// indestructible ones, damage to the boss
    fn collide_bullets(&mut self, outcome: &mut FrameOutcome) {
        for i in 0..self.bullets.len() {
            if !self.bullets[i].alive {
                continue;
            }
            let rect = self.bullets[i].rect;

            if let Some(idx) = self.bricks.iter().position(|b| b.rect.overlaps(&rect)) {
                self.bullets[i].alive = false;
                if self.bricks[idx].is_destructible() {
                    let brick = self.bricks.remove(idx);
                    self.destroy_brick(brick);
                }
                continue;
            }

            let boss_hit = self
                .boss
                .as_ref()
                .is_some_and(|b| b.is_alive() && b.rect.overlaps(&rect));
            if boss_hit {
                self.bullets[i].alive = false;
                let damage = self.tuning.boss_bullet_damage;
                self.damage_boss(damage, outcome);
            }
        }
        self.bullets.retain(|b| b.alive);
    }

    /// Boss fire stops on bricks without harming them. Fire reaching the
    /// paddle costs one life per frame at most.
    fn collide_boss_bullets(&mut self) {
        let paddle = self.paddle.rect();
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        let bricks = &self.bricks;
        boss.bullets
            .retain(|b| !bricks.iter().any(|brick| brick.rect.overlaps(&b.rect)));

        let before = boss.bullets.len();
        boss.bullets.retain(|b| !b.rect.overlaps(&paddle));
        if boss.bullets.len() < before {
            self.add_shake(0.4);
            self.lose_life();
        }
    }

    fn collect_power_ups(&mut self, outcome: &mut FrameOutcome) {
        let paddle = self.paddle.rect();
        self.power_ups.retain(|p| {
            if p.rect().overlaps(&paddle) {
                outcome.collected.push(p.kind);
                false
            } else {
                p.rect().top() <= ARENA_HEIGHT
            }
        });
    }

    /// Barrier bounce, then drop every ball past the arena bottom
    fn remove_fallen_balls(&mut self) {
        for id in self.balls.ids() {
            let used_barrier = match self.balls.get_mut(id) {
                Some(ball)
                    if self.barrier_active
                        && ball.vel.y > 0.0
                        && ball.pos.y + ball.radius >= BARRIER_Y =>
                {
                    ball.pos.y = BARRIER_Y - ball.radius;
                    ball.vel.y = -ball.vel.y;
                    true
                }
                _ => false,
            };
            if used_barrier {
                self.barrier_active = false;
                self.emit(GameEvent::BarrierUsed);
            }

            let fallen = self
                .balls
                .get(id)
                .is_some_and(|b| b.pos.y - b.radius > ARENA_HEIGHT);
            if fallen {
                self.balls.remove(id);
                self.emit(GameEvent::BallLost);
            }
        }
    }

    /// Patrol moving bricks, reversing on bounds or on touching another
    /// moving brick. Overlap is removed before the flip.
    pub(crate) fn advance_moving_bricks(&mut self, dt: f32) {
        for i in 0..self.bricks.len() {
            let BrickKind::Moving {
                velocity_x,
                min_x,
                max_x,
            } = self.bricks[i].kind
            else {
                continue;
            };

            let width = self.bricks[i].rect.size.x;
            let lo = min_x.max(0.0);
            let hi = max_x.min(ARENA_WIDTH - width);
            let mut vx = velocity_x;
            let mut moved = self.bricks[i].rect;
            moved.min.x += vx * dt;
            if moved.min.x <= lo {
                moved.min.x = lo;
                vx = vx.abs();
            } else if moved.min.x >= hi {
                moved.min.x = hi;
                vx = -vx.abs();
            }

            for (j, other) in self.bricks.iter().enumerate() {
                if j == i || !other.is_moving() || !moved.overlaps(&other.rect) {
                    continue;
                }
                if moved.center().x < other.center().x {
                    moved.min.x = other.rect.left() - width;
                    vx = -vx.abs();
                } else {
                    moved.min.x = other.rect.right();
                    vx = vx.abs();
                }
            }
            moved.min.x = moved.min.x.min(hi).max(lo);

            self.bricks[i].rect = moved;
            self.bricks[i].kind = BrickKind::Moving {
                velocity_x: vx,
                min_x,
                max_x,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::boss::Boss;
    use crate::sim::state::{Bullet, GamePhase};
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn playing_state() -> GameState {
        let tuning = Tuning {
            powerup_spawn_chance: 0.0,
            ..Tuning::default()
        };
        let mut state = GameState::new(11, tuning);
        state.level = 1;
        state.balls.clear();
        state.phase = GamePhase::Playing;
        state
    }

    fn brick(id: u32, x: f32, y: f32, kind: BrickKind, hits: u8) -> Brick {
        Brick::new(id, Rect::new(x, y, BRICK_WIDTH, BRICK_HEIGHT), kind, hits)
    }

    fn only_ball(state: &GameState) -> Ball {
        let (_, ball) = state.balls().iter().next().unwrap();
        ball.clone()
    }

    #[test]
    fn test_hit_from_above_inverts_vertical_only() {
        let mut state = playing_state();
        state.bricks.push(brick(1, 300.0, 200.0, BrickKind::Normal, 3));
        // Brick center (332, 211); ball 4px into the top face
        state.spawn_ball_free(Vec2::new(332.0, 196.0), Vec2::new(0.0, 1.0));
        state.resolve_collisions();

        let ball = only_ball(&state);
        assert!(ball.vel.y < 0.0);
        assert_eq!(ball.vel.x, 0.0);
        assert!((ball.pos.y - 192.0).abs() < 1e-4);
        assert_eq!(state.bricks[0].hits_remaining, 2);
        assert_eq!(state.score(), 10);
    }

    #[test]
    fn test_hit_from_side_inverts_horizontal_only() {
        let mut state = playing_state();
        state.bricks.push(brick(1, 300.0, 200.0, BrickKind::Normal, 3));
        state.spawn_ball_free(Vec2::new(294.0, 211.0), Vec2::new(1.0, 0.0));
        state.resolve_collisions();

        let ball = only_ball(&state);
        assert!(ball.vel.x < 0.0);
        assert_eq!(ball.vel.y, 0.0);
        assert!((ball.speed() - ball.base_speed).abs() < 1e-3);
    }

    #[test]
    fn test_corner_tie_inverts_both_axes() {
        let mut state = playing_state();
        state.bricks.push(brick(1, 300.0, 200.0, BrickKind::Normal, 3));
        // Equal 3px overlap on both axes
        state.spawn_ball_free(Vec2::new(295.0, 195.0), Vec2::new(1.0, 1.0));
        let before = only_ball(&state).vel;
        state.resolve_collisions();

        let ball = only_ball(&state);
        assert_eq!(ball.vel, -before);
    }

    #[test]
    fn test_fireball_passes_through_and_destroys() {
        let mut state = playing_state();
        state.bricks.push(brick(1, 300.0, 200.0, BrickKind::Normal, 3));
        let id = state.spawn_ball_free(Vec2::new(332.0, 196.0), Vec2::new(0.3, 1.0));
        state.balls.get_mut(id).unwrap().fireball = true;
        let before = only_ball(&state);
        state.resolve_collisions();

        let ball = only_ball(&state);
        assert_eq!(ball.vel, before.vel);
        assert_eq!(ball.pos, before.pos);
        assert!(state.bricks.is_empty());
        assert_eq!(state.score(), 100);
    }

    #[test]
    fn test_indestructible_reflects_and_keeps_hits() {
        let mut state = playing_state();
        state.bricks.push(brick(1, 300.0, 200.0, BrickKind::Indestructible, 1));
        state.spawn_ball_free(Vec2::new(332.0, 226.0), Vec2::new(0.0, -1.0));
        state.resolve_collisions();

        assert!(only_ball(&state).vel.y > 0.0);
        assert_eq!(state.bricks.len(), 1);
        assert_eq!(state.bricks[0].hits_remaining, 1);
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn test_first_brick_in_traversal_order_wins() {
        let mut state = playing_state();
        state.bricks.push(brick(1, 300.0, 200.0, BrickKind::Normal, 3));
        state.bricks.push(brick(2, 300.0, 215.0, BrickKind::Normal, 3));
        // Overlaps both; brick 2 is closer but brick 1 comes first
        state.spawn_ball_free(Vec2::new(332.0, 222.0), Vec2::new(0.0, -1.0));
        state.resolve_collisions();

        assert_eq!(state.bricks[0].hits_remaining, 2);
        assert_eq!(state.bricks[1].hits_remaining, 3);
    }

    #[test]
    fn test_bullet_kills_one_brick_and_dies() {
        let mut state = playing_state();
        state.bricks.push(brick(1, 300.0, 200.0, BrickKind::Normal, 3));
        state.bricks.push(brick(2, 372.0, 200.0, BrickKind::Normal, 3));
        state.bullets.push(Bullet::new(
            Vec2::new(332.0, 215.0),
            Vec2::new(4.0, 14.0),
            Vec2::new(0.0, -720.0),
        ));
        state.resolve_collisions();

        assert_eq!(state.bricks.len(), 1);
        assert_eq!(state.bricks[0].id, 2);
        assert!(state.bullets.is_empty());
        assert!(state.score() >= 100);
    }

    #[test]
    fn test_bullet_absorbed_by_indestructible() {
        let mut state = playing_state();
        state.bricks.push(brick(1, 300.0, 200.0, BrickKind::Indestructible, 1));
        state.bullets.push(Bullet::new(
            Vec2::new(332.0, 215.0),
            Vec2::new(4.0, 14.0),
            Vec2::new(0.0, -720.0),
        ));
        state.resolve_collisions();
        assert_eq!(state.bricks.len(), 1);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_explosive_brick_takes_neighbours() {
        let mut state = playing_state();
        let pitch = Vec2::new(BRICK_WIDTH + BRICK_GAP_X, BRICK_HEIGHT + BRICK_GAP_Y);
        state.bricks.push(brick(1, 300.0, 200.0, BrickKind::Explosive, 1));
        state.bricks.push(brick(2, 300.0 + pitch.x, 200.0, BrickKind::Normal, 1));
        state.bricks.push(brick(3, 300.0, 200.0 - pitch.y, BrickKind::Normal, 2));
        state.spawn_ball_free(Vec2::new(332.0, 226.0), Vec2::new(0.0, -1.0));
        state.resolve_collisions();

        assert!(state.bricks.is_empty());
        assert!(state.flash > 0.0);
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Explosion { bricks_destroyed: 3 }))
        );
    }

    #[test]
    fn test_level_cleared_when_last_brick_goes() {
        let mut state = playing_state();
        state.bricks.push(brick(1, 300.0, 200.0, BrickKind::Normal, 1));
        state.bricks.push(brick(2, 500.0, 200.0, BrickKind::Indestructible, 1));
        state.spawn_ball_free(Vec2::new(332.0, 226.0), Vec2::new(0.0, -1.0));
        let outcome = state.resolve_collisions();
        assert!(outcome.level_cleared);
    }

    #[test]
    fn test_boss_blocks_level_clear_and_takes_damage() {
        let mut state = playing_state();
        let boss = Boss::new(&state.tuning);
        let bottom = boss.rect.bottom();
        let max = boss.max_health;
        state.boss = Some(boss);
        state.spawn_ball_free(Vec2::new(400.0, bottom + 6.0), Vec2::new(0.0, -1.0));
        let outcome = state.resolve_collisions();

        let ball = only_ball(&state);
        assert!(ball.vel.y > 0.0);
        assert!((ball.pos.y - (bottom + ball.radius)).abs() < 1e-4);
        assert_eq!(state.boss.as_ref().unwrap().health, max - 1);
        assert!(!outcome.level_cleared);
    }

    #[test]
    fn test_boss_bullets_cost_one_life_per_frame() {
        let mut state = playing_state();
        state.spawn_ball_free(Vec2::new(100.0, 300.0), Vec2::new(0.0, -1.0));
        let mut boss = Boss::new(&state.tuning);
        let paddle = state.paddle().rect().center();
        for dx in [-20.0, 0.0, 20.0] {
            boss.bullets.push(Bullet::new(
                paddle + Vec2::new(dx, 0.0),
                Vec2::new(8.0, 16.0),
                Vec2::new(0.0, 260.0),
            ));
        }
        state.boss = Some(boss);
        let lives = state.lives;
        state.resolve_collisions();

        assert_eq!(state.lives, lives - 1);
        assert!(state.boss.as_ref().unwrap().bullets.is_empty());
    }

    #[test]
    fn test_paddle_catches_power_up() {
        let mut state = playing_state();
        state.spawn_ball_free(Vec2::new(100.0, 300.0), Vec2::new(0.0, -1.0));
        let center = state.paddle().rect().center();
        state.power_ups.push(PowerUp {
            id: 50,
            kind: PowerUpKind::Laser,
            pos: center,
            vel: Vec2::new(0.0, 140.0),
            size: 22.0,
        });
        let outcome = state.resolve_collisions();
        assert_eq!(outcome.collected, vec![PowerUpKind::Laser]);
        assert!(state.power_ups.is_empty());
    }

    #[test]
    fn test_barrier_saves_one_ball() {
        let mut state = playing_state();
        state.barrier_active = true;
        state.spawn_ball_free(Vec2::new(100.0, BARRIER_Y - 4.0), Vec2::new(0.0, 1.0));
        let outcome = state.resolve_collisions();

        assert!(!outcome.ball_lost);
        assert!(!state.barrier_active);
        assert!(only_ball(&state).vel.y < 0.0);
    }

    #[test]
    fn test_last_ball_out_signals_loss() {
        let mut state = playing_state();
        state.spawn_ball_free(Vec2::new(100.0, ARENA_HEIGHT + 20.0), Vec2::new(0.0, 1.0));
        let outcome = state.resolve_collisions();
        assert!(outcome.ball_lost);
        assert!(state.balls().is_empty());
    }

    #[test]
    fn test_walls_reflect_and_clamp() {
        let mut ball = Ball::new(Vec2::new(3.0, 5.0), 8.0, 360.0);
        ball.set_direction(Vec2::new(-1.0, -1.0));
        assert!(bounce_walls(&mut ball));
        assert!(ball.vel.x > 0.0 && ball.vel.y > 0.0);
        assert_eq!(ball.pos, Vec2::new(8.0, 8.0));
        assert!((ball.speed() - 360.0).abs() < 1e-3);
    }

    #[test]
    fn test_paddle_center_returns_vertical() {
        let paddle = Paddle::new(&Tuning::default());
        let mut ball = Ball::new(Vec2::new(paddle.center_x, paddle.top + 2.0), 8.0, 360.0);
        ball.set_direction(Vec2::new(0.2, 1.0));
        assert!(bounce_paddle(&mut ball, &paddle, 75f32.to_radians()));
        assert!(ball.vel.x.abs() < 1e-3);
        assert!((ball.vel.y + 360.0).abs() < 1e-3);
        assert_eq!(ball.pos.y, paddle.top - 8.0);
    }

    #[test]
    fn test_moving_bricks_never_interpenetrate() {
        let mut state = playing_state();
        state.bricks.push(brick(
            1,
            100.0,
            100.0,
            BrickKind::Moving {
                velocity_x: 150.0,
                min_x: 0.0,
                max_x: 736.0,
            },
            1,
        ));
        state.bricks.push(brick(
            2,
            400.0,
            100.0,
            BrickKind::Moving {
                velocity_x: -150.0,
                min_x: 0.0,
                max_x: 736.0,
            },
            1,
        ));
        let mut flipped = false;
        for _ in 0..1200 {
            state.advance_moving_bricks(1.0 / 120.0);
            assert!(!state.bricks[0].rect.overlaps(&state.bricks[1].rect));
            assert!(state.bricks[0].rect.left() >= 0.0);
            assert!(state.bricks[1].rect.right() <= ARENA_WIDTH + 1e-3);
            if let BrickKind::Moving { velocity_x, .. } = state.bricks[0].kind {
                flipped |= velocity_x < 0.0;
            }
        }
        assert!(flipped);
    }

    #[test]
    fn test_moving_brick_stays_in_its_window_after_push_out() {
        let mut state = playing_state();
        state.bricks.push(brick(
            1,
            100.0,
            100.0,
            BrickKind::Moving {
                velocity_x: -150.0,
                min_x: 100.0,
                max_x: 200.0,
            },
            1,
        ));
        state.bricks.push(brick(
            2,
            150.0,
            100.0,
            BrickKind::Moving {
                velocity_x: 0.0,
                min_x: 0.0,
                max_x: 736.0,
            },
            1,
        ));
        state.advance_moving_bricks(1.0 / 120.0);
        let rect = state.bricks[0].rect;
        assert!(rect.left() >= 100.0);
        assert!(rect.left() <= 200.0);
    }

    #[test]
    fn test_boss_bullet_stops_on_brick() {
        let mut state = playing_state();
        state.spawn_ball_free(Vec2::new(100.0, 300.0), Vec2::new(0.0, -1.0));
        state.bricks.push(brick(1, 300.0, 200.0, BrickKind::Normal, 2));
        let mut boss = Boss::new(&state.tuning);
        boss.bullets.push(Bullet::new(
            Vec2::new(332.0, 211.0),
            Vec2::new(8.0, 16.0),
            Vec2::new(0.0, 260.0),
        ));
        state.boss = Some(boss);
        let lives = state.lives;
        state.resolve_collisions();

        assert!(state.boss.as_ref().unwrap().bullets.is_empty());
        assert_eq!(state.bricks.len(), 1);
        assert_eq!(state.bricks[0].hits_remaining, 2);
        assert_eq!(state.lives, lives);
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn test_player_bullet_damages_boss() {
        let mut state = playing_state();
        state.spawn_ball_free(Vec2::new(100.0, 300.0), Vec2::new(0.0, -1.0));
        let boss = Boss::new(&state.tuning);
        let center = boss.rect.center();
        let max = boss.max_health;
        state.boss = Some(boss);
        state.bullets.push(Bullet::new(
            center,
            Vec2::new(4.0, 14.0),
            Vec2::new(0.0, -720.0),
        ));
        let outcome = state.resolve_collisions();

        assert_eq!(state.boss.as_ref().unwrap().health, max - 1);
        assert!(state.bullets.is_empty());
        assert_eq!(state.score(), 50);
        assert!(!outcome.boss_defeated);
        assert!(!outcome.level_cleared);
    }

    #[test]
    fn test_boss_defeat_scores_and_clears_level() {
        let mut state = playing_state();
        let mut boss = Boss::new(&state.tuning);
        boss.health = 1;
        let bottom = boss.rect.bottom();
        state.boss = Some(boss);
        state.bricks.push(brick(1, 500.0, 300.0, BrickKind::Indestructible, 1));
        state.spawn_ball_free(Vec2::new(400.0, bottom + 6.0), Vec2::new(0.0, -1.0));
        let outcome = state.resolve_collisions();

        assert!(outcome.boss_defeated);
        assert!(outcome.level_cleared);
        assert!(!state.boss_alive());
        assert_eq!(state.score(), 1050);
        assert!(state.drain_events().contains(&GameEvent::BossDefeated));
    }

    #[test]
    fn test_one_of_two_balls_out_is_not_a_loss() {
        let mut state = playing_state();
        state.spawn_ball_free(Vec2::new(100.0, 300.0), Vec2::new(0.0, -1.0));
        state.spawn_ball_free(Vec2::new(200.0, ARENA_HEIGHT + 20.0), Vec2::new(0.0, 1.0));
        let outcome = state.resolve_collisions();

        assert!(!outcome.ball_lost);
        assert_eq!(state.balls().len(), 1);
        let lost = state
            .drain_events()
            .iter()
            .filter(|e| **e == GameEvent::BallLost)
            .count();
        assert_eq!(lost, 1);
    }

    #[test]
    fn test_bullet_sets_off_explosive_brick() {
        let mut state = playing_state();
        let pitch_x = BRICK_WIDTH + BRICK_GAP_X;
        state.bricks.push(brick(1, 300.0, 200.0, BrickKind::Explosive, 1));
        state.bricks.push(brick(2, 300.0 + pitch_x, 200.0, BrickKind::Normal, 3));
        state.bullets.push(Bullet::new(
            Vec2::new(332.0, 215.0),
            Vec2::new(4.0, 14.0),
            Vec2::new(0.0, -720.0),
        ));
        state.resolve_collisions();

        assert!(state.bricks.is_empty());
        assert!(state.bullets.is_empty());
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Explosion { bricks_destroyed: 2 }))
        );
    }

    proptest! {
        #[test]
        fn prop_paddle_bounce_keeps_speed_and_points_up(offset in -1.1f32..1.1, vx in -1.0f32..1.0) {
            let paddle = Paddle::new(&Tuning::default());
            let x = paddle.center_x + offset * paddle.width / 2.0;
            let mut ball = Ball::new(Vec2::new(x, paddle.top + 1.0), 8.0, 360.0);
            ball.set_direction(Vec2::new(vx, 1.0));
            prop_assert!(bounce_paddle(&mut ball, &paddle, 75f32.to_radians()));
            prop_assert!((ball.speed() - 360.0).abs() < 1e-2);
            prop_assert!(ball.vel.y < 0.0);
            let angle = ball.vel.x.atan2(-ball.vel.y).to_degrees().abs();
            prop_assert!(angle <= 75.0 + 1e-3);
        }
    }
}
