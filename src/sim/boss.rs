//! Boss encounter: horizontal patrol plus timed downward fire

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use super::state::Bullet;
use crate::consts::ARENA_WIDTH;
use crate::tuning::Tuning;

const BOSS_TOP: f32 = 60.0;
const BOSS_BULLET_SIZE: Vec2 = Vec2::new(8.0, 16.0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub rect: Rect,
    pub health: u32,
    pub max_health: u32,
    pub speed: f32,
    /// +1 moving right, -1 moving left
    pub direction: f32,
    pub bullets: Vec<Bullet>,
    /// Seconds until the next shot
    pub shoot_cooldown: f32,
    pub shoot_interval: f32,
    pub bullet_speed: f32,
    /// Hit flash for the renderer (0-1)
    pub hit_flash: f32,
}

impl Boss {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            rect: Rect::new(
                (ARENA_WIDTH - tuning.boss_width) / 2.0,
                BOSS_TOP,
                tuning.boss_width,
                tuning.boss_height,
            ),
            health: tuning.boss_health,
            max_health: tuning.boss_health,
            speed: tuning.boss_speed,
            direction: 1.0,
            bullets: Vec::new(),
            shoot_cooldown: tuning.boss_shoot_interval,
            shoot_interval: tuning.boss_shoot_interval,
            bullet_speed: tuning.boss_bullet_speed,
            hit_flash: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Patrol, shoot and move bullets
    pub fn advance(&mut self, dt: f32) {
        if !self.is_alive() {
            return;
        }

        self.rect.min.x += self.direction * self.speed * dt;
        let max_x = ARENA_WIDTH - self.rect.size.x;
        if self.rect.min.x <= 0.0 {
            self.rect.min.x = 0.0;
            self.direction = 1.0;
        } else if self.rect.min.x >= max_x {
            self.rect.min.x = max_x;
            self.direction = -1.0;
        }

        self.shoot_cooldown -= dt;
        if self.shoot_cooldown <= 0.0 {
            let muzzle = Vec2::new(self.rect.center().x, self.rect.bottom() + BOSS_BULLET_SIZE.y / 2.0);
            self.bullets.push(Bullet::new(
                muzzle,
                BOSS_BULLET_SIZE,
                Vec2::new(0.0, self.bullet_speed),
            ));
            self.shoot_cooldown += self.shoot_interval;
        }

        for bullet in &mut self.bullets {
            bullet.advance(dt);
        }
        self.bullets.retain(|b| b.alive);

        self.hit_flash = (self.hit_flash - dt * 4.0).max(0.0);
    }

    /// Returns true if this damage finished the boss
    pub fn take_damage(&mut self, amount: u32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        self.hit_flash = 1.0;
        if self.health == 0 {
            self.bullets.clear();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patrol_flips_at_bounds() {
        let mut boss = Boss::new(&Tuning::default());
        boss.shoot_cooldown = f32::MAX;
        for _ in 0..1000 {
            boss.advance(0.05);
            assert!(boss.rect.left() >= 0.0);
            assert!(boss.rect.right() <= ARENA_WIDTH + 1e-3);
        }
        // Ran long enough to bounce off both walls
        let mut saw_left = false;
        for _ in 0..400 {
            boss.advance(0.05);
            saw_left |= boss.direction < 0.0;
        }
        assert!(saw_left);
    }

    #[test]
    fn test_shoots_on_cooldown() {
        let tuning = Tuning::default();
        let mut boss = Boss::new(&tuning);
        boss.advance(tuning.boss_shoot_interval + 0.01);
        assert_eq!(boss.bullets.len(), 1);
        assert!(boss.bullets[0].vel.y > 0.0);
    }

    #[test]
    fn test_damage_to_zero_defeats() {
        let mut boss = Boss::new(&Tuning::default());
        let hp = boss.health;
        assert!(!boss.take_damage(hp - 1));
        assert!(boss.take_damage(5));
        assert!(!boss.is_alive());
        assert!(!boss.take_damage(1));
    }
}
