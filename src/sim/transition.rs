//! Animated level transitions
//!
//! - `Shockwave`: expanding ring started by the Weaken power-up (visual only,
//!   the hit reduction has already been applied)
//! - `PortalTransition`: next-level warp; every brick flies into a portal and
//!   normal gameplay is suspended until the warp completes

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Brick, BrickKind};
use crate::tuning::Tuning;

/// Expanding weaken ring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shockwave {
    pub origin: Vec2,
    pub radius: f32,
    pub max_radius: f32,
    pub speed: f32,
    pub thickness: f32,
    /// Bricks already flashed by the ring
    pub affected: Vec<u32>,
}

impl Shockwave {
    pub fn new(origin: Vec2, max_radius: f32, speed: f32, thickness: f32) -> Self {
        Self {
            origin,
            radius: 0.0,
            max_radius,
            speed,
            thickness,
            affected: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.radius >= self.max_radius
    }

    /// Grow the ring and flag bricks whose center lies inside it.
    ///
    /// Returns the ids flagged this frame.
    pub fn advance(&mut self, dt: f32, bricks: &[Brick]) -> Vec<u32> {
        self.radius = (self.radius + self.speed * dt).min(self.max_radius);
        let inner = (self.radius - self.thickness).max(0.0);

        let mut newly = Vec::new();
        for brick in bricks {
            if !brick.is_destructible() || self.affected.contains(&brick.id) {
                continue;
            }
            let dist = brick.center().distance(self.origin);
            if dist >= inner && dist <= self.radius {
                self.affected.push(brick.id);
                newly.push(brick.id);
            }
        }
        newly
    }
}

/// A brick being pulled into the portal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlyingBrick {
    pub source_id: u32,
    pub kind: BrickKind,
    pub hits: u8,
    pub size: Vec2,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Render scale, shrinks toward the portal
    pub scale: f32,
    start_dist: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PortalPhase {
    /// Bricks still in flight
    Pulling,
    /// All bricks consumed, white flash fading out
    Flash { elapsed: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalTransition {
    pub target: Vec2,
    pub flying: Vec<FlyingBrick>,
    /// Portal glow ramps up while pulling (0-1)
    pub glow: f32,
    /// Final white flash (0-1)
    pub flash: f32,
    pub phase: PortalPhase,
}

/// What happened during one portal frame
#[derive(Debug, Default)]
pub struct PortalStep {
    /// Positions where bricks were swallowed this frame
    pub consumed: Vec<Vec2>,
    /// The warp is over and the level should advance
    pub finished: bool,
}

impl PortalTransition {
    /// Turn every brick into a flying projectile aimed at `target`
    pub fn new(target: Vec2, bricks: &[Brick]) -> Self {
        let flying = bricks
            .iter()
            .map(|b| {
                let pos = b.center();
                FlyingBrick {
                    source_id: b.id,
                    kind: b.kind,
                    hits: b.hits_remaining,
                    size: b.rect.size,
                    pos,
                    vel: Vec2::ZERO,
                    scale: 1.0,
                    start_dist: pos.distance(target).max(1.0),
                }
            })
            .collect::<Vec<_>>();
        let phase = if flying.is_empty() {
            PortalPhase::Flash { elapsed: 0.0 }
        } else {
            PortalPhase::Pulling
        };
        let flash = if flying.is_empty() { 1.0 } else { 0.0 };
        Self {
            target,
            flying,
            glow: 0.0,
            flash,
            phase,
        }
    }

    pub fn advance(&mut self, dt: f32, tuning: &Tuning) -> PortalStep {
        let mut step = PortalStep::default();

        match self.phase {
            PortalPhase::Pulling => {
                self.glow = (self.glow + dt).min(1.0);
                let target = self.target;
                let capture = tuning.portal_capture_radius;

                self.flying.retain_mut(|fb| {
                    let to_portal = target - fb.pos;
                    let dist = to_portal.length();
                    if dist <= capture {
                        step.consumed.push(fb.pos);
                        return false;
                    }
                    let dir = to_portal / dist;
                    // Inverse-distance attraction plus constant drift
                    fb.vel += dir * (tuning.portal_pull / dist.max(capture)) * dt;
                    let travel = (fb.vel + dir * tuning.portal_drift) * dt;
                    if travel.length() >= dist - capture {
                        step.consumed.push(target);
                        return false;
                    }
                    fb.pos += travel;
                    fb.scale = (fb.pos.distance(target) / fb.start_dist).clamp(0.1, 1.0);
                    true
                });

                if self.flying.is_empty() {
                    self.phase = PortalPhase::Flash { elapsed: 0.0 };
                    self.flash = 1.0;
                }
            }
            PortalPhase::Flash { elapsed } => {
                let elapsed = elapsed + dt;
                let duration = tuning.portal_flash_secs.max(f32::EPSILON);
                self.flash = (1.0 - elapsed / duration).max(0.0);
                self.phase = PortalPhase::Flash { elapsed };
                step.finished = elapsed >= duration;
            }
        }

        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geom::Rect;

    fn grid() -> Vec<Brick> {
        (0..12)
            .map(|i| {
                let x = 40.0 + (i % 6) as f32 * 72.0;
                let y = 200.0 + (i / 6) as f32 * 28.0;
                Brick::new(i, Rect::new(x, y, 64.0, 22.0), BrickKind::Normal, 1)
            })
            .collect()
    }

    #[test]
    fn test_shockwave_flags_each_brick_once() {
        let bricks = grid();
        let mut wave = Shockwave::new(Vec2::new(400.0, 560.0), 1000.0, 650.0, 40.0);
        let mut seen = Vec::new();
        while !wave.is_finished() {
            seen.extend(wave.advance(1.0 / 120.0, &bricks));
        }
        assert_eq!(seen.len(), bricks.len());
        let mut ids = seen.clone();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), seen.len());
    }

    #[test]
    fn test_shockwave_skips_indestructible() {
        let bricks = vec![Brick::new(
            1,
            Rect::new(380.0, 500.0, 64.0, 22.0),
            BrickKind::Indestructible,
            1,
        )];
        let mut wave = Shockwave::new(Vec2::new(400.0, 560.0), 200.0, 650.0, 40.0);
        while !wave.is_finished() {
            assert!(wave.advance(1.0 / 120.0, &bricks).is_empty());
        }
    }

    #[test]
    fn test_portal_consumes_all_then_finishes() {
        let tuning = Tuning::default();
        let bricks = grid();
        let mut portal = PortalTransition::new(Vec2::new(400.0, 80.0), &bricks);
        let mut consumed = 0;
        let mut frames = 0;
        loop {
            let step = portal.advance(1.0 / 120.0, &tuning);
            consumed += step.consumed.len();
            frames += 1;
            if step.finished {
                break;
            }
            assert!(frames < 120 * 30, "portal never finished");
        }
        assert_eq!(consumed, bricks.len());
        assert!(portal.flying.is_empty());
        assert_eq!(portal.flash, 0.0);
    }

    #[test]
    fn test_flying_bricks_shrink_on_approach() {
        let tuning = Tuning::default();
        let bricks = grid();
        let mut portal = PortalTransition::new(Vec2::new(400.0, 80.0), &bricks);
        for _ in 0..10 {
            portal.advance(1.0 / 120.0, &tuning);
        }
        assert!(portal.flying.iter().all(|fb| fb.scale < 1.0));
    }

    #[test]
    fn test_empty_portal_goes_straight_to_flash() {
        let portal = PortalTransition::new(Vec2::new(400.0, 80.0), &[]);
        assert!(matches!(portal.phase, PortalPhase::Flash { .. }));
        assert_eq!(portal.flash, 1.0);
    }
}
