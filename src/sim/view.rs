//! Read-only frame snapshot for renderers
//!
//! Plain data only, so a renderer (or a test, or a remote viewer) never
//! needs to touch simulation types.

use glam::Vec2;
use serde::Serialize;

use super::geom::Rect;
use super::powerup::PowerUpKind;
use super::state::{BrickKind, GamePhase, GameState, ParticleKind};
use crate::settings::Settings;

#[derive(Debug, Clone, Serialize)]
pub struct BallView {
    pub pos: Vec2,
    pub radius: f32,
    pub fireball: bool,
    pub stuck: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrickView {
    pub id: u32,
    pub rect: Rect,
    pub kind: BrickKind,
    pub hits: u8,
    /// Currently lit by the weaken ring
    pub flashing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaddleView {
    pub rect: Rect,
    pub has_laser: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BossView {
    pub rect: Rect,
    pub health: u32,
    pub max_health: u32,
    pub hit_flash: f32,
    pub bullets: Vec<Rect>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PowerUpView {
    pub kind: PowerUpKind,
    pub rect: Rect,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectView {
    pub kind: PowerUpKind,
    pub remaining_secs: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShockwaveView {
    pub origin: Vec2,
    pub radius: f32,
    pub thickness: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlyingBrickView {
    pub pos: Vec2,
    pub size: Vec2,
    pub scale: f32,
    pub kind: BrickKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalView {
    pub target: Vec2,
    pub glow: f32,
    pub flash: f32,
    pub flying: Vec<FlyingBrickView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticleView {
    pub pos: Vec2,
    pub size: f32,
    pub life: f32,
    pub kind: ParticleKind,
}

/// Everything a renderer draws for one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameView {
    pub phase: GamePhase,
    pub level: u32,
    pub score: u64,
    pub lives: u8,
    pub balls: Vec<BallView>,
    pub bricks: Vec<BrickView>,
    pub paddle: PaddleView,
    pub bullets: Vec<Rect>,
    pub boss: Option<BossView>,
    pub power_ups: Vec<PowerUpView>,
    pub effects: Vec<EffectView>,
    pub barrier: bool,
    pub shockwave: Option<ShockwaveView>,
    pub portal: Option<PortalView>,
    pub particles: Vec<ParticleView>,
    pub screen_shake: f32,
    pub flash: f32,
}

impl GameState {
    /// Snapshot everything a renderer needs
    pub fn view(&self) -> FrameView {
        let ring = self.shockwave.as_ref();
        FrameView {
            phase: self.phase,
            level: self.level,
            score: self.score(),
            lives: self.lives,
            balls: self
                .balls
                .iter()
                .map(|(_, b)| BallView {
                    pos: b.pos,
                    radius: b.radius,
                    fireball: b.fireball,
                    stuck: b.stuck_to_paddle,
                })
                .collect(),
            bricks: self
                .bricks
                .iter()
                .map(|b| BrickView {
                    id: b.id,
                    rect: b.rect,
                    kind: b.kind,
                    hits: b.hits_remaining,
                    flashing: ring.is_some_and(|w| w.affected.contains(&b.id)),
                })
                .collect(),
            paddle: PaddleView {
                rect: self.paddle.rect(),
                has_laser: self.paddle.has_laser,
            },
            bullets: self.bullets.iter().map(|b| b.rect).collect(),
            boss: self.boss.as_ref().filter(|b| b.is_alive()).map(|b| BossView {
                rect: b.rect,
                health: b.health,
                max_health: b.max_health,
                hit_flash: b.hit_flash,
                bullets: b.bullets.iter().map(|bullet| bullet.rect).collect(),
            }),
            power_ups: self
                .power_ups
                .iter()
                .map(|p| PowerUpView {
                    kind: p.kind,
                    rect: p.rect(),
                })
                .collect(),
            effects: self
                .effects
                .active()
                .iter()
                .map(|e| EffectView {
                    kind: e.kind,
                    remaining_secs: e.remaining_secs,
                })
                .collect(),
            barrier: self.barrier_active,
            shockwave: ring.map(|w| ShockwaveView {
                origin: w.origin,
                radius: w.radius,
                thickness: w.thickness,
            }),
            portal: self.portal.as_ref().map(|p| PortalView {
                target: p.target,
                glow: p.glow,
                flash: p.flash,
                flying: p
                    .flying
                    .iter()
                    .map(|f| FlyingBrickView {
                        pos: f.pos,
                        size: f.size,
                        scale: f.scale,
                        kind: f.kind,
                    })
                    .collect(),
            }),
            particles: self
                .particles
                .iter()
                .map(|p| ParticleView {
                    pos: p.pos,
                    size: p.size,
                    life: p.life,
                    kind: p.kind,
                })
                .collect(),
            screen_shake: self.screen_shake,
            flash: self.flash,
        }
    }

    /// Snapshot with the player's comfort settings applied. Shake, flashes
    /// and particles are presentation only, so the simulation is untouched.
    pub fn view_with(&self, settings: &Settings) -> FrameView {
        let mut view = self.view();
        if !settings.effective_screen_shake() {
            view.screen_shake = 0.0;
        }
        if !settings.effective_flashes() {
            view.flash = 0.0;
            if let Some(portal) = view.portal.as_mut() {
                portal.flash = 0.0;
            }
        }
        if !settings.particles {
            view.particles.clear();
        }
        view
    }
}
