//! Level intake
//!
//! Level files are parsed elsewhere; the simulation only accepts the
//! resulting brick descriptors. `LevelLayout::generate` builds demo layouts
//! for headless runs and tests.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::boss::Boss;
use super::geom::Rect;
use super::state::{Brick, BrickKind, GamePhase, GameState};
use crate::consts::*;

/// Number of generated levels in a campaign
pub const CAMPAIGN_LEVELS: u32 = 6;
/// Every third generated level is a boss fight
const BOSS_EVERY: u32 = 3;

const GRID_COLUMNS: u32 = 10;
const GRID_TOP: f32 = 70.0;
const BOSS_GRID_TOP: f32 = 150.0;

/// One brick as produced by a level loader
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrickDescriptor {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub kind: BrickKind,
    pub hits: u8,
}

/// Validated description of a level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    /// 1-based level number
    pub number: u32,
    pub bricks: Vec<BrickDescriptor>,
    /// Spawn the boss
    pub boss: bool,
    /// Clearing this level completes the game
    pub final_level: bool,
}

impl LevelLayout {
    /// Build a demo grid for `level`.
    ///
    /// Rows grow with the level number, multi-hit bricks fill the top rows,
    /// explosives and indestructibles are scattered in, and from level 2 a
    /// row of moving bricks patrols below the grid.
    pub fn generate<R: Rng + ?Sized>(level: u32, rng: &mut R) -> Self {
        let level = level.max(1);
        let boss = level % BOSS_EVERY == 0;
        let rows = if boss { 3 } else { 4 + level.min(4) };
        let top = if boss { BOSS_GRID_TOP } else { GRID_TOP };

        let pitch_x = BRICK_WIDTH + BRICK_GAP_X;
        let pitch_y = BRICK_HEIGHT + BRICK_GAP_Y;
        let grid_width = GRID_COLUMNS as f32 * pitch_x - BRICK_GAP_X;
        let left = (ARENA_WIDTH - grid_width) / 2.0;

        let explosive_chance = 0.06 + 0.01 * level.min(6) as f32;
        let indestructible_chance = if level > 1 { 0.05 } else { 0.0 };

        let mut bricks = Vec::new();
        for row in 0..rows {
            // Top rows are tougher on later levels
            let hits = (1 + (level / 2).saturating_sub(row)).min(3) as u8;
            for col in 0..GRID_COLUMNS {
                let roll: f32 = rng.random();
                let kind = if roll < indestructible_chance {
                    BrickKind::Indestructible
                } else if roll < indestructible_chance + explosive_chance {
                    BrickKind::Explosive
                } else {
                    BrickKind::Normal
                };
                bricks.push(BrickDescriptor {
                    x: left + col as f32 * pitch_x,
                    y: top + row as f32 * pitch_y,
                    width: BRICK_WIDTH,
                    height: BRICK_HEIGHT,
                    kind,
                    hits: if kind == BrickKind::Normal { hits } else { 1 },
                });
            }
        }

        if level >= 2 {
            let y = top + (rows as f32 + 1.5) * pitch_y;
            let speed = 70.0 + 10.0 * level.min(8) as f32;
            for i in 0..3 {
                let direction = if i % 2 == 0 { 1.0 } else { -1.0 };
                bricks.push(BrickDescriptor {
                    x: 120.0 + i as f32 * 220.0,
                    y,
                    width: BRICK_WIDTH,
                    height: BRICK_HEIGHT,
                    kind: BrickKind::Moving {
                        velocity_x: speed * direction,
                        min_x: 0.0,
                        max_x: ARENA_WIDTH - BRICK_WIDTH,
                    },
                    hits: 1,
                });
            }
        }

        Self {
            number: level,
            bricks,
            boss,
            final_level: level >= CAMPAIGN_LEVELS,
        }
    }
}

impl GameState {
    /// Replace the playfield with `layout` and serve a fresh ball.
    ///
    /// Running effects are restored first, so nothing carries over.
    pub fn load_level(&mut self, layout: &LevelLayout) {
        self.clear_active_effects();

        let bricks: Vec<Brick> = layout
            .bricks
            .iter()
            .map(|d| {
                let id = self.next_entity_id();
                Brick::new(id, Rect::new(d.x, d.y, d.width, d.height), d.kind, d.hits)
            })
            .collect();
        self.bricks = bricks;
        self.boss = layout.boss.then(|| Boss::new(&self.tuning));

        self.level = layout.number;
        self.final_level = layout.final_level;
        self.bullets.clear();
        self.power_ups.clear();
        self.shockwave = None;
        self.portal = None;
        self.barrier_active = false;

        self.paddle.center_x = ARENA_WIDTH / 2.0;
        self.paddle.direction = 0.0;
        self.paddle.laser_cooldown = 0.0;
        self.balls.clear();
        self.spawn_ball_stuck();
        self.phase = GamePhase::Serve;
        self.normalize_order();

        log::info!(
            "loaded level {} ({} bricks{})",
            self.level,
            self.bricks.len(),
            if layout.boss { ", boss" } else { "" }
        );
    }
}
