//! Chain-reaction propagation across explosive bricks
//!
//! Breadth-first search over the brick set. Adjacency is measured in grid
//! cells of one brick pitch (size + gap) with a tolerance window, so bricks
//! that drifted off the grid (moving bricks, uneven layouts) still connect.

use std::collections::{HashSet, VecDeque};

use glam::Vec2;

use super::events::GameEvent;
use super::geom::Rect;
use super::state::{Brick, GameState, ParticleKind};
use crate::consts::{BRICK_GAP_X, BRICK_GAP_Y};

/// Blast geometry around one exploding brick
#[derive(Debug, Clone, Copy)]
pub struct BlastShape {
    pub gap: Vec2,
    /// Fraction of brick size tolerated as grid misalignment
    pub tolerance: f32,
    /// Cardinal reach in cells
    pub reach: u32,
}

impl Default for BlastShape {
    fn default() -> Self {
        Self {
            gap: Vec2::new(BRICK_GAP_X, BRICK_GAP_Y),
            tolerance: 0.6,
            reach: 2,
        }
    }
}

impl BlastShape {
    /// Is `other` at grid offset `cell` from an exploder at `origin`?
    fn at_cell(&self, origin: &Rect, other: &Rect, cell: (i32, i32)) -> bool {
        let pitch = origin.size + self.gap;
        let window = origin.size * self.tolerance;
        let delta = other.center() - origin.center();
        (delta.x - cell.0 as f32 * pitch.x).abs() <= window.x
            && (delta.y - cell.1 as f32 * pitch.y).abs() <= window.y
    }
}

const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const CARDINALS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Compute the ids of every brick consumed by an explosion started at `seed`.
///
/// `bricks` is the live set (the seed itself may or may not be present; it is
/// never part of the result). Indestructible bricks are never consumed and do
/// not carry the chain.
pub fn propagate(seed: &Brick, bricks: &[Brick], shape: &BlastShape) -> Vec<u32> {
    let mut removal = Vec::new();
    let mut visited: HashSet<u32> = HashSet::new();
    visited.insert(seed.id);

    let mut queue: VecDeque<Rect> = VecDeque::new();
    queue.push_back(seed.rect);

    while let Some(origin) = queue.pop_front() {
        for brick in bricks {
            if !brick.is_destructible() || visited.contains(&brick.id) {
                continue;
            }

            let chained = brick.is_explosive()
                && NEIGHBORS_8
                    .iter()
                    .any(|&cell| shape.at_cell(&origin, &brick.rect, cell));

            let in_blast = (1..=shape.reach as i32).any(|k| {
                CARDINALS
                    .iter()
                    .any(|&(dx, dy)| shape.at_cell(&origin, &brick.rect, (dx * k, dy * k)))
            });

            if chained || in_blast {
                visited.insert(brick.id);
                removal.push(brick.id);
                if brick.is_explosive() {
                    queue.push_back(brick.rect);
                }
            }
        }
    }

    removal
}

impl GameState {
    /// Detonate an explosive brick that has just been destroyed.
    ///
    /// Removes the whole chain, scoring each brick, and fires one shake and
    /// flash pulse for the event. Returns the number of extra bricks removed.
    pub(crate) fn detonate(&mut self, seed: &Brick) -> u32 {
        let shape = BlastShape {
            tolerance: self.tuning.explosion_tolerance,
            reach: self.tuning.explosion_reach,
            ..BlastShape::default()
        };
        let removal = propagate(seed, &self.bricks, &shape);
        let removal_set: HashSet<u32> = removal.iter().copied().collect();

        let mut centers = vec![seed.center()];
        centers.extend(
            self.bricks
                .iter()
                .filter(|b| removal_set.contains(&b.id))
                .map(|b| b.center()),
        );
        self.bricks.retain(|b| !removal_set.contains(&b.id));

        for &center in &centers {
            self.burst(center, 16, ParticleKind::Explosion, 220.0);
        }
        for &id in &removal {
            self.add_score(self.tuning.destroy_score);
            self.emit(GameEvent::BrickBreak { brick_id: id });
        }

        self.add_shake(self.tuning.explosion_shake);
        self.pulse_flash(self.tuning.explosion_flash);
        self.emit(GameEvent::Explosion {
            bricks_destroyed: removal.len() as u32 + 1,
        });
        log::debug!(
            "explosion at brick {} consumed {} more bricks",
            seed.id,
            removal.len()
        );
        removal.len() as u32
    }
}
