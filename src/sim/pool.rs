//! Arena-style ball storage with generational handles
//!
//! Effect snapshots refer to balls through `BallId`. A slot freed by a lost
//! ball gets a new generation before reuse, so a stale handle can never
//! resolve to a newer ball.

use serde::{Deserialize, Serialize};

use super::state::Ball;

/// Stable handle to a ball slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BallId {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    ball: Option<Ball>,
}

/// Owning collection of all balls in play
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BallPool {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl BallPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ball: Ball) -> BallId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.ball = Some(ball);
            BallId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                ball: Some(ball),
            });
            BallId {
                index,
                generation: 0,
            }
        }
    }

    pub fn remove(&mut self, id: BallId) -> Option<Ball> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let ball = slot.ball.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(ball)
    }

    pub fn get(&self, id: BallId) -> Option<&Ball> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.ball.as_ref())
    }

    pub fn get_mut(&mut self, id: BallId) -> Option<&mut Ball> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.ball.as_mut())
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.ball.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.ball.is_none())
    }

    /// Live balls in slot order
    pub fn iter(&self) -> impl Iterator<Item = (BallId, &Ball)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.ball.as_ref().map(|b| {
                (
                    BallId {
                        index: i as u32,
                        generation: s.generation,
                    },
                    b,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BallId, &mut Ball)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            let generation = s.generation;
            s.ball.as_mut().map(|b| {
                (
                    BallId {
                        index: i as u32,
                        generation,
                    },
                    b,
                )
            })
        })
    }

    pub fn ids(&self) -> Vec<BallId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Remove every ball, invalidating all outstanding handles
    pub fn clear(&mut self) {
        for id in self.ids() {
            self.remove(id);
        }
    }
}
