//! Axis-aligned geometry for bricks, paddle, bullets and boss
//!
//! Screen convention: origin at the arena's top-left, y grows downward.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle stored as top-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            min: center - size * 0.5,
            size,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.min.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.min.y + self.size.y
    }

    /// Strict AABB overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.min += delta;
    }
}

/// Overlap of a ball against a rectangle on each axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    /// Positive overlap depth per axis
    pub depth: Vec2,
    /// Ball center minus rectangle center
    pub delta: Vec2,
}

impl Penetration {
    /// Axis with the smaller overlap; `None` on an exact tie (corner hit)
    pub fn normal_axis(&self) -> Option<Axis> {
        if self.depth.x < self.depth.y {
            Some(Axis::X)
        } else if self.depth.y < self.depth.x {
            Some(Axis::Y)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Penetration test of a ball (treated as its bounding square) against a rect.
///
/// Depth per axis is `half_extent + radius - |center delta|`; no overlap on
/// either axis means no collision.
pub fn circle_rect_penetration(center: Vec2, radius: f32, rect: &Rect) -> Option<Penetration> {
    let delta = center - rect.center();
    let half = rect.half_extents();
    let depth = Vec2::new(
        half.x + radius - delta.x.abs(),
        half.y + radius - delta.y.abs(),
    );
    if depth.x <= 0.0 || depth.y <= 0.0 {
        return None;
    }
    Some(Penetration { depth, delta })
}

/// Which face of a rectangle was struck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// Find the side of `target` that `mover` entered through.
///
/// Computes the four edge-penetration depths and picks the smallest; returns
/// `None` when the rectangles do not overlap.
pub fn entry_side(mover: &Rect, target: &Rect) -> Option<(Side, f32)> {
    let depths = [
        (Side::Left, mover.right() - target.left()),
        (Side::Right, target.right() - mover.left()),
        (Side::Top, mover.bottom() - target.top()),
        (Side::Bottom, target.bottom() - mover.top()),
    ];
    if depths.iter().any(|&(_, d)| d <= 0.0) {
        return None;
    }
    depths
        .into_iter()
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}
