use rand::Rng;
use serde::{Deserialize, Serialize};

use super::vec2::Vec2;

/// Axis-aligned rectangle on the ground plane (inclusive bounds)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Build from two arbitrary opposite corners
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Centered rectangle of the given full extents
    pub fn centered(center: Vec2, width: f32, depth: f32) -> Self {
        let half = Vec2::new(width * 0.5, depth * 0.5);
        Self::from_corners(center - half, center + half)
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn center(&self) -> Vec2 {
        self.min.lerp(self.max, 0.5)
    }

    /// Uniformly random point inside the rectangle
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let x = if self.max.x > self.min.x {
            rng.gen_range(self.min.x..self.max.x)
        } else {
            self.min.x
        };
        let y = if self.max.y > self.min.y {
            rng.gen_range(self.min.y..self.max.y)
        } else {
            self.min.y
        };
        Vec2::new(x, y)
    }
}
