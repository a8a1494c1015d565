//! Spatial query boundary
//!
//! The simulation never raycasts itself. Spawn validity and ground snapping go
//! through a `SpatialQuery`; a miss is a normal "invalid point" answer.

use crate::util::rect::Rect;
use crate::util::vec2::Vec2;

pub trait SpatialQuery: Send + Sync {
    /// Height of the walkable surface under `point`, or None when nothing is hit
    fn surface_height(&self, point: Vec2) -> Option<f32>;
}

/// Flat walkable plane, optionally bounded
#[derive(Debug, Clone, Copy)]
pub struct FlatGround {
    pub height: f32,
    pub bounds: Option<Rect>,
}

impl FlatGround {
    /// Unbounded plane at `height`
    pub fn new(height: f32) -> Self {
        Self {
            height,
            bounds: None,
        }
    }

    pub fn bounded(height: f32, bounds: Rect) -> Self {
        Self {
            height,
            bounds: Some(bounds),
        }
    }
}

impl Default for FlatGround {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl SpatialQuery for FlatGround {
    fn surface_height(&self, point: Vec2) -> Option<f32> {
        match self.bounds {
            Some(bounds) if !bounds.contains(point) => None,
            _ => Some(self.height),
        }
    }
}
