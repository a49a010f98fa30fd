//! Conversion between simulation units and render units

use crate::foundation::math::{Transform2D, Vec2};

/// Per-axis factor from simulation units to render units
///
/// Derived from the scene's logical `(width, height)` and the simulation
/// extent those dimensions show. Rotation is the same in both spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    /// Render units per simulation unit, horizontally
    pub x: f32,
    /// Render units per simulation unit, vertically
    pub y: f32,
}

impl UnitScale {
    /// Scale that maps `extent` simulation units onto `width` x `height`
    pub fn from_dimensions(width: f32, height: f32, extent: Vec2) -> Self {
        Self {
            x: width / extent.x,
            y: height / extent.y,
        }
    }

    /// Same factor on both axes
    pub fn uniform(factor: f32) -> Self {
        Self { x: factor, y: factor }
    }

    /// Simulation vector to render vector
    #[inline]
    pub fn to_render(&self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.x, v.y * self.y)
    }

    /// Render vector to simulation vector
    #[inline]
    pub fn to_simulation(&self, v: Vec2) -> Vec2 {
        Vec2::new(v.x / self.x, v.y / self.y)
    }

    /// Simulation transform to render transform
    pub fn transform_to_render(&self, t: Transform2D) -> Transform2D {
        Transform2D::new(self.to_render(t.position), t.rotation)
    }

    /// Render transform to simulation transform
    pub fn transform_to_simulation(&self, t: Transform2D) -> Transform2D {
        Transform2D::new(self.to_simulation(t.position), t.rotation)
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}
