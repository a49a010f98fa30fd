//! Math utilities and types
//!
//! Provides the 2D math types shared by the simulation and the scene graph.
//! [`Transform2D`] is the only value that crosses between the two subsystems.

pub use nalgebra::{Vector2, Rotation2};

use serde::{Serialize, Deserialize};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Rigid 2D transform: translation plus a rotation angle in radians
///
/// There is deliberately no scale component. Simulation space and render
/// space differ only by a per-axis unit scale, which is applied by the
/// synchronization layer rather than stored on the transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    /// Position
    pub position: Vec2,

    /// Rotation in radians (counter-clockwise)
    pub rotation: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            rotation: 0.0,
        }
    }
}

impl Transform2D {
    /// Create a new transform
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Create an identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            rotation: 0.0,
        }
    }

    /// Rotate a vector by this transform's rotation
    pub fn rotate_vector(&self, vector: Vec2) -> Vec2 {
        Rotation2::new(self.rotation) * vector
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        self.position + self.rotate_vector(point)
    }

    /// Compose a child transform expressed in this transform's space
    ///
    /// `parent.combine(&local)` yields the child's transform in the parent's
    /// parent space, which is how world transforms are built down the tree.
    pub fn combine(&self, child: &Transform2D) -> Transform2D {
        Transform2D {
            position: self.transform_point(child.position),
            rotation: utils::wrap_angle(self.rotation + child.rotation),
        }
    }

    /// Get the inverse transform
    pub fn inverse(&self) -> Transform2D {
        let inv_rotation = -self.rotation;
        Transform2D {
            position: Rotation2::new(inv_rotation) * -self.position,
            rotation: inv_rotation,
        }
    }

    /// Interpolate between two transforms
    ///
    /// Rotation takes the shortest arc, so blending across the ±π seam does
    /// not spin the long way round.
    pub fn lerp(&self, other: &Transform2D, t: f32) -> Transform2D {
        let delta = utils::wrap_angle(other.rotation - self.rotation);
        Transform2D {
            position: self.position.lerp(&other.position, t),
            rotation: utils::wrap_angle(self.rotation + delta * t),
        }
    }

    /// Check that every component is finite
    pub fn is_finite(&self) -> bool {
        self.position.x.is_finite() && self.position.y.is_finite() && self.rotation.is_finite()
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = std::f32::consts::TAU;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Wrap an angle into `(-π, π]`
    pub fn wrap_angle(angle: f32) -> f32 {
        if angle > -constants::PI && angle <= constants::PI {
            return angle;
        }
        let wrapped = (angle + constants::PI).rem_euclid(constants::TAU) - constants::PI;
        if wrapped <= -constants::PI {
            wrapped + constants::TAU
        } else {
            wrapped
        }
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_combine_translates_and_rotates_child() {
        let parent = Transform2D::new(Vec2::new(10.0, 0.0), constants::HALF_PI);
        let child = Transform2D::from_position(1.0, 0.0);

        let world = parent.combine(&child);

        assert_relative_eq!(world.position.x, 10.0, epsilon = 1e-5);
        assert_relative_eq!(world.position.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(world.rotation, constants::HALF_PI, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_undoes_combine() {
        let t = Transform2D::new(Vec2::new(3.0, -2.0), 0.7);
        let identity = t.combine(&t.inverse());

        assert_relative_eq!(identity.position.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(identity.position.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(identity.rotation, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_lerp_takes_shortest_arc() {
        let a = Transform2D::new(Vec2::zeros(), constants::PI - 0.1);
        let b = Transform2D::new(Vec2::new(2.0, 2.0), -constants::PI + 0.1);

        let mid = a.lerp(&b, 0.5);

        assert_relative_eq!(mid.position.x, 1.0);
        assert_relative_eq!(mid.rotation.abs(), constants::PI, epsilon = 1e-5);
    }

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(utils::wrap_angle(0.5), 0.5);
        assert_relative_eq!(utils::wrap_angle(constants::TAU + 0.5), 0.5, epsilon = 1e-5);
        assert_relative_eq!(utils::wrap_angle(-constants::TAU - 0.5), -0.5, epsilon = 1e-5);
        assert_relative_eq!(utils::wrap_angle(-constants::PI), constants::PI, epsilon = 1e-6);
    }
}
