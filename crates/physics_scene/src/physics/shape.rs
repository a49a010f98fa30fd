//! Collision shape descriptions
//!
//! Shapes are described in body-local space and turned into `rapier2d`
//! colliders when attached to a body.

use rapier2d::prelude::*;

use crate::foundation::math::{Transform2D, Vec2};
use crate::physics::PhysicsError;

/// Handle to a shape attached to a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub(crate) ColliderHandle);

/// Geometry of a collision shape
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Circle
    Ball {
        /// Radius
        radius: f32,
    },
    /// Box
    Cuboid {
        /// Half of the box width
        half_width: f32,
        /// Half of the box height
        half_height: f32,
    },
    /// Vertical capsule
    Capsule {
        /// Half the distance between the two cap centers
        half_height: f32,
        /// Cap radius
        radius: f32,
    },
    /// Convex hull of a point set
    ConvexPolygon {
        /// Hull vertices (any order)
        points: Vec<Vec2>,
    },
}

/// Full description of a collision shape
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeSpec {
    /// Geometry
    pub kind: ShapeKind,
    /// Placement relative to the body origin
    pub offset: Transform2D,
    /// Mass density
    pub density: f32,
    /// Friction coefficient
    pub friction: f32,
    /// Restitution (bounciness)
    pub restitution: f32,
    /// Sensors report overlaps but generate no contact forces
    pub sensor: bool,
}

impl ShapeSpec {
    fn with_kind(kind: ShapeKind) -> Self {
        Self {
            kind,
            offset: Transform2D::identity(),
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
            sensor: false,
        }
    }

    /// Circle shape
    pub fn ball(radius: f32) -> Self {
        Self::with_kind(ShapeKind::Ball { radius })
    }

    /// Box shape from half extents
    pub fn cuboid(half_width: f32, half_height: f32) -> Self {
        Self::with_kind(ShapeKind::Cuboid { half_width, half_height })
    }

    /// Vertical capsule shape
    pub fn capsule(half_height: f32, radius: f32) -> Self {
        Self::with_kind(ShapeKind::Capsule { half_height, radius })
    }

    /// Convex polygon shape
    pub fn convex_polygon(points: Vec<Vec2>) -> Self {
        Self::with_kind(ShapeKind::ConvexPolygon { points })
    }

    /// Set the body-local placement
    pub fn with_offset(mut self, x: f32, y: f32, rotation: f32) -> Self {
        self.offset = Transform2D::new(Vec2::new(x, y), rotation);
        self
    }

    /// Set density
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    /// Set friction
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// Set restitution
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    /// Turn this shape into a sensor
    pub fn as_sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    /// Check the shape parameters
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let positive = |value: f32| value.is_finite() && value > 0.0;

        match &self.kind {
            ShapeKind::Ball { radius } if !positive(*radius) => {
                return Err(PhysicsError::InvalidShape(format!("Ball radius must be positive, got {radius}")));
            }
            ShapeKind::Cuboid { half_width, half_height } if !positive(*half_width) || !positive(*half_height) => {
                return Err(PhysicsError::InvalidShape(format!(
                    "Cuboid half extents must be positive, got {half_width}x{half_height}"
                )));
            }
            ShapeKind::Capsule { half_height, radius } if !positive(*radius) || !(half_height.is_finite() && *half_height >= 0.0) => {
                return Err(PhysicsError::InvalidShape(format!(
                    "Capsule needs a positive radius and non-negative half height, got {radius} / {half_height}"
                )));
            }
            ShapeKind::ConvexPolygon { points } if points.len() < 3 => {
                return Err(PhysicsError::InvalidShape(format!(
                    "Convex polygon needs at least 3 points, got {}",
                    points.len()
                )));
            }
            _ => {}
        }

        if !self.offset.is_finite() {
            return Err(PhysicsError::InvalidShape("Shape offset must be finite".to_string()));
        }
        if !(self.density.is_finite() && self.density >= 0.0) {
            return Err(PhysicsError::InvalidShape(format!("Density must be non-negative, got {}", self.density)));
        }
        Ok(())
    }

    /// Build the rapier collider for this shape
    pub(crate) fn to_collider(&self) -> Result<Collider, PhysicsError> {
        self.validate()?;

        let builder = match &self.kind {
            ShapeKind::Ball { radius } => ColliderBuilder::ball(*radius),
            ShapeKind::Cuboid { half_width, half_height } => ColliderBuilder::cuboid(*half_width, *half_height),
            ShapeKind::Capsule { half_height, radius } => ColliderBuilder::capsule_y(*half_height, *radius),
            ShapeKind::ConvexPolygon { points } => {
                let hull: Vec<Point<Real>> = points.iter().map(|p| point![p.x, p.y]).collect();
                ColliderBuilder::convex_hull(&hull).ok_or_else(|| {
                    PhysicsError::InvalidShape("Convex polygon points are degenerate".to_string())
                })?
            }
        };

        Ok(builder
            .translation(vector![self.offset.position.x, self.offset.position.y])
            .rotation(self.offset.rotation)
            .density(self.density)
            .friction(self.friction)
            .restitution(self.restitution)
            .sensor(self.sensor)
            .build())
    }
}
