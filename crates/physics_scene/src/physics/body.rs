//! Rigid body handles and descriptions

use rapier2d::prelude::*;

use crate::foundation::math::{Transform2D, Vec2};
use crate::physics::ShapeSpec;

/// Generational handle to a body in a [`SimulationWorld`](crate::physics::SimulationWorld)
///
/// A handle outlives the body it names; once the body is destroyed every
/// lookup through the handle returns `None`, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) RigidBodyHandle);

impl BodyHandle {
    /// Build a handle from raw index and generation
    pub(crate) fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self(RigidBodyHandle::from_raw_parts(index, generation))
    }
}

/// How a body takes part in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyKind {
    /// Moved by forces, gravity and contacts
    #[default]
    Dynamic,
    /// Moved only by its velocity, which the caller sets
    Kinematic,
    /// Never moves
    Fixed,
}

/// Body velocity in simulation units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    /// Linear velocity (units per second)
    pub linear: Vec2,
    /// Angular velocity (radians per second)
    pub angular: f32,
}

impl Velocity {
    /// Create a velocity
    pub fn new(linear: Vec2, angular: f32) -> Self {
        Self { linear, angular }
    }
}

/// Description of a body to create
#[derive(Debug, Clone, PartialEq)]
pub struct BodySpec {
    /// Simulation behavior
    pub kind: BodyKind,
    /// Initial transform in simulation units
    pub transform: Transform2D,
    /// Initial velocity
    pub velocity: Velocity,
    /// Multiplier on world gravity
    pub gravity_scale: f32,
    /// Linear damping
    pub linear_damping: f32,
    /// Angular damping
    pub angular_damping: f32,
    /// Prevent rotation
    pub fixed_rotation: bool,
    /// Continuous collision detection for fast movers
    pub ccd: bool,
    /// Shapes created together with the body
    pub shapes: Vec<ShapeSpec>,
    /// Destroy the body after this many ticks
    pub lifetime_ticks: Option<u32>,
    /// Destroy the body when one of its shapes touches a sensor
    pub destroyed_by_sensors: bool,
}

impl BodySpec {
    /// Create a spec of the given kind at the origin
    pub fn new(kind: BodyKind) -> Self {
        Self {
            kind,
            transform: Transform2D::identity(),
            velocity: Velocity::default(),
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            fixed_rotation: false,
            ccd: false,
            shapes: Vec::new(),
            lifetime_ticks: None,
            destroyed_by_sensors: false,
        }
    }

    /// Dynamic body
    pub fn dynamic() -> Self {
        Self::new(BodyKind::Dynamic)
    }

    /// Kinematic body
    pub fn kinematic() -> Self {
        Self::new(BodyKind::Kinematic)
    }

    /// Fixed body
    pub fn fixed() -> Self {
        Self::new(BodyKind::Fixed)
    }

    /// Set the initial position
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.transform.position = Vec2::new(x, y);
        self
    }

    /// Set the initial rotation in radians
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.transform.rotation = rotation;
        self
    }

    /// Set the initial transform
    pub fn with_transform(mut self, transform: Transform2D) -> Self {
        self.transform = transform;
        self
    }

    /// Set the initial velocity
    pub fn with_velocity(mut self, linear: Vec2, angular: f32) -> Self {
        self.velocity = Velocity::new(linear, angular);
        self
    }

    /// Set the gravity multiplier
    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Set linear and angular damping
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Lock rotation
    pub fn with_fixed_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }

    /// Enable continuous collision detection
    pub fn with_ccd(mut self) -> Self {
        self.ccd = true;
        self
    }

    /// Add a shape
    pub fn with_shape(mut self, shape: ShapeSpec) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Destroy the body after `ticks` simulation steps
    pub fn with_lifetime(mut self, ticks: u32) -> Self {
        self.lifetime_ticks = Some(ticks);
        self
    }

    /// Destroy the body when it overlaps a sensor shape
    pub fn destroyed_by_sensors(mut self) -> Self {
        self.destroyed_by_sensors = true;
        self
    }

    pub(crate) fn to_rigid_body(&self) -> RigidBody {
        let builder = match self.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
        };

        let position = self.transform.position;
        let mut builder = builder
            .pose(Isometry::new(vector![position.x, position.y], self.transform.rotation))
            .linvel(vector![self.velocity.linear.x, self.velocity.linear.y])
            .angvel(self.velocity.angular)
            .gravity_scale(self.gravity_scale)
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .ccd_enabled(self.ccd);

        if self.fixed_rotation {
            builder = builder.lock_rotations();
        }

        builder.build()
    }
}
