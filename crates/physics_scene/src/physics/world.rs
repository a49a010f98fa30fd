//! Simulation world
//!
//! Wraps a `rapier2d` pipeline behind handle-based operations and adds the
//! world's own destruction rules (lifetimes, sensor contact, world bounds).
//! Every structural change is queued as a [`PhysicsEvent`] and handed out by
//! [`SimulationWorld::drain_events`].

use std::collections::VecDeque;

use indexmap::IndexMap;
use rapier2d::prelude::*;
use thiserror::Error;

use crate::core::{SimulationConfig, WorldBounds};
use crate::foundation::math::{Transform2D, Vec2};
use crate::physics::{
    BodyHandle, BodyKind, BodySpec, DestroyCause, JointHandle, JointSpec, PhysicsEvent,
    ShapeHandle, ShapeSpec, Velocity,
};

/// Simulation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// The handle does not name a live body
    #[error("Unknown body {0:?}")]
    UnknownBody(BodyHandle),

    /// Shape parameters are unusable
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Joint parameters are unusable
    #[error("Invalid joint: {0}")]
    InvalidJoint(String),
}

/// Per-body destruction rules
#[derive(Debug, Clone, Copy)]
struct BodyRules {
    kind: BodyKind,
    ticks_left: Option<u32>,
    destroyed_by_sensors: bool,
}

/// Object counts, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorldCounts {
    /// Live bodies
    pub bodies: usize,
    /// Live shapes
    pub shapes: usize,
    /// Live joints
    pub joints: usize,
}

/// Deterministic fixed-step rigid-body world
pub struct SimulationWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    rules: IndexMap<BodyHandle, BodyRules>,
    joints: IndexMap<JointHandle, (BodyHandle, BodyHandle)>,
    bounds: Option<WorldBounds>,
    events: VecDeque<PhysicsEvent>,
    tick: u64,
}

impl SimulationWorld {
    /// Create an empty world
    pub fn new(config: &SimulationConfig) -> Self {
        let params = IntegrationParameters {
            dt: config.timestep(),
            ..IntegrationParameters::default()
        };

        log::debug!(
            "Simulation world created: gravity ({}, {}), {} Hz",
            config.gravity.x,
            config.gravity.y,
            config.tick_rate_hz
        );

        Self {
            gravity: vector![config.gravity.x, config.gravity.y],
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            rules: IndexMap::new(),
            joints: IndexMap::new(),
            bounds: config.bounds,
            events: VecDeque::new(),
            tick: 0,
        }
    }

    /// Fixed time step in seconds
    pub fn timestep(&self) -> f32 {
        self.params.dt
    }

    /// Number of completed steps
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current gravity
    pub fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity.x, self.gravity.y)
    }

    /// Change gravity for subsequent steps
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vector![gravity.x, gravity.y];
    }

    /// Advance the simulation by exactly one time step, then apply the
    /// destruction rules
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
        self.tick += 1;

        let doomed = self.collect_doomed();
        for (body, cause) in doomed {
            self.remove_body(body, cause);
        }
    }

    /// Create a body along with the shapes in its spec
    pub fn create_body(&mut self, spec: BodySpec) -> Result<BodyHandle, PhysicsError> {
        if !spec.transform.is_finite() {
            return Err(PhysicsError::InvalidShape("Body transform must be finite".to_string()));
        }
        let colliders = spec
            .shapes
            .iter()
            .map(ShapeSpec::to_collider)
            .collect::<Result<Vec<_>, _>>()?;

        let handle = BodyHandle(self.bodies.insert(spec.to_rigid_body()));
        for collider in colliders {
            self.colliders.insert_with_parent(collider, handle.0, &mut self.bodies);
        }

        self.rules.insert(
            handle,
            BodyRules {
                kind: spec.kind,
                ticks_left: spec.lifetime_ticks,
                destroyed_by_sensors: spec.destroyed_by_sensors,
            },
        );
        self.events.push_back(PhysicsEvent::BodyCreated(handle));
        log::trace!("Created {:?} body {:?}", spec.kind, handle);
        Ok(handle)
    }

    /// Attach a shape to an existing body
    pub fn attach_shape(&mut self, body: BodyHandle, shape: &ShapeSpec) -> Result<ShapeHandle, PhysicsError> {
        if !self.contains(body) {
            return Err(PhysicsError::UnknownBody(body));
        }
        let collider = shape.to_collider()?;
        Ok(ShapeHandle(self.colliders.insert_with_parent(collider, body.0, &mut self.bodies)))
    }

    /// Remove a shape; returns `false` if it was already gone
    pub fn detach_shape(&mut self, shape: ShapeHandle) -> bool {
        self.colliders
            .remove(shape.0, &mut self.islands, &mut self.bodies, true)
            .is_some()
    }

    /// Destroy a body with its shapes and joints
    ///
    /// Returns `false` (and does nothing) if the handle is stale.
    pub fn destroy_body(&mut self, body: BodyHandle) -> bool {
        self.remove_body(body, DestroyCause::Requested)
    }

    /// Check if a handle names a live body
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.bodies.contains(body.0)
    }

    /// Kind of a live body
    pub fn body_kind(&self, body: BodyHandle) -> Option<BodyKind> {
        self.rules.get(&body).map(|rules| rules.kind)
    }

    /// Current transform of a body in simulation units
    pub fn transform(&self, body: BodyHandle) -> Option<Transform2D> {
        self.bodies.get(body.0).map(|rb| {
            let translation = rb.translation();
            Transform2D::new(Vec2::new(translation.x, translation.y), rb.rotation().angle())
        })
    }

    /// Teleport a body
    pub fn set_transform(&mut self, body: BodyHandle, transform: Transform2D) -> Result<(), PhysicsError> {
        let rb = self.bodies.get_mut(body.0).ok_or(PhysicsError::UnknownBody(body))?;
        rb.set_translation(vector![transform.position.x, transform.position.y], true);
        rb.set_rotation(Rotation::new(transform.rotation), true);
        Ok(())
    }

    /// Current velocity of a body
    pub fn velocity(&self, body: BodyHandle) -> Option<Velocity> {
        self.bodies.get(body.0).map(|rb| {
            let linear = rb.linvel();
            Velocity::new(Vec2::new(linear.x, linear.y), rb.angvel())
        })
    }

    /// Overwrite a body's velocity
    pub fn set_velocity(&mut self, body: BodyHandle, velocity: Velocity) -> Result<(), PhysicsError> {
        let rb = self.bodies.get_mut(body.0).ok_or(PhysicsError::UnknownBody(body))?;
        rb.set_linvel(vector![velocity.linear.x, velocity.linear.y], true);
        rb.set_angvel(velocity.angular, true);
        Ok(())
    }

    /// Connect two bodies with a joint
    pub fn create_joint(&mut self, a: BodyHandle, b: BodyHandle, spec: &JointSpec) -> Result<JointHandle, PhysicsError> {
        for body in [a, b] {
            if !self.contains(body) {
                return Err(PhysicsError::UnknownBody(body));
            }
        }
        if a == b {
            return Err(PhysicsError::InvalidJoint("A joint needs two distinct bodies".to_string()));
        }

        let joint = spec.to_generic_joint()?;
        let handle = JointHandle(self.impulse_joints.insert(a.0, b.0, joint, true));
        self.joints.insert(handle, (a, b));
        Ok(handle)
    }

    /// Remove a joint; returns `false` if it was already gone
    pub fn destroy_joint(&mut self, joint: JointHandle) -> bool {
        if self.joints.shift_remove(&joint).is_none() {
            return false;
        }
        self.impulse_joints.remove(joint.0, true);
        self.events.push_back(PhysicsEvent::JointDestroyed(joint));
        true
    }

    /// Take every queued event, oldest first
    pub fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        self.events.drain(..).collect()
    }

    /// Live bodies in creation order
    pub fn bodies(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.rules.keys().copied()
    }

    /// Object counts
    pub fn counts(&self) -> WorldCounts {
        WorldCounts {
            bodies: self.bodies.len(),
            shapes: self.colliders.len(),
            joints: self.joints.len(),
        }
    }

    /// Destroy every body, shape and joint and discard pending events
    ///
    /// Returns the number of bodies removed.
    pub fn clear(&mut self) -> usize {
        let handles: Vec<BodyHandle> = self.rules.keys().copied().collect();
        for body in &handles {
            self.remove_body(*body, DestroyCause::Requested);
        }
        self.events.clear();
        handles.len()
    }

    fn collect_doomed(&mut self) -> Vec<(BodyHandle, DestroyCause)> {
        let mut doomed = Vec::new();

        for (handle, rules) in &mut self.rules {
            if let Some(ticks) = rules.ticks_left.as_mut() {
                *ticks = ticks.saturating_sub(1);
                if *ticks == 0 {
                    doomed.push((*handle, DestroyCause::LifetimeExpired));
                    continue;
                }
            }

            let Some(rb) = self.bodies.get(handle.0) else {
                continue;
            };

            if rules.destroyed_by_sensors && touches_sensor(&self.narrow_phase, &self.colliders, *handle, rb) {
                doomed.push((*handle, DestroyCause::SensorContact));
                continue;
            }

            if let Some(bounds) = &self.bounds {
                let position = rb.translation();
                if rules.kind != BodyKind::Fixed && !bounds.contains(Vec2::new(position.x, position.y)) {
                    doomed.push((*handle, DestroyCause::OutOfBounds));
                }
            }
        }

        doomed
    }

    fn remove_body(&mut self, body: BodyHandle, cause: DestroyCause) -> bool {
        if self.rules.shift_remove(&body).is_none() {
            return false;
        }

        let attached: Vec<JointHandle> = self
            .joints
            .iter()
            .filter(|(_, (a, b))| *a == body || *b == body)
            .map(|(handle, _)| *handle)
            .collect();
        for joint in attached {
            self.joints.shift_remove(&joint);
            self.events.push_back(PhysicsEvent::JointDestroyed(joint));
        }

        self.bodies.remove(
            body.0,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        self.events.push_back(PhysicsEvent::BodyDestroyed { body, cause });
        log::trace!("Destroyed body {:?} ({:?})", body, cause);
        true
    }
}

fn touches_sensor(narrow_phase: &NarrowPhase, colliders: &ColliderSet, body: BodyHandle, rb: &RigidBody) -> bool {
    rb.colliders().iter().any(|own| {
        narrow_phase
            .intersection_pairs_with(*own)
            .filter(|(_, _, intersecting)| *intersecting)
            .any(|(c1, c2, _)| {
                let other = if c1 == *own { c2 } else { c1 };
                colliders
                    .get(other)
                    .is_some_and(|collider| collider.is_sensor() && collider.parent() != Some(body.0))
            })
    })
}
