//! Structural events emitted by the simulation world

use crate::physics::{BodyHandle, JointHandle};

/// Why the world destroyed a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestroyCause {
    /// `destroy_body` was called
    Requested,
    /// The body's lifetime ran out
    LifetimeExpired,
    /// The body overlapped a sensor
    SensorContact,
    /// The body left the world bounds
    OutOfBounds,
}

/// Structural change in the world, queued until drained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsEvent {
    /// A body was created
    BodyCreated(BodyHandle),
    /// A body was destroyed
    BodyDestroyed {
        /// The (now stale) handle
        body: BodyHandle,
        /// What destroyed it
        cause: DestroyCause,
    },
    /// A joint was removed, either directly or with one of its bodies
    JointDestroyed(JointHandle),
}
