//! Physics module
//!
//! Rigid bodies, shapes and joints on top of `rapier2d`, addressed through
//! generational handles so that a destroyed object can never be reached
//! through a stale handle.

pub mod body;
pub mod shape;
pub mod joint;
pub mod events;
pub mod world;

pub use body::{BodyHandle, BodyKind, BodySpec, Velocity};
pub use shape::{ShapeHandle, ShapeKind, ShapeSpec};
pub use joint::{JointHandle, JointSpec};
pub use events::{DestroyCause, PhysicsEvent};
pub use world::{PhysicsError, SimulationWorld, WorldCounts};
