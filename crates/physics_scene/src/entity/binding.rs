//! Binding records between game objects, bodies and nodes

use crate::entity::GameObjectId;
use crate::physics::BodyHandle;
use crate::scene::NodeHandle;

/// Which side of a binding is authoritative for the transform each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncMode {
    /// Physics is the source of truth; the node follows the body
    #[default]
    BodyDrivesNode,
    /// The node is the source of truth; the body follows (kinematic, scripted, dragged)
    NodeDrivesBody,
    /// Neither side is touched
    Unsynced,
}

/// What happens to a body's velocity when a node drives it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VelocityPolicy {
    /// Teleport the body and keep its current velocity
    #[default]
    Preserve,
    /// Set velocity from the transform delta over one tick
    DeriveFromDelta,
}

/// Registry record for one game object
///
/// At least one of `body` and `node` is always present; the registry drops
/// the record the moment both become absent.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBinding {
    pub(super) id: GameObjectId,
    pub(super) body: Option<BodyHandle>,
    pub(super) node: Option<NodeHandle>,
    pub(super) mode: SyncMode,
    pub(super) velocity: VelocityPolicy,
}

impl EntityBinding {
    /// Game object this binding belongs to
    pub fn id(&self) -> GameObjectId {
        self.id
    }

    /// Bound simulation body, if any
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Bound scene node, if any
    pub fn node(&self) -> Option<NodeHandle> {
        self.node
    }

    /// Synchronization direction
    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// Velocity handling for node-driven bodies
    pub fn velocity_policy(&self) -> VelocityPolicy {
        self.velocity
    }

    /// Both sides present
    pub fn is_complete(&self) -> bool {
        self.body.is_some() && self.node.is_some()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.body.is_none() && self.node.is_none()
    }
}
