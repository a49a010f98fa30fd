//! Entity registry - the relation table between game objects, bodies and nodes
//!
//! The registry never owns a body or a node. It only records which handles
//! belong to which game object, so the simulation world and the scene graph
//! can each free their own memory while the registry is kept consistent by
//! whoever performs the destroy.

use std::collections::HashMap;

use indexmap::IndexMap;
use slotmap::SparseSecondaryMap;
use thiserror::Error;

use crate::entity::{EntityBinding, GameObjectId, SyncMode, VelocityPolicy};
use crate::physics::BodyHandle;
use crate::scene::NodeHandle;

/// Registry errors
///
/// All of these are caller contract violations; nothing is inserted when
/// one is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// The game object already has a binding
    #[error("{0} already has a binding")]
    DuplicateBinding(GameObjectId),

    /// Neither a body nor a node was supplied
    #[error("Binding for {0} needs a body or a node")]
    EmptyBinding(GameObjectId),

    /// The game object has no binding to modify
    #[error("{0} has no binding")]
    NotBound(GameObjectId),

    /// The body already belongs to another game object
    #[error("Body {body:?} is already bound to {owner}")]
    BodyAlreadyBound {
        /// Contested body
        body: BodyHandle,
        /// Current owner
        owner: GameObjectId,
    },

    /// The node already belongs to another game object
    #[error("Node {node:?} is already bound to {owner}")]
    NodeAlreadyBound {
        /// Contested node
        node: NodeHandle,
        /// Current owner
        owner: GameObjectId,
    },
}

/// What an unbind call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unbound {
    /// The side was already absent (or the id unknown); nothing changed
    Nothing,
    /// The side was cleared and the other side is still bound
    Side,
    /// The side was cleared and the binding was removed
    Binding,
}

/// Maps game objects to at most one body and at most one node
///
/// Iteration follows insertion order so that synchronization visits bindings
/// identically on every run.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    bindings: IndexMap<GameObjectId, EntityBinding>,
    by_body: HashMap<BodyHandle, GameObjectId>,
    by_node: SparseSecondaryMap<NodeHandle, GameObjectId>,
}

impl EntityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a game object to a body and/or a node
    pub fn bind(
        &mut self,
        id: GameObjectId,
        body: Option<BodyHandle>,
        node: Option<NodeHandle>,
        mode: SyncMode,
    ) -> Result<&EntityBinding, RegistryError> {
        if self.bindings.contains_key(&id) {
            return Err(RegistryError::DuplicateBinding(id));
        }
        if body.is_none() && node.is_none() {
            return Err(RegistryError::EmptyBinding(id));
        }
        if let Some(body) = body {
            self.check_body_free(body)?;
        }
        if let Some(node) = node {
            self.check_node_free(node)?;
        }

        if let Some(body) = body {
            self.by_body.insert(body, id);
        }
        if let Some(node) = node {
            self.by_node.insert(node, id);
        }

        log::trace!("Bound {} (body: {:?}, node: {:?}, mode: {:?})", id, body, node, mode);
        let entry = self.bindings.entry(id).or_insert(EntityBinding {
            id,
            body,
            node,
            mode,
            velocity: VelocityPolicy::default(),
        });
        Ok(&*entry)
    }

    /// Attach a body to an existing binding that has none
    ///
    /// Replaces nothing: if the binding already has a body this is a
    /// [`RegistryError::BodyAlreadyBound`] naming the current owner.
    pub fn attach_body(&mut self, id: GameObjectId, body: BodyHandle) -> Result<(), RegistryError> {
        self.check_body_free(body)?;
        let binding = self.bindings.get_mut(&id).ok_or(RegistryError::NotBound(id))?;
        if let Some(existing) = binding.body {
            return Err(RegistryError::BodyAlreadyBound { body: existing, owner: id });
        }
        binding.body = Some(body);
        self.by_body.insert(body, id);
        Ok(())
    }

    /// Attach a node to an existing binding that has none
    pub fn attach_node(&mut self, id: GameObjectId, node: NodeHandle) -> Result<(), RegistryError> {
        self.check_node_free(node)?;
        let binding = self.bindings.get_mut(&id).ok_or(RegistryError::NotBound(id))?;
        if let Some(existing) = binding.node {
            return Err(RegistryError::NodeAlreadyBound { node: existing, owner: id });
        }
        binding.node = Some(node);
        self.by_node.insert(node, id);
        Ok(())
    }

    /// Clear the body side of a binding
    ///
    /// Idempotent: unbinding an absent side or an unknown id does nothing.
    pub fn unbind_body(&mut self, id: GameObjectId) -> Unbound {
        let Some(binding) = self.bindings.get_mut(&id) else {
            return Unbound::Nothing;
        };
        let Some(body) = binding.body.take() else {
            return Unbound::Nothing;
        };
        self.by_body.remove(&body);
        self.remove_if_empty(id)
    }

    /// Clear the node side of a binding
    ///
    /// Idempotent: unbinding an absent side or an unknown id does nothing.
    pub fn unbind_node(&mut self, id: GameObjectId) -> Unbound {
        let Some(binding) = self.bindings.get_mut(&id) else {
            return Unbound::Nothing;
        };
        let Some(node) = binding.node.take() else {
            return Unbound::Nothing;
        };
        self.by_node.remove(node);
        self.remove_if_empty(id)
    }

    /// Remove a binding entirely, returning it
    pub fn remove(&mut self, id: GameObjectId) -> Option<EntityBinding> {
        let binding = self.bindings.shift_remove(&id)?;
        if let Some(body) = binding.body {
            self.by_body.remove(&body);
        }
        if let Some(node) = binding.node {
            self.by_node.remove(node);
        }
        Some(binding)
    }

    /// Look up a binding
    pub fn lookup(&self, id: GameObjectId) -> Option<&EntityBinding> {
        self.bindings.get(&id)
    }

    /// Find the game object owning a body
    pub fn id_for_body(&self, body: BodyHandle) -> Option<GameObjectId> {
        self.by_body.get(&body).copied()
    }

    /// Find the game object owning a node
    pub fn id_for_node(&self, node: NodeHandle) -> Option<GameObjectId> {
        self.by_node.get(node).copied()
    }

    /// Iterate bindings with the given mode in insertion order
    ///
    /// The iterator is lazy and borrows the registry; call again (or clone
    /// the iterator) to restart.
    pub fn for_each_bound(&self, mode: SyncMode) -> impl Iterator<Item = &EntityBinding> + Clone + '_ {
        self.bindings.values().filter(move |binding| binding.mode == mode)
    }

    /// Iterate every binding in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &EntityBinding> + '_ {
        self.bindings.values()
    }

    /// Change the synchronization mode of a binding
    pub fn set_mode(&mut self, id: GameObjectId, mode: SyncMode) -> Result<(), RegistryError> {
        let binding = self.bindings.get_mut(&id).ok_or(RegistryError::NotBound(id))?;
        binding.mode = mode;
        Ok(())
    }

    /// Change how node-driven bodies treat velocity
    pub fn set_velocity_policy(&mut self, id: GameObjectId, policy: VelocityPolicy) -> Result<(), RegistryError> {
        let binding = self.bindings.get_mut(&id).ok_or(RegistryError::NotBound(id))?;
        binding.velocity = policy;
        Ok(())
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if there are no bindings
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Remove every binding
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.by_body.clear();
        self.by_node.clear();
    }

    fn check_body_free(&self, body: BodyHandle) -> Result<(), RegistryError> {
        match self.by_body.get(&body) {
            Some(&owner) => Err(RegistryError::BodyAlreadyBound { body, owner }),
            None => Ok(()),
        }
    }

    fn check_node_free(&self, node: NodeHandle) -> Result<(), RegistryError> {
        match self.by_node.get(node) {
            Some(&owner) => Err(RegistryError::NodeAlreadyBound { node, owner }),
            None => Ok(()),
        }
    }

    fn remove_if_empty(&mut self, id: GameObjectId) -> Unbound {
        if self.bindings.get(&id).is_some_and(EntityBinding::is_empty) {
            self.bindings.shift_remove(&id);
            log::trace!("Removed empty binding for {}", id);
            Unbound::Binding
        } else {
            Unbound::Side
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::IdAllocator;
    use slotmap::SlotMap;

    struct Handles {
        nodes: SlotMap<NodeHandle, ()>,
        next_body: u32,
    }

    impl Handles {
        fn new() -> Self {
            Self { nodes: SlotMap::with_key(), next_body: 0 }
        }

        fn node(&mut self) -> NodeHandle {
            self.nodes.insert(())
        }

        fn body(&mut self) -> BodyHandle {
            self.next_body += 1;
            BodyHandle::from_raw_parts(self.next_body, 0)
        }
    }

    #[test]
    fn test_bind_and_lookup() {
        let mut ids = IdAllocator::new();
        let mut handles = Handles::new();
        let mut registry = EntityRegistry::new();

        let id = ids.allocate();
        let body = handles.body();
        let node = handles.node();
        registry.bind(id, Some(body), Some(node), SyncMode::BodyDrivesNode).unwrap();

        let binding = registry.lookup(id).unwrap();
        assert_eq!(binding.body(), Some(body));
        assert_eq!(binding.node(), Some(node));
        assert_eq!(binding.velocity_policy(), VelocityPolicy::Preserve);
        assert_eq!(registry.id_for_body(body), Some(id));
        assert_eq!(registry.id_for_node(node), Some(id));
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let mut ids = IdAllocator::new();
        let mut handles = Handles::new();
        let mut registry = EntityRegistry::new();

        let id = ids.allocate();
        registry.bind(id, Some(handles.body()), None, SyncMode::BodyDrivesNode).unwrap();
        let second = registry.bind(id, None, Some(handles.node()), SyncMode::Unsynced);

        assert_eq!(second.unwrap_err(), RegistryError::DuplicateBinding(id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_binding_rejected() {
        let mut ids = IdAllocator::new();
        let mut registry = EntityRegistry::new();

        let id = ids.allocate();
        let result = registry.bind(id, None, None, SyncMode::BodyDrivesNode);

        assert_eq!(result.unwrap_err(), RegistryError::EmptyBinding(id));
        assert!(registry.lookup(id).is_none());
    }

    #[test]
    fn test_handle_cannot_belong_to_two_objects() {
        let mut ids = IdAllocator::new();
        let mut handles = Handles::new();
        let mut registry = EntityRegistry::new();

        let body = handles.body();
        let first = ids.allocate();
        let second = ids.allocate();
        registry.bind(first, Some(body), None, SyncMode::BodyDrivesNode).unwrap();

        let result = registry.bind(second, Some(body), None, SyncMode::BodyDrivesNode);
        assert_eq!(result.unwrap_err(), RegistryError::BodyAlreadyBound { body, owner: first });
        assert!(registry.lookup(second).is_none());
    }

    #[test]
    fn test_unbind_last_side_removes_binding() {
        let mut ids = IdAllocator::new();
        let mut handles = Handles::new();
        let mut registry = EntityRegistry::new();

        let id = ids.allocate();
        let body = handles.body();
        let node = handles.node();
        registry.bind(id, Some(body), Some(node), SyncMode::BodyDrivesNode).unwrap();

        assert_eq!(registry.unbind_body(id), Unbound::Side);
        assert!(registry.lookup(id).is_some());
        assert!(registry.id_for_body(body).is_none());

        assert_eq!(registry.unbind_node(id), Unbound::Binding);
        assert!(registry.lookup(id).is_none());
        assert!(registry.id_for_node(node).is_none());
    }

    #[test]
    fn test_unbind_is_idempotent() {
        let mut ids = IdAllocator::new();
        let mut handles = Handles::new();
        let mut registry = EntityRegistry::new();

        let id = ids.allocate();
        registry.bind(id, None, Some(handles.node()), SyncMode::Unsynced).unwrap();

        assert_eq!(registry.unbind_body(id), Unbound::Nothing);
        assert_eq!(registry.unbind_node(id), Unbound::Binding);
        assert_eq!(registry.unbind_node(id), Unbound::Nothing);
        assert_eq!(registry.unbind_body(ids.allocate()), Unbound::Nothing);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_attach_deferred_node() {
        let mut ids = IdAllocator::new();
        let mut handles = Handles::new();
        let mut registry = EntityRegistry::new();

        let id = ids.allocate();
        registry.bind(id, Some(handles.body()), None, SyncMode::BodyDrivesNode).unwrap();
        assert!(!registry.lookup(id).unwrap().is_complete());

        let node = handles.node();
        registry.attach_node(id, node).unwrap();
        assert!(registry.lookup(id).unwrap().is_complete());

        let other = handles.node();
        assert_eq!(
            registry.attach_node(id, other),
            Err(RegistryError::NodeAlreadyBound { node, owner: id })
        );
        let stranger = ids.allocate();
        assert_eq!(registry.attach_node(stranger, other), Err(RegistryError::NotBound(stranger)));
    }

    #[test]
    fn test_for_each_bound_filters_by_mode_in_insertion_order() {
        let mut ids = IdAllocator::new();
        let mut handles = Handles::new();
        let mut registry = EntityRegistry::new();

        let modes = [
            SyncMode::BodyDrivesNode,
            SyncMode::NodeDrivesBody,
            SyncMode::BodyDrivesNode,
            SyncMode::Unsynced,
            SyncMode::BodyDrivesNode,
        ];
        let mut expected = Vec::new();
        for mode in modes {
            let id = ids.allocate();
            registry.bind(id, Some(handles.body()), None, mode).unwrap();
            if mode == SyncMode::BodyDrivesNode {
                expected.push(id);
            }
        }

        // Removing from the middle must not reorder the rest
        registry.remove(expected[1]);
        expected.remove(1);

        let iter = registry.for_each_bound(SyncMode::BodyDrivesNode);
        let first_pass: Vec<_> = iter.clone().map(EntityBinding::id).collect();
        let second_pass: Vec<_> = iter.map(EntityBinding::id).collect();

        assert_eq!(first_pass, expected);
        assert_eq!(second_pass, expected);
        assert_eq!(registry.for_each_bound(SyncMode::NodeDrivesBody).count(), 1);
    }

    #[test]
    fn test_lookup_tracks_bound_sides_across_operation_sequence() {
        let mut ids = IdAllocator::new();
        let mut handles = Handles::new();
        let mut registry = EntityRegistry::new();

        let objects: Vec<_> = (0..4).map(|_| ids.allocate()).collect();
        let bodies: Vec<_> = (0..4).map(|_| handles.body()).collect();
        let nodes: Vec<_> = (0..4).map(|_| handles.node()).collect();
        let mut has_body = [false; 4];
        let mut has_node = [false; 4];

        // Deterministic pseudo-random operation stream
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..200 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let i = (seed % 4) as usize;
            match (seed >> 8) % 4 {
                0 => {
                    let ok = registry
                        .bind(objects[i], Some(bodies[i]), Some(nodes[i]), SyncMode::BodyDrivesNode)
                        .is_ok();
                    if ok {
                        has_body[i] = true;
                        has_node[i] = true;
                    }
                }
                1 => {
                    registry.unbind_body(objects[i]);
                    has_body[i] = false;
                }
                2 => {
                    registry.unbind_node(objects[i]);
                    has_node[i] = false;
                }
                _ => {
                    if registry.attach_node(objects[i], nodes[i]).is_ok() {
                        has_node[i] = true;
                    }
                }
            }

            for j in 0..4 {
                let bound = has_body[j] || has_node[j];
                assert_eq!(registry.lookup(objects[j]).is_some(), bound);
            }
        }
    }

    #[test]
    fn test_set_mode_and_policy() {
        let mut ids = IdAllocator::new();
        let mut handles = Handles::new();
        let mut registry = EntityRegistry::new();

        let id = ids.allocate();
        registry.bind(id, Some(handles.body()), Some(handles.node()), SyncMode::BodyDrivesNode).unwrap();
        registry.set_mode(id, SyncMode::NodeDrivesBody).unwrap();
        registry.set_velocity_policy(id, VelocityPolicy::DeriveFromDelta).unwrap();

        let binding = registry.lookup(id).unwrap();
        assert_eq!(binding.mode(), SyncMode::NodeDrivesBody);
        assert_eq!(binding.velocity_policy(), VelocityPolicy::DeriveFromDelta);
        assert_eq!(registry.for_each_bound(SyncMode::BodyDrivesNode).count(), 0);
    }
}
