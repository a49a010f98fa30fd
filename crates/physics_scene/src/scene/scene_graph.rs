//! Scene graph
//!
//! Tree of renderable nodes stored in a `slotmap` arena. The graph always
//! has exactly one root, created with the graph and never destroyed.
//!
//! ## Spaces
//!
//! - *local*: relative to the parent node
//! - *scene*: relative to the root node (the space synchronization writes in)
//! - *world*: including the root's own transform (the host's space)
//!
//! Destroying a node removes its whole subtree; each removed handle is queued
//! and handed out by [`SceneGraph::drain_destroyed`] so that whoever keeps
//! side tables can drop stale entries.

use std::collections::VecDeque;

use slotmap::SlotMap;
use thiserror::Error;

use crate::foundation::math::Transform2D;
use crate::scene::{DrawItem, Node, NodeHandle};

/// Scene graph errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneGraphError {
    /// The handle does not name a live node
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeHandle),

    /// The root cannot be destroyed or reparented
    #[error("Operation not allowed on the root node")]
    RootNode,

    /// Attaching would make a node its own ancestor
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle {
        /// Node being moved
        child: NodeHandle,
        /// Requested parent
        parent: NodeHandle,
    },
}

/// Tree of renderable nodes
#[derive(Debug)]
pub struct SceneGraph {
    nodes: SlotMap<NodeHandle, Node>,
    root: NodeHandle,
    destroyed: Vec<NodeHandle>,
}

impl SceneGraph {
    /// Create a graph containing only the root node
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(None));
        Self {
            nodes,
            root,
            destroyed: Vec::new(),
        }
    }

    /// The root node
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Only the root is left
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Check if a handle names a live node
    pub fn contains(&self, node: NodeHandle) -> bool {
        self.nodes.contains_key(node)
    }

    /// Borrow a node
    pub fn get(&self, node: NodeHandle) -> Option<&Node> {
        self.nodes.get(node)
    }

    /// Mutably borrow a node's presentation data
    pub fn get_mut(&mut self, node: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(node)
    }

    /// Create a node under `parent` (the root when `None`)
    pub fn create_node(&mut self, parent: Option<NodeHandle>) -> Result<NodeHandle, SceneGraphError> {
        let parent = parent.unwrap_or(self.root);
        if !self.nodes.contains_key(parent) {
            return Err(SceneGraphError::UnknownNode(parent));
        }

        let handle = self.nodes.insert(Node::new(Some(parent)));
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(handle);
        }
        Ok(handle)
    }

    /// Destroy a node and its whole subtree
    ///
    /// Returns the number of nodes removed; a stale handle removes nothing.
    pub fn destroy_node(&mut self, node: NodeHandle) -> Result<usize, SceneGraphError> {
        if node == self.root {
            return Err(SceneGraphError::RootNode);
        }
        let Some(parent) = self.nodes.get(node).and_then(Node::parent) else {
            return Ok(0);
        };

        self.unlink(node, parent);

        // Parents are queued before their children
        let mut pending = VecDeque::from([node]);
        let mut removed = 0;
        while let Some(handle) = pending.pop_front() {
            if let Some(removed_node) = self.nodes.remove(handle) {
                pending.extend(removed_node.children);
                self.destroyed.push(handle);
                removed += 1;
            }
        }

        log::trace!("Destroyed {removed} node(s) starting at {node:?}");
        Ok(removed)
    }

    /// Take every node destroyed since the last drain, oldest first
    pub fn drain_destroyed(&mut self) -> Vec<NodeHandle> {
        std::mem::take(&mut self.destroyed)
    }

    /// Transform relative to the parent
    pub fn local_transform(&self, node: NodeHandle) -> Option<Transform2D> {
        self.nodes.get(node).map(|n| n.local)
    }

    /// Set the transform relative to the parent
    pub fn set_local_transform(&mut self, node: NodeHandle, transform: Transform2D) -> Result<(), SceneGraphError> {
        let node_ref = self.nodes.get_mut(node).ok_or(SceneGraphError::UnknownNode(node))?;
        node_ref.local = transform;
        Ok(())
    }

    /// Transform relative to the root node
    pub fn scene_transform(&self, node: NodeHandle) -> Option<Transform2D> {
        self.compose_up_to(node, Some(self.root))
    }

    /// Place a node in root space, whatever its parent
    pub fn set_scene_transform(&mut self, node: NodeHandle, transform: Transform2D) -> Result<(), SceneGraphError> {
        let parent = self.nodes.get(node).ok_or(SceneGraphError::UnknownNode(node))?.parent;
        let local = match parent {
            Some(parent) if parent != self.root => {
                let parent_scene = self.scene_transform(parent).ok_or(SceneGraphError::UnknownNode(parent))?;
                parent_scene.inverse().combine(&transform)
            }
            _ => transform,
        };
        self.set_local_transform(node, local)
    }

    /// Place several nodes in root space, parents before children
    ///
    /// Each write is converted to a local transform against the parent's
    /// final pose, whatever order the writes arrive in. Writes to unknown
    /// nodes are dropped from `writes`; the rest are applied.
    pub fn set_scene_transforms(&mut self, writes: &mut Vec<(NodeHandle, Transform2D)>) {
        let mut ordered: Vec<(usize, NodeHandle, Transform2D)> = writes
            .iter()
            .filter_map(|(node, transform)| Some((self.depth(*node)?, *node, *transform)))
            .collect();
        ordered.sort_by_key(|(depth, _, _)| *depth);

        writes.clear();
        for (_, node, transform) in ordered {
            if self.set_scene_transform(node, transform).is_ok() {
                writes.push((node, transform));
            }
        }
    }

    /// Number of ancestors below the root, `0` for the root itself
    pub fn depth(&self, node: NodeHandle) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.nodes.get(node)?.parent;
        while let Some(handle) = current {
            depth += 1;
            current = self.nodes.get(handle)?.parent;
        }
        Some(depth)
    }

    /// Full world transform, computed from the current local transforms
    pub fn world_transform(&self, node: NodeHandle) -> Option<Transform2D> {
        self.compose_up_to(node, None)
    }

    /// Move a node (and its subtree) under a new parent
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) -> Result<(), SceneGraphError> {
        if child == self.root {
            return Err(SceneGraphError::RootNode);
        }
        let old_parent = self.nodes.get(child).ok_or(SceneGraphError::UnknownNode(child))?.parent;
        if !self.nodes.contains_key(parent) {
            return Err(SceneGraphError::UnknownNode(parent));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneGraphError::WouldCreateCycle { child, parent });
        }

        if let Some(old_parent) = old_parent {
            self.unlink(child, old_parent);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(child);
        }
        Ok(())
    }

    /// Move a node back under the root
    pub fn detach(&mut self, child: NodeHandle) -> Result<(), SceneGraphError> {
        self.attach(child, self.root)
    }

    /// Show or hide a node and its subtree
    pub fn set_visible(&mut self, node: NodeHandle, visible: bool) -> Result<(), SceneGraphError> {
        let node_ref = self.nodes.get_mut(node).ok_or(SceneGraphError::UnknownNode(node))?;
        node_ref.visible = visible;
        Ok(())
    }

    /// Visible taking ancestors into account
    pub fn is_visible(&self, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            match self.nodes.get(handle) {
                Some(n) if n.visible => current = n.parent,
                _ => return false,
            }
        }
        true
    }

    /// Recompute cached world transforms, parents before children
    pub fn update_world_transforms(&mut self) {
        let mut queue = VecDeque::from([(self.root, Transform2D::identity())]);
        while let Some((handle, parent_world)) = queue.pop_front() {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };
            node.world = parent_world.combine(&node.local);
            let world = node.world;
            queue.extend(node.children.iter().map(|child| (*child, world)));
        }
    }

    /// Visible non-root nodes, sorted by z-order then tree order
    ///
    /// Uses cached world transforms.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        let mut stack: Vec<NodeHandle> = self.children_of(self.root).iter().rev().copied().collect();

        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            items.push(DrawItem {
                node: handle,
                transform: node.world,
                z_order: node.z_order,
                sprite: node.sprite.clone(),
            });
            stack.extend(node.children.iter().rev().copied());
        }

        items.sort_by_key(|item| item.z_order);
        items
    }

    /// Remove every node except the root, without queueing events
    pub fn clear(&mut self) {
        let root = self.root;
        self.nodes.retain(|handle, _| handle == root);
        if let Some(root_node) = self.nodes.get_mut(root) {
            root_node.children.clear();
        }
        self.destroyed.clear();
    }

    fn children_of(&self, node: NodeHandle) -> &[NodeHandle] {
        self.nodes.get(node).map(Node::children).unwrap_or(&[])
    }

    fn unlink(&mut self, child: NodeHandle, parent: NodeHandle) {
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|c| *c != child);
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.nodes.get(handle).and_then(Node::parent);
        }
        false
    }

    /// Compose local transforms from `node` upward, stopping below `stop`
    fn compose_up_to(&self, node: NodeHandle, stop: Option<NodeHandle>) -> Option<Transform2D> {
        let mut result = self.nodes.get(node)?.local;
        if Some(node) == stop {
            return Some(Transform2D::identity());
        }
        let mut current = self.nodes.get(node)?.parent;
        while let Some(handle) = current {
            if Some(handle) == stop {
                break;
            }
            let ancestor = self.nodes.get(handle)?;
            result = ancestor.local.combine(&result);
            current = ancestor.parent;
        }
        Some(result)
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
