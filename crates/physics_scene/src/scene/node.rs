//! Scene nodes

use slotmap::new_key_type;

use crate::foundation::math::Transform2D;

new_key_type! {
    /// Generational handle to a node in a [`SceneGraph`](crate::scene::SceneGraph)
    pub struct NodeHandle;
}

/// One renderable node
///
/// Nodes hold only hierarchy, transform and presentation data. What a node
/// looks like on screen is named by its `sprite` key and resolved by the
/// renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
    pub(crate) local: Transform2D,
    pub(crate) world: Transform2D,

    /// Hidden nodes hide their whole subtree
    pub visible: bool,
    /// Draw order; higher draws later
    pub z_order: i32,
    /// Debug name
    pub name: Option<String>,
    /// Renderer-side sprite key
    pub sprite: Option<String>,
}

impl Node {
    pub(crate) fn new(parent: Option<NodeHandle>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            local: Transform2D::identity(),
            world: Transform2D::identity(),
            visible: true,
            z_order: 0,
            name: None,
            sprite: None,
        }
    }

    /// Parent node, `None` only for the root
    #[inline]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Child nodes in attachment order
    #[inline]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Transform relative to the parent
    #[inline]
    pub fn local_transform(&self) -> Transform2D {
        self.local
    }

    /// World transform as of the last
    /// [`update_world_transforms`](crate::scene::SceneGraph::update_world_transforms)
    #[inline]
    pub fn cached_world_transform(&self) -> Transform2D {
        self.world
    }
}
