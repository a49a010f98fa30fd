//! Draw lists handed to renderers

use crate::foundation::math::Transform2D;
use crate::scene::NodeHandle;

/// Everything a renderer needs to draw one node
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    /// Source node
    pub node: NodeHandle,
    /// World transform in render units
    pub transform: Transform2D,
    /// Draw order
    pub z_order: i32,
    /// Sprite key, if the node has one
    pub sprite: Option<String>,
}

/// Something a host can mount as a single node of its own render tree
pub trait Renderable {
    /// Node that everything else hangs from
    fn root_node(&self) -> NodeHandle;

    /// Place the whole renderable in the host's space
    fn set_root_transform(&mut self, transform: Transform2D);

    /// Visible nodes in draw order
    ///
    /// Transforms may be cached; implementors document when they refresh.
    fn draw_list(&self) -> Vec<DrawItem>;
}
