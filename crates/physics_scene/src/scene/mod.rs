//! Scene management
//!
//! The render side of a scene: a tree of nodes with local and world
//! transforms, visibility and draw order, plus the draw list a renderer
//! consumes each frame.
//!
//! ## Architecture
//!
//! ```text
//! Simulation World (physics)
//!      ↓
//! Synchronization Step (bridge)
//!      ↓
//! Scene Graph (render nodes)
//!      ↓
//! Frame Renderer (graphics)
//! ```

mod node;
mod scene_graph;
mod draw_list;

pub use node::{Node, NodeHandle};
pub use scene_graph::{SceneGraph, SceneGraphError};
pub use draw_list::{DrawItem, Renderable};
