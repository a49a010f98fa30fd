//! # Physics Scene
//!
//! Physics-to-render synchronization for 2D game scenes.
//!
//! A [`SceneRoot`] advances a deterministic rigid-body simulation at a fixed
//! rate and keeps a parallel tree of renderable nodes in step with it,
//! tolerating bodies without nodes, nodes without bodies and objects created
//! or destroyed mid-frame.
//!
//! ## Features
//!
//! - **Fixed timestep**: lossless integer accumulator with a per-frame cap
//! - **Entity registry**: game objects bound to at most one body and one node
//! - **Two-way sync**: body-driven nodes, node-driven bodies, or neither
//! - **Scene graph**: slotmap node arena with subtree destruction
//! - **Physics**: `rapier2d` bodies, shapes and joints behind generational handles
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use physics_scene::prelude::*;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), SceneError> {
//!     physics_scene::foundation::logging::init("info");
//!
//!     let mut scene = SceneRoot::new(480.0, 320.0)?;
//!     let ball = scene.spawn(
//!         BodySpec::dynamic().with_shape(ShapeSpec::ball(0.5)),
//!         SyncMode::BodyDrivesNode,
//!     )?;
//!
//!     for _ in 0..60 {
//!         scene.frame(Duration::from_nanos(16_666_667));
//!     }
//!
//!     println!("ball at {:?}", scene.node_transform(ball));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

pub mod config;
pub mod core;
pub mod foundation;

pub mod entity;
pub mod physics;
pub mod scene;
pub mod sync;
pub mod frame;

mod scene_root;

pub use scene_root::{SceneError, SceneRoot, Teardown};

#[cfg(test)]
mod tests;

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        SceneError, SceneRoot, Teardown,
        config::Config,
        core::{FrameConfig, SceneConfig, SimulationConfig, SyncConfig, WorldBounds},
        entity::{GameObjectId, SyncMode, VelocityPolicy},
        foundation::math::{Transform2D, Vec2},
        frame::{FrameRenderer, FrameStats},
        physics::{BodyHandle, BodyKind, BodySpec, JointHandle, JointSpec, ShapeSpec},
        scene::{DrawItem, NodeHandle, Renderable},
        sync::{SyncReport, UnitScale},
    };
}
