//! Scene root
//!
//! [`SceneRoot`] is the one object a game creates per scene. It owns the
//! simulation world, the scene graph, the entity registry and the frame
//! driver, and is the only writer of bindings. Every destroy path it offers
//! clears the matching binding side before returning.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use physics_scene::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), SceneError> {
//! let mut scene = SceneRoot::new(480.0, 320.0)?;
//! let crate_box = scene.spawn(
//!     BodySpec::dynamic().at(0.0, 4.0).with_shape(ShapeSpec::cuboid(0.5, 0.5)),
//!     SyncMode::BodyDrivesNode,
//! )?;
//!
//! for _ in 0..60 {
//!     scene.frame(Duration::from_millis(16));
//! }
//! println!("{:?}", scene.node_transform(crate_box));
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::core::config::validate_dimensions;
use crate::core::SceneConfig;
use crate::entity::{
    EntityBinding, EntityRegistry, GameObjectId, IdAllocator, RegistryError, SyncMode, VelocityPolicy,
};
use crate::foundation::math::Transform2D;
use crate::frame::{FrameDriver, FrameRenderer, FrameStats, FrameTarget, NullRenderer};
use crate::physics::{BodyHandle, BodySpec, JointHandle, JointSpec, PhysicsError, SimulationWorld};
use crate::scene::{DrawItem, NodeHandle, Renderable, SceneGraph, SceneGraphError};
use crate::sync::{SyncReport, SyncStep, UnitScale};

/// Scene errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// Binding contract violated
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Scene graph operation failed
    #[error("Scene graph error: {0}")]
    Graph(#[from] SceneGraphError),

    /// Simulation operation failed
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logical dimensions must be positive and finite
    #[error("Invalid scene dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: f32,
        /// Requested height
        height: f32,
    },
}

/// What [`SceneRoot::teardown`] released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Teardown {
    /// Bodies destroyed
    pub bodies: usize,
    /// Nodes destroyed (root excluded)
    pub nodes: usize,
    /// Bindings dropped
    pub bindings: usize,
}

/// Everything a tick touches
struct SceneState {
    world: SimulationWorld,
    graph: SceneGraph,
    registry: EntityRegistry,
    sync: SyncStep,
    last_report: SyncReport,
    frame_report: SyncReport,
}

impl FrameTarget for SceneState {
    fn tick(&mut self) {
        self.last_report = self.sync.run(&mut self.world, &mut self.graph, &mut self.registry);
        self.frame_report.accumulate(&self.last_report);
    }

    fn interpolate(&mut self, alpha: f32) {
        self.sync.interpolate(&mut self.graph, alpha);
    }

    fn draw_list(&mut self) -> Vec<DrawItem> {
        self.graph.update_world_transforms();
        self.graph.draw_list()
    }
}

/// Root of one physics-driven 2D scene
pub struct SceneRoot {
    width: f32,
    height: f32,
    config: SceneConfig,
    ids: IdAllocator,
    driver: FrameDriver,
    state: SceneState,
}

impl SceneRoot {
    /// Create a scene with default settings and the given logical size
    pub fn new(width: f32, height: f32) -> Result<Self, SceneError> {
        check_dimensions(width, height)?;
        Self::with_config(SceneConfig::new(width, height))
    }

    /// Create a scene from a full configuration
    pub fn with_config(config: SceneConfig) -> Result<Self, SceneError> {
        check_dimensions(config.width, config.height)?;
        config.validate()?;

        log::info!(
            "Creating scene {}x{} ({} Hz, extent {}x{})",
            config.width,
            config.height,
            config.simulation.tick_rate_hz,
            config.simulation.extent.x,
            config.simulation.extent.y
        );

        let state = SceneState {
            world: SimulationWorld::new(&config.simulation),
            graph: SceneGraph::new(),
            registry: EntityRegistry::new(),
            sync: SyncStep::new(&config),
            last_report: SyncReport::default(),
            frame_report: SyncReport::default(),
        };

        Ok(Self {
            width: config.width,
            height: config.height,
            driver: FrameDriver::new(&config),
            ids: IdAllocator::new(),
            config,
            state,
        })
    }

    /// Create a scene from a TOML or RON configuration file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        Self::with_config(SceneConfig::load_from_file(path)?)
    }

    /// Configuration the scene was created with
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    // --- Dimensions ---

    /// Logical width
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Logical height
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Change the logical width
    pub fn set_width(&mut self, width: f32) -> Result<(), SceneError> {
        self.resize(width, self.height)
    }

    /// Change the logical height
    pub fn set_height(&mut self, height: f32) -> Result<(), SceneError> {
        self.resize(self.width, height)
    }

    /// Change both logical dimensions
    ///
    /// The unit scale follows at the next tick. Bodies keep their simulation
    /// positions; only their rendered positions change.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), SceneError> {
        check_dimensions(width, height)?;
        self.width = width;
        self.height = height;
        self.state.sync.set_dimensions(width, height);
        log::debug!("Scene resized to {}x{}", width, height);
        Ok(())
    }

    /// Unit scale currently applied to transforms
    pub fn unit_scale(&self) -> UnitScale {
        self.state.sync.scale()
    }

    // --- Game objects ---

    /// Allocate a fresh game object id
    pub fn create_game_object(&mut self) -> GameObjectId {
        self.ids.allocate()
    }

    /// Create an unbound body
    pub fn create_body(&mut self, spec: BodySpec) -> Result<BodyHandle, SceneError> {
        Ok(self.state.world.create_body(spec)?)
    }

    /// Create an unbound node under `parent` (the scene root when `None`)
    pub fn create_node(&mut self, parent: Option<NodeHandle>) -> Result<NodeHandle, SceneError> {
        Ok(self.state.graph.create_node(parent)?)
    }

    /// Bind a game object to a body and/or node
    pub fn bind(
        &mut self,
        id: GameObjectId,
        body: Option<BodyHandle>,
        node: Option<NodeHandle>,
        mode: SyncMode,
    ) -> Result<&EntityBinding, SceneError> {
        if let Some(body) = body.filter(|b| !self.state.world.contains(*b)) {
            return Err(PhysicsError::UnknownBody(body).into());
        }
        if let Some(node) = node.filter(|n| !self.state.graph.contains(*n)) {
            return Err(SceneGraphError::UnknownNode(node).into());
        }
        Ok(self.state.registry.bind(id, body, node, mode)?)
    }

    /// Give a bound game object its body
    pub fn attach_body(&mut self, id: GameObjectId, body: BodyHandle) -> Result<(), SceneError> {
        if !self.state.world.contains(body) {
            return Err(PhysicsError::UnknownBody(body).into());
        }
        Ok(self.state.registry.attach_body(id, body)?)
    }

    /// Give a bound game object its node
    pub fn attach_node(&mut self, id: GameObjectId, node: NodeHandle) -> Result<(), SceneError> {
        if !self.state.graph.contains(node) {
            return Err(SceneGraphError::UnknownNode(node).into());
        }
        Ok(self.state.registry.attach_node(id, node)?)
    }

    /// Create a body and a node for a new game object and bind them
    ///
    /// The node is placed at the body's initial position right away.
    pub fn spawn(&mut self, spec: BodySpec, mode: SyncMode) -> Result<GameObjectId, SceneError> {
        let initial = spec.transform;
        let body = self.state.world.create_body(spec)?;
        let node = match self.state.graph.create_node(None) {
            Ok(node) => node,
            Err(err) => {
                self.state.world.destroy_body(body);
                return Err(err.into());
            }
        };
        let render = self.state.sync.scale().transform_to_render(initial);
        self.state.graph.set_scene_transform(node, render)?;

        let id = self.ids.allocate();
        self.state.registry.bind(id, Some(body), Some(node), mode)?;
        Ok(id)
    }

    /// Binding of a game object
    pub fn lookup(&self, id: GameObjectId) -> Option<&EntityBinding> {
        self.state.registry.lookup(id)
    }

    /// Body bound to a game object
    pub fn body_of(&self, id: GameObjectId) -> Option<BodyHandle> {
        self.lookup(id).and_then(EntityBinding::body)
    }

    /// Node bound to a game object
    pub fn node_of(&self, id: GameObjectId) -> Option<NodeHandle> {
        self.lookup(id).and_then(EntityBinding::node)
    }

    /// Scene-space transform of a game object's node
    pub fn node_transform(&self, id: GameObjectId) -> Option<Transform2D> {
        self.node_of(id).and_then(|node| self.state.graph.scene_transform(node))
    }

    /// Simulation transform of a game object's body
    pub fn body_transform(&self, id: GameObjectId) -> Option<Transform2D> {
        self.body_of(id).and_then(|body| self.state.world.transform(body))
    }

    /// Change a binding's synchronization direction
    pub fn set_mode(&mut self, id: GameObjectId, mode: SyncMode) -> Result<(), SceneError> {
        Ok(self.state.registry.set_mode(id, mode)?)
    }

    /// Change how a node-driven body's velocity is handled
    pub fn set_velocity_policy(&mut self, id: GameObjectId, policy: VelocityPolicy) -> Result<(), SceneError> {
        Ok(self.state.registry.set_velocity_policy(id, policy)?)
    }

    /// Destroy a body, clearing its binding side
    ///
    /// The bound node follows when orphaned nodes are destroyed. Returns
    /// `false` if the body was already gone.
    pub fn destroy_body(&mut self, body: BodyHandle) -> bool {
        if !self.state.world.destroy_body(body) {
            return false;
        }
        let mut report = SyncReport::default();
        let state = &mut self.state;
        state.sync.release_body(body, &mut state.graph, &mut state.registry, &mut report);
        state.sync.apply_node_removals(&mut state.graph, &mut state.registry, &mut report);
        true
    }

    /// Destroy a node and its subtree, clearing the binding sides
    ///
    /// Bound bodies are left alone.
    pub fn destroy_node(&mut self, node: NodeHandle) -> Result<usize, SceneError> {
        let removed = self.state.graph.destroy_node(node)?;
        let state = &mut self.state;
        state.sync.apply_node_removals(&mut state.graph, &mut state.registry, &mut SyncReport::default());
        Ok(removed)
    }

    /// Destroy a game object's body and node and drop its binding
    ///
    /// Returns `false` if the id had no binding.
    pub fn destroy_game_object(&mut self, id: GameObjectId) -> bool {
        let Some(binding) = self.state.registry.remove(id) else {
            return false;
        };
        if let Some(body) = binding.body() {
            self.state.world.destroy_body(body);
        }
        if let Some(node) = binding.node() {
            if let Err(err) = self.state.graph.destroy_node(node) {
                log::warn!("Could not destroy node of {}: {}", id, err);
            }
        }
        let state = &mut self.state;
        state.sync.apply_node_removals(&mut state.graph, &mut state.registry, &mut SyncReport::default());
        true
    }

    /// Connect two bodies
    pub fn create_joint(&mut self, a: BodyHandle, b: BodyHandle, spec: &JointSpec) -> Result<JointHandle, SceneError> {
        Ok(self.state.world.create_joint(a, b, spec)?)
    }

    /// Remove a joint
    pub fn destroy_joint(&mut self, joint: JointHandle) -> bool {
        self.state.world.destroy_joint(joint)
    }

    // --- Subsystems ---

    /// Simulation world
    pub fn world(&self) -> &SimulationWorld {
        &self.state.world
    }

    /// Simulation world, mutably
    ///
    /// Bodies destroyed through this reference are unbound at the next tick.
    pub fn world_mut(&mut self) -> &mut SimulationWorld {
        &mut self.state.world
    }

    /// Scene graph
    pub fn graph(&self) -> &SceneGraph {
        &self.state.graph
    }

    /// Scene graph, mutably
    ///
    /// Nodes destroyed through this reference are unbound at the next tick.
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.state.graph
    }

    /// Entity registry
    pub fn registry(&self) -> &EntityRegistry {
        &self.state.registry
    }

    // --- Frames ---

    /// Run one frame without rendering
    ///
    /// Returns the number of ticks run.
    pub fn frame(&mut self, frame_dt: Duration) -> u32 {
        self.frame_with_renderer(frame_dt, &mut NullRenderer)
    }

    /// Run one frame and hand the draw list to `renderer`
    pub fn frame_with_renderer(&mut self, frame_dt: Duration, renderer: &mut dyn FrameRenderer) -> u32 {
        self.state.frame_report = SyncReport::default();
        self.driver.run_frame(frame_dt, &mut self.state, renderer)
    }

    /// Run exactly one tick, bypassing the accumulator
    pub fn step(&mut self) -> SyncReport {
        self.state.tick();
        self.state.last_report
    }

    /// Report of the latest tick
    pub fn last_report(&self) -> SyncReport {
        self.state.last_report
    }

    /// Summed reports of every tick in the latest frame
    pub fn frame_report(&self) -> SyncReport {
        self.state.frame_report
    }

    /// Frame pacing diagnostics
    pub fn stats(&self) -> FrameStats {
        self.driver.stats()
    }

    /// Frame driver
    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    /// Destroy every body, node and binding
    pub fn teardown(mut self) -> Teardown {
        let report = self.clear();
        log::info!(
            "Scene torn down: {} bodies, {} nodes, {} bindings",
            report.bodies,
            report.nodes,
            report.bindings
        );
        report
    }

    /// Destroy every body, node and binding but keep the scene usable
    pub fn clear(&mut self) -> Teardown {
        let report = Teardown {
            bodies: self.state.world.counts().bodies,
            nodes: self.state.graph.len() - 1,
            bindings: self.state.registry.len(),
        };
        self.state.world.clear();
        self.state.graph.clear();
        self.state.registry.clear();
        self.state.sync.reset();
        self.driver.reset();
        report
    }
}

impl Renderable for SceneRoot {
    fn root_node(&self) -> NodeHandle {
        self.state.graph.root()
    }

    fn set_root_transform(&mut self, transform: Transform2D) {
        let root = self.state.graph.root();
        if let Err(err) = self.state.graph.set_local_transform(root, transform) {
            log::warn!("Could not move scene root: {}", err);
            return;
        }
        self.state.graph.update_world_transforms();
    }

    /// Visible nodes in draw order
    ///
    /// World transforms are refreshed by every frame and by
    /// `set_root_transform`. Node edits made through
    /// [`SceneRoot::graph_mut`] since then show up after the next frame.
    fn draw_list(&self) -> Vec<DrawItem> {
        self.state.graph.draw_list()
    }
}

impl std::fmt::Debug for SceneRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRoot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bindings", &self.state.registry.len())
            .field("world", &self.state.world.counts())
            .field("nodes", &self.state.graph.len())
            .finish()
    }
}

fn check_dimensions(width: f32, height: f32) -> Result<(), SceneError> {
    validate_dimensions(width, height).map_err(|_| SceneError::InvalidDimensions { width, height })
}
