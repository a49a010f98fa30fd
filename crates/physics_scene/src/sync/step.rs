//! Synchronization step
//!
//! One call to [`SyncStep::run`] is one fixed tick:
//!
//! 1. advance the world by exactly one time step
//! 2. drain structural events from the world and the graph and drop the
//!    matching binding sides
//! 3. push body transforms into `BodyDrivesNode` nodes
//! 4. pull node transforms into `NodeDrivesBody` bodies
//!
//! `Unsynced` bindings are never touched. A binding is visited in exactly one
//! direction per tick because its mode selects the pass.

use std::collections::HashMap;

use crate::core::{SceneConfig, SyncConfig};
use crate::entity::{EntityRegistry, SyncMode, Unbound, VelocityPolicy};
use crate::foundation::math::{utils, Transform2D, Vec2};
use crate::physics::{BodyHandle, PhysicsEvent, SimulationWorld, Velocity};
use crate::scene::SceneGraph;
use crate::sync::{TransformHistory, UnitScale};

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Nodes written from their bodies
    pub nodes_updated: usize,
    /// Bodies written from their nodes
    pub bodies_updated: usize,
    /// Bindings skipped because one side is not attached yet
    pub deferred: usize,
    /// Bound bodies the world destroyed on its own
    pub bodies_destroyed: usize,
    /// Bound nodes removed from the graph
    pub nodes_destroyed: usize,
    /// Bindings dropped because both sides were gone
    pub bindings_removed: usize,
    /// Bodies created since the last tick that nobody bound
    pub unbound_bodies: usize,
}

impl SyncReport {
    /// Add another report's counts to this one
    pub fn accumulate(&mut self, other: &SyncReport) {
        self.nodes_updated += other.nodes_updated;
        self.bodies_updated += other.bodies_updated;
        self.deferred += other.deferred;
        self.bodies_destroyed += other.bodies_destroyed;
        self.nodes_destroyed += other.nodes_destroyed;
        self.bindings_removed += other.bindings_removed;
        self.unbound_bodies += other.unbound_bodies;
    }
}

/// Bridge state carried between ticks
#[derive(Debug)]
pub struct SyncStep {
    config: SyncConfig,
    extent: Vec2,
    scale: UnitScale,
    pending_dimensions: Option<(f32, f32)>,
    history: TransformHistory,
    record_history: bool,
    driven_targets: HashMap<BodyHandle, (Transform2D, u64)>,
    tick: u64,
}

impl SyncStep {
    /// Create the bridge for a scene
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            config: config.sync.clone(),
            extent: config.simulation.extent,
            scale: UnitScale::from_dimensions(config.width, config.height, config.simulation.extent),
            pending_dimensions: None,
            history: TransformHistory::new(),
            record_history: config.frame.interpolate,
            driven_targets: HashMap::new(),
            tick: 0,
        }
    }

    /// Scale in effect for the next transform copy
    pub fn scale(&self) -> UnitScale {
        self.scale
    }

    /// Ticks run so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Schedule new logical dimensions
    ///
    /// The scale changes at the start of the next tick; no body moves.
    pub fn set_dimensions(&mut self, width: f32, height: f32) {
        self.pending_dimensions = Some((width, height));
    }

    /// Per-node transform history used for interpolation
    pub fn history(&self) -> &TransformHistory {
        &self.history
    }

    /// Run one tick
    pub fn run(&mut self, world: &mut SimulationWorld, graph: &mut SceneGraph, registry: &mut EntityRegistry) -> SyncReport {
        let mut report = SyncReport::default();

        if let Some((width, height)) = self.pending_dimensions.take() {
            self.scale = UnitScale::from_dimensions(width, height, self.extent);
            log::debug!("Unit scale now {:.3} x {:.3}", self.scale.x, self.scale.y);
        }

        world.step();
        self.tick += 1;

        self.apply_world_events(world, graph, registry, &mut report);
        self.apply_node_removals(graph, registry, &mut report);
        self.push_bodies_to_nodes(world, graph, registry, &mut report);
        self.pull_nodes_to_bodies(world, graph, registry, &mut report);

        if report.bodies_destroyed > 0 || report.nodes_destroyed > 0 {
            log::debug!(
                "Tick {}: {} bodies and {} nodes destroyed",
                self.tick,
                report.bodies_destroyed,
                report.nodes_destroyed
            );
        }
        report
    }

    /// Blend body-driven nodes between the last two ticks
    pub fn interpolate(&mut self, graph: &mut SceneGraph, alpha: f32) {
        if self.record_history {
            self.history.apply(graph, alpha);
        }
    }

    /// Drop bindings of nodes removed from the graph since the last drain
    pub fn apply_node_removals(&mut self, graph: &mut SceneGraph, registry: &mut EntityRegistry, report: &mut SyncReport) {
        for node in graph.drain_destroyed() {
            self.history.forget(node);
            let Some(id) = registry.id_for_node(node) else {
                continue;
            };
            report.nodes_destroyed += 1;
            if registry.unbind_node(id) == Unbound::Binding {
                report.bindings_removed += 1;
            }
        }
    }

    /// Drop the body side of a binding whose body is gone, applying the
    /// orphan policy to its node
    pub fn release_body(&self, body: BodyHandle, graph: &mut SceneGraph, registry: &mut EntityRegistry, report: &mut SyncReport) {
        let Some(id) = registry.id_for_body(body) else {
            return;
        };
        let node = registry.lookup(id).and_then(|binding| binding.node());

        report.bodies_destroyed += 1;
        if registry.unbind_body(id) == Unbound::Binding {
            report.bindings_removed += 1;
        }

        if let Some(node) = node.filter(|_| self.config.destroy_orphaned_nodes) {
            // Bound nodes are never the root
            if let Err(err) = graph.destroy_node(node) {
                log::warn!("Could not destroy orphaned node {:?}: {}", node, err);
            }
        }
    }

    /// Forget all per-node state
    pub fn reset(&mut self) {
        self.history.clear();
        self.driven_targets.clear();
    }

    fn apply_world_events(
        &self,
        world: &mut SimulationWorld,
        graph: &mut SceneGraph,
        registry: &mut EntityRegistry,
        report: &mut SyncReport,
    ) {
        for event in world.drain_events() {
            match event {
                PhysicsEvent::BodyCreated(body) => {
                    if world.contains(body) && registry.id_for_body(body).is_none() {
                        report.unbound_bodies += 1;
                    }
                }
                PhysicsEvent::BodyDestroyed { body, cause } => {
                    log::trace!("Body {:?} destroyed by the world ({:?})", body, cause);
                    self.release_body(body, graph, registry, report);
                }
                PhysicsEvent::JointDestroyed(_) => {}
            }
        }
    }

    fn push_bodies_to_nodes(
        &mut self,
        world: &SimulationWorld,
        graph: &mut SceneGraph,
        registry: &EntityRegistry,
        report: &mut SyncReport,
    ) {
        let mut writes = Vec::new();
        for binding in registry.for_each_bound(SyncMode::BodyDrivesNode) {
            let (Some(body), Some(node)) = (binding.body(), binding.node()) else {
                report.deferred += 1;
                continue;
            };
            let Some(sim) = world.transform(body) else {
                continue;
            };
            writes.push((node, self.scale.transform_to_render(sim)));
        }

        // Bound nodes may be nested under other bound nodes
        graph.set_scene_transforms(&mut writes);
        report.nodes_updated += writes.len();
        if self.record_history {
            for (node, render) in writes {
                self.history.record(node, render, self.tick);
            }
            self.history.prune(self.tick);
        }
    }

    fn pull_nodes_to_bodies(
        &mut self,
        world: &mut SimulationWorld,
        graph: &SceneGraph,
        registry: &EntityRegistry,
        report: &mut SyncReport,
    ) {
        let dt = world.timestep();

        for binding in registry.for_each_bound(SyncMode::NodeDrivesBody) {
            let (Some(body), Some(node)) = (binding.body(), binding.node()) else {
                report.deferred += 1;
                continue;
            };
            let Some(render) = graph.scene_transform(node) else {
                continue;
            };
            let target = self.scale.transform_to_simulation(render);

            if binding.velocity_policy() == VelocityPolicy::DeriveFromDelta {
                // Delta between consecutive targets; the body itself has
                // already integrated last tick's velocity
                let previous = self
                    .driven_targets
                    .get(&body)
                    .map(|(transform, _)| *transform)
                    .or_else(|| world.transform(body));
                if let Some(previous) = previous {
                    let velocity = Velocity::new(
                        (target.position - previous.position) / dt,
                        utils::wrap_angle(target.rotation - previous.rotation) / dt,
                    );
                    if world.set_velocity(body, velocity).is_err() {
                        continue;
                    }
                }
                self.driven_targets.insert(body, (target, self.tick));
            }

            if world.set_transform(body, target).is_ok() {
                report.bodies_updated += 1;
            }
        }

        let tick = self.tick;
        self.driven_targets.retain(|_, (_, seen)| *seen == tick);
    }
}
