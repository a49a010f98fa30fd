//! Structural changes in the middle of a running scene
//!
//! Bodies and nodes come and go through every path (world rules, direct
//! destroys, subtree removal) and the registry must stay consistent.

use std::time::Duration;

use crate::core::{SimulationConfig, SyncConfig, WorldBounds};
use crate::foundation::math::Vec2;
use crate::physics::{BodySpec, JointSpec, ShapeSpec};
use crate::prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn crate_box() -> BodySpec {
        BodySpec::dynamic().with_shape(ShapeSpec::cuboid(0.25, 0.25))
    }

    fn run_frames(scene: &mut SceneRoot, frames: usize) {
        for _ in 0..frames {
            scene.frame(Duration::from_millis(16));
        }
    }

    fn assert_registry_consistent(scene: &SceneRoot) {
        for binding in scene.registry().iter() {
            assert!(binding.body().is_some() || binding.node().is_some());
            if let Some(body) = binding.body() {
                assert!(scene.world().contains(body), "{} holds a dead body", binding.id());
            }
            if let Some(node) = binding.node() {
                assert!(scene.graph().contains(node), "{} holds a dead node", binding.id());
            }
        }
    }

    #[test]
    fn test_sensor_kill_zone_removes_objects() {
        let mut scene = SceneRoot::new(480.0, 320.0).unwrap();
        let zone = scene.create_body(
            BodySpec::fixed().at(0.0, -3.0).with_shape(ShapeSpec::cuboid(10.0, 0.5).as_sensor()),
        ).unwrap();
        let doomed = scene.spawn(crate_box().destroyed_by_sensors(), SyncMode::BodyDrivesNode).unwrap();
        let survivor = scene.spawn(crate_box().at(3.0, 0.0), SyncMode::BodyDrivesNode).unwrap();

        run_frames(&mut scene, 90);

        assert!(scene.lookup(doomed).is_none());
        assert!(scene.lookup(survivor).is_some());
        assert!(scene.world().contains(zone));
        assert_eq!(scene.graph().len(), 2);
        assert_registry_consistent(&scene);
    }

    #[test]
    fn test_lifetime_and_bounds_rules() {
        let config = SceneConfig::new(480.0, 320.0).with_simulation(
            SimulationConfig::default().with_bounds(WorldBounds::new(Vec2::new(-8.0, -2.0), Vec2::new(8.0, 6.0))),
        );
        let mut scene = SceneRoot::with_config(config).unwrap();
        let short_lived = scene.spawn(crate_box().at(-3.0, 0.0).with_gravity_scale(0.0).with_lifetime(10), SyncMode::BodyDrivesNode).unwrap();
        let faller = scene.spawn(crate_box(), SyncMode::BodyDrivesNode).unwrap();
        let floater = scene.spawn(crate_box().with_gravity_scale(0.0).at(1.0, 1.0), SyncMode::BodyDrivesNode).unwrap();

        for _ in 0..10 {
            scene.step();
        }
        assert!(scene.lookup(short_lived).is_none());
        assert!(scene.lookup(faller).is_some());

        for _ in 0..60 {
            scene.step();
        }
        assert!(scene.lookup(faller).is_none());
        assert!(scene.lookup(floater).is_some());
        assert_registry_consistent(&scene);
    }

    #[test]
    fn test_orphaned_node_policy_off_keeps_node() {
        let config = SceneConfig::new(480.0, 320.0).with_sync(SyncConfig { destroy_orphaned_nodes: false });
        let mut scene = SceneRoot::with_config(config).unwrap();
        let id = scene.spawn(crate_box().with_lifetime(1), SyncMode::BodyDrivesNode).unwrap();
        let node = scene.node_of(id).unwrap();

        let report = scene.step();

        assert_eq!(report.bodies_destroyed, 1);
        assert_eq!(scene.node_of(id), Some(node));
        assert!(scene.body_of(id).is_none());

        // Node-only binding is skipped from now on
        assert_eq!(scene.step().deferred, 1);
    }

    #[test]
    fn test_destroying_twice_in_one_tick_is_harmless() {
        let mut scene = SceneRoot::new(480.0, 320.0).unwrap();
        let id = scene.spawn(crate_box(), SyncMode::BodyDrivesNode).unwrap();
        let body = scene.body_of(id).unwrap();
        let node = scene.node_of(id).unwrap();

        // Destroyed behind the scene's back on both sides
        assert!(scene.world_mut().destroy_body(body));
        assert!(!scene.world_mut().destroy_body(body));
        assert_eq!(scene.graph_mut().destroy_node(node).unwrap(), 1);
        assert_eq!(scene.graph_mut().destroy_node(node).unwrap(), 0);

        let report = scene.step();

        assert!(scene.lookup(id).is_none());
        assert_eq!(report.bodies_destroyed, 1);
        assert_eq!(report.nodes_destroyed, 1);
        assert_eq!(report.bindings_removed, 1);
        assert_registry_consistent(&scene);
    }

    #[test]
    fn test_subtree_removal_unbinds_every_descendant() {
        let mut scene = SceneRoot::new(480.0, 320.0).unwrap();
        let group = scene.create_node(None).unwrap();
        let mut ids = Vec::new();
        for i in 0..3 {
            let body = scene.create_body(crate_box().at(i as f32, 0.0)).unwrap();
            let node = scene.create_node(Some(group)).unwrap();
            let id = scene.create_game_object();
            scene.bind(id, Some(body), Some(node), SyncMode::BodyDrivesNode).unwrap();
            ids.push(id);
        }

        assert_eq!(scene.destroy_node(group).unwrap(), 4);

        for id in ids {
            let binding = scene.lookup(id).unwrap();
            assert!(binding.node().is_none());
            assert!(binding.body().is_some());
        }
        assert_registry_consistent(&scene);
    }

    #[test]
    fn test_deferred_attachment_through_scene() {
        let mut scene = SceneRoot::new(480.0, 320.0).unwrap();
        let id = scene.create_game_object();
        let node = scene.create_node(None).unwrap();
        scene.bind(id, None, Some(node), SyncMode::BodyDrivesNode).unwrap();

        assert_eq!(scene.step().deferred, 1);

        let body = scene.create_body(BodySpec::fixed().at(2.0, 1.0)).unwrap();
        scene.attach_body(id, body).unwrap();
        let report = scene.step();

        assert_eq!(report.nodes_updated, 1);
        assert_eq!(scene.node_transform(id).unwrap().position, Vec2::new(64.0, 32.0));
    }

    #[test]
    fn test_joints_vanish_with_their_bodies() {
        let mut scene = SceneRoot::new(480.0, 320.0).unwrap();
        let pivot = scene.create_body(BodySpec::fixed().at(0.0, 3.0)).unwrap();
        let bob = scene.spawn(crate_box().at(2.0, 3.0), SyncMode::BodyDrivesNode).unwrap();
        let bob_body = scene.body_of(bob).unwrap();
        let joint = scene
            .create_joint(pivot, bob_body, &JointSpec::revolute(Vec2::zeros(), Vec2::new(-2.0, 0.0)))
            .unwrap();

        run_frames(&mut scene, 20);
        assert!(scene.destroy_game_object(bob));

        assert_eq!(scene.world().counts().joints, 0);
        assert!(!scene.destroy_joint(joint));
    }

    #[test]
    fn test_resize_rescales_without_moving_bodies() {
        let mut scene = SceneRoot::new(480.0, 320.0).unwrap();
        let id = scene.spawn(BodySpec::fixed().at(3.0, 2.0), SyncMode::BodyDrivesNode).unwrap();
        scene.step();

        scene.resize(240.0, 640.0).unwrap();
        assert_eq!(scene.unit_scale(), UnitScale::uniform(32.0));
        scene.step();

        assert_eq!(scene.unit_scale(), UnitScale { x: 16.0, y: 64.0 });
        assert_eq!(scene.body_transform(id).unwrap().position, Vec2::new(3.0, 2.0));
        assert_eq!(scene.node_transform(id).unwrap().position, Vec2::new(48.0, 128.0));
    }

    #[test]
    fn test_clear_then_reuse() {
        let mut scene = SceneRoot::new(480.0, 320.0).unwrap();
        let old = scene.spawn(crate_box(), SyncMode::BodyDrivesNode).unwrap();
        run_frames(&mut scene, 3);

        let cleared = scene.clear();
        assert_eq!(cleared, Teardown { bodies: 1, nodes: 1, bindings: 1 });
        assert_eq!(scene.stats(), FrameStats::default());

        let new = scene.spawn(crate_box(), SyncMode::BodyDrivesNode).unwrap();
        assert_ne!(old, new);
        run_frames(&mut scene, 3);
        assert!(scene.lookup(new).is_some());
        assert_registry_consistent(&scene);
    }
}
