//! End-to-end frame loop tests
//!
//! A scene driven through real frames must match a bare world stepped the
//! same number of times, bit for bit.

use std::time::Duration;

use crate::core::{SimulationConfig, WorldBounds};
use crate::foundation::math::Vec2;
use crate::physics::{BodySpec, ShapeSpec, SimulationWorld};
use crate::prelude::*;

/// One sixtieth of a second, rounded up to the nanosecond
const SIXTIETH: Duration = Duration::from_nanos(16_666_667);

#[cfg(test)]
mod tests {
    use super::*;

    fn falling_ball() -> BodySpec {
        BodySpec::dynamic().with_shape(ShapeSpec::ball(0.25))
    }

    #[test]
    fn test_one_second_of_frames_matches_direct_stepping() {
        let mut scene = SceneRoot::new(480.0, 320.0).unwrap();
        let id = scene.spawn(falling_ball(), SyncMode::BodyDrivesNode).unwrap();

        let mut ticks = 0;
        for _ in 0..60 {
            ticks += scene.frame(SIXTIETH);
        }
        assert_eq!(ticks, 60);
        assert_eq!(scene.stats().ticks, 60);

        let body = scene.body_transform(id).unwrap();
        let node = scene.node_transform(id).unwrap();
        let scale = scene.unit_scale();
        assert_eq!(scale, UnitScale::uniform(32.0));
        assert_eq!(node.position.y.to_bits(), (body.position.y * scale.y).to_bits());
        assert_eq!(node.position.x.to_bits(), (body.position.x * scale.x).to_bits());
        assert!(body.position.y < -4.0);

        let mut reference = SimulationWorld::new(&SimulationConfig::default());
        let handle = reference.create_body(falling_ball()).unwrap();
        for _ in 0..60 {
            reference.step();
        }
        let expected = reference.transform(handle).unwrap();
        assert_eq!(body.position.x.to_bits(), expected.position.x.to_bits());
        assert_eq!(body.position.y.to_bits(), expected.position.y.to_bits());
        assert_eq!(body.rotation.to_bits(), expected.rotation.to_bits());
    }

    #[test]
    fn test_ten_second_frame_is_clamped_to_fifteen_ticks() {
        let mut scene = SceneRoot::new(480.0, 320.0).unwrap();
        scene.spawn(falling_ball(), SyncMode::BodyDrivesNode).unwrap();

        assert_eq!(scene.frame(Duration::from_secs(10)), 15);

        let stats = scene.stats();
        assert_eq!(stats.clamped_frames, 1);
        assert_eq!(stats.discarded, Duration::from_millis(9750));
        assert_eq!(scene.frame_report().nodes_updated, 15);
    }

    #[test]
    fn test_leftover_time_does_not_raise_the_cap() {
        let config = SceneConfig::new(480.0, 320.0)
            .with_frame(FrameConfig::default().with_max_frame_time(0.26));
        let mut scene = SceneRoot::with_config(config).unwrap();
        scene.spawn(falling_ball(), SyncMode::BodyDrivesNode).unwrap();

        assert_eq!(scene.frame(Duration::from_millis(16)), 0);
        assert_eq!(scene.frame(Duration::from_secs(10)), 15);
        assert_eq!(scene.stats().clamped_frames, 1);
    }

    #[test]
    fn test_two_runs_are_bit_identical() {
        let run = || {
            let config = SceneConfig::new(480.0, 320.0).with_simulation(
                SimulationConfig::default()
                    .with_bounds(WorldBounds::new(Vec2::new(-20.0, -20.0), Vec2::new(20.0, 20.0))),
            );
            let mut scene = SceneRoot::with_config(config).unwrap();
            scene
                .spawn(
                    BodySpec::fixed().at(0.0, -4.0).with_shape(ShapeSpec::cuboid(7.0, 0.5)),
                    SyncMode::BodyDrivesNode,
                )
                .unwrap();
            let ids: Vec<GameObjectId> = (0..8)
                .map(|i| {
                    let spec = BodySpec::dynamic()
                        .at(-3.0 + i as f32 * 0.8, 1.0 + i as f32 * 0.7)
                        .with_rotation(i as f32 * 0.3)
                        .with_shape(ShapeSpec::cuboid(0.3, 0.3).with_restitution(0.2));
                    scene.spawn(spec, SyncMode::BodyDrivesNode).unwrap()
                })
                .collect();

            let frames = [16_u64, 17, 33, 5, 16, 40, 16, 16, 8, 24];
            for i in 0..180 {
                scene.frame(Duration::from_millis(frames[i % frames.len()]));
            }

            ids.iter()
                .map(|id| scene.node_transform(*id).unwrap())
                .map(|t| (t.position.x.to_bits(), t.position.y.to_bits(), t.rotation.to_bits()))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_interpolation_blends_between_ticks() {
        let config = SceneConfig::new(480.0, 320.0).with_frame(FrameConfig::default().with_interpolation(true));
        let mut scene = SceneRoot::with_config(config).unwrap();
        let id = scene.spawn(falling_ball(), SyncMode::BodyDrivesNode).unwrap();

        for _ in 0..30 {
            scene.frame(SIXTIETH);
        }
        // Half a tick left in the accumulator
        scene.frame(Duration::from_nanos(8_333_333));

        let node = scene.node_transform(id).unwrap();
        let body = scene.body_transform(id).unwrap();
        assert!(scene.stats().last_alpha > 0.4 && scene.stats().last_alpha < 0.6);
        // Blended node trails the body's latest position
        assert!(node.position.y > body.position.y * 32.0);
    }

    #[test]
    fn test_renderer_sees_every_frame() {
        struct Counting {
            frames: usize,
            items: usize,
        }

        impl FrameRenderer for Counting {
            fn render(&mut self, items: &[DrawItem]) {
                self.frames += 1;
                self.items = items.len();
            }
        }

        let mut scene = SceneRoot::new(480.0, 320.0).unwrap();
        scene.spawn(falling_ball(), SyncMode::BodyDrivesNode).unwrap();
        scene.spawn(falling_ball().at(2.0, 0.0), SyncMode::Unsynced).unwrap();

        let mut renderer = Counting { frames: 0, items: 0 };
        for _ in 0..5 {
            scene.frame_with_renderer(Duration::from_millis(4), &mut renderer);
        }

        assert_eq!(renderer.frames, 5);
        assert_eq!(renderer.items, 2);
        assert_eq!(scene.stats().ticks, 1);
    }
}
