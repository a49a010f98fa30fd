//! Headless drop demo
//!
//! Builds a small scene (a floor, a sensor kill zone under a gap, a pendulum,
//! a scripted kinematic paddle and a rain of crates), runs it for a fixed
//! number of frames with jittered frame times and logs what the renderer
//! would draw.
//!
//! Usage: `drop_demo [config.toml|config.ron] [frames]`

use std::time::Duration;

use physics_scene::foundation::math::constants::TAU;
use physics_scene::foundation::time::FrameTimer;
use physics_scene::frame::frame_duration;
use physics_scene::prelude::*;
use physics_scene::scene::SceneGraphError;
use rand::prelude::*;
use thiserror::Error;

const DEFAULT_FRAMES: u32 = 600;
const CRATE_COUNT: usize = 24;
const SEED: u64 = 0x5eed;

#[derive(Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Graph(#[from] SceneGraphError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Logs a summary of the draw list every so often
struct LoggingRenderer {
    frame: u64,
    every: u64,
    max_items: usize,
}

impl LoggingRenderer {
    fn new(every: u64) -> Self {
        Self { frame: 0, every, max_items: 0 }
    }
}

impl FrameRenderer for LoggingRenderer {
    fn render(&mut self, items: &[DrawItem]) {
        self.frame += 1;
        self.max_items = self.max_items.max(items.len());
        if self.frame % self.every == 0 {
            let sprites = items.iter().filter(|item| item.sprite.is_some()).count();
            log::info!("Frame {}: {} items ({} with sprites)", self.frame, items.len(), sprites);
            for item in items.iter().take(3) {
                log::debug!(
                    "  {:?} at ({:.1}, {:.1}) rot {:.2}",
                    item.sprite,
                    item.transform.position.x,
                    item.transform.position.y,
                    item.transform.rotation
                );
            }
        }
    }
}

fn name_node(scene: &mut SceneRoot, id: GameObjectId, sprite: &str, z_order: i32) {
    if let Some(node) = scene.node_of(id) {
        if let Some(node) = scene.graph_mut().get_mut(node) {
            node.sprite = Some(sprite.to_string());
            node.name = Some(format!("{sprite}-{}", id.raw()));
            node.z_order = z_order;
        }
    }
}

fn build_level(scene: &mut SceneRoot) -> Result<GameObjectId, SceneError> {
    // Floor with a gap in the middle
    for x in [-4.5_f32, 4.5] {
        let floor = scene.spawn(
            BodySpec::fixed().at(x, -4.0).with_shape(ShapeSpec::cuboid(3.5, 0.3).with_friction(0.8)),
            SyncMode::BodyDrivesNode,
        )?;
        name_node(scene, floor, "floor", -10);
    }

    // Anything falling through the gap is removed
    scene.create_body(
        BodySpec::fixed().at(0.0, -6.0).with_shape(ShapeSpec::cuboid(2.0, 0.5).as_sensor()),
    )?;

    // Pendulum hanging from an unbound pivot
    let pivot = scene.create_body(BodySpec::fixed().at(-5.0, 4.0))?;
    let bob = scene.spawn(
        BodySpec::dynamic().at(-3.0, 4.0).with_shape(ShapeSpec::ball(0.4).with_density(4.0)),
        SyncMode::BodyDrivesNode,
    )?;
    name_node(scene, bob, "bob", 5);
    if let Some(bob_body) = scene.body_of(bob) {
        scene.create_joint(pivot, bob_body, &JointSpec::revolute(Vec2::zeros(), Vec2::new(-2.0, 0.0)))?;
    }

    // Paddle driven by its node
    let paddle = scene.spawn(
        BodySpec::kinematic().at(0.0, -1.5).with_shape(ShapeSpec::cuboid(1.2, 0.15)),
        SyncMode::NodeDrivesBody,
    )?;
    scene.set_velocity_policy(paddle, VelocityPolicy::DeriveFromDelta)?;
    name_node(scene, paddle, "paddle", 1);

    Ok(paddle)
}

fn spawn_crates(scene: &mut SceneRoot, rng: &mut StdRng) -> Result<(), SceneError> {
    for _ in 0..CRATE_COUNT {
        let half = rng.gen_range(0.15..0.4);
        let mut spec = BodySpec::dynamic()
            .at(rng.gen_range(-6.0..6.0), rng.gen_range(1.0..9.0))
            .with_rotation(rng.gen_range(0.0..TAU))
            .with_shape(ShapeSpec::cuboid(half, half).with_restitution(rng.gen_range(0.0..0.4)))
            .destroyed_by_sensors();
        if rng.gen_bool(0.25) {
            spec = spec.with_lifetime(rng.gen_range(120..480));
        }
        let id = scene.spawn(spec, SyncMode::BodyDrivesNode)?;
        name_node(scene, id, "crate", 0);
    }
    Ok(())
}

fn run() -> Result<(), DemoError> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let frames = match args.next() {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| DemoError::InvalidArgument(format!("frame count '{raw}'")))?,
        None => DEFAULT_FRAMES,
    };

    let mut scene = match &config_path {
        Some(path) => {
            log::info!("Loading scene configuration from {}", path);
            SceneRoot::from_config_file(path)?
        }
        None => SceneRoot::with_config(
            SceneConfig::new(480.0, 320.0)
                .with_frame(FrameConfig::default().with_interpolation(true)),
        )?,
    };
    scene.set_root_transform(Transform2D::from_position(scene.width() * 0.5, scene.height() * 0.5));

    let paddle = build_level(&mut scene)?;
    let mut rng = StdRng::seed_from_u64(SEED);
    spawn_crates(&mut scene, &mut rng)?;
    log::info!("Scene ready: {:?}", scene);

    let mut renderer = LoggingRenderer::new(120);
    let mut timer = FrameTimer::new();
    let mut elapsed = 0.0_f32;
    for frame in 0..frames {
        let dt = rng.gen_range(0.012..0.022);
        elapsed += dt;

        // Sweep the paddle left and right
        if let Some(node) = scene.node_of(paddle) {
            let x = (elapsed * 0.8).sin() * 4.0 * scene.unit_scale().x;
            let y = -1.5 * scene.unit_scale().y;
            scene.graph_mut().set_local_transform(node, Transform2D::from_position(x, y))?;
        }

        // One long hitch to exercise the frame cap
        let frame_dt = if frame == frames / 2 { Duration::from_secs(1) } else { frame_duration(dt) };
        scene.frame_with_renderer(frame_dt, &mut renderer);

        let report = scene.frame_report();
        if report.bodies_destroyed > 0 {
            log::debug!("Frame {}: {} crate(s) removed", frame, report.bodies_destroyed);
        }
        timer.tick();
    }

    let stats = scene.stats();
    println!("frames:          {}", stats.frames);
    println!("ticks:           {}", stats.ticks);
    println!("clamped frames:  {}", stats.clamped_frames);
    println!("discarded time:  {:?}", stats.discarded);
    println!("bindings left:   {}", scene.registry().len());
    println!("bodies left:     {}", scene.world().counts().bodies);
    println!("peak draw items: {}", renderer.max_items);
    println!("wall time:       {:?} ({:.0} frames/s)", timer.total(), timer.average_fps());

    let teardown = scene.teardown();
    log::info!("Released {} bodies and {} nodes", teardown.bodies, teardown.nodes);
    Ok(())
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("Starting drop demo");

    if let Err(e) = run() {
        log::error!("Drop demo failed: {}", e);
        std::process::exit(1);
    }
}
