//! # Scene Configuration
//!
//! All tunables for one scene: logical render dimensions, simulation
//! parameters, frame pacing and synchronization policy.
//!
//! ## Example (TOML)
//!
//! ```toml
//! width = 480.0
//! height = 320.0
//!
//! [simulation]
//! gravity = [0.0, -9.81]
//! tick_rate_hz = 60
//! extent = [15.0, 10.0]
//!
//! [frame]
//! max_frame_time = 0.25
//! interpolate = false
//!
//! [sync]
//! destroy_orphaned_nodes = true
//! ```

use serde::{Serialize, Deserialize};
use std::time::Duration;

use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec2;

/// # Scene Configuration
///
/// Top-level settings for a [`SceneRoot`](crate::SceneRoot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Logical render width
    pub width: f32,
    /// Logical render height
    pub height: f32,
    /// Physics settings
    pub simulation: SimulationConfig,
    /// Frame pacing settings
    pub frame: FrameConfig,
    /// Synchronization policy
    pub sync: SyncConfig,
}

impl SceneConfig {
    /// Create a configuration with the given logical dimensions
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Set simulation settings
    pub fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = simulation;
        self
    }

    /// Set frame pacing settings
    pub fn with_frame(mut self, frame: FrameConfig) -> Self {
        self.frame = frame;
        self
    }

    /// Set synchronization policy
    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 320.0,
            simulation: SimulationConfig::default(),
            frame: FrameConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl Config for SceneConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_dimensions(self.width, self.height)?;
        self.simulation.validate()?;
        self.frame.validate(self.simulation.tick_rate_hz)?;
        Ok(())
    }
}

/// Check that logical dimensions can produce a usable unit scale
pub fn validate_dimensions(width: f32, height: f32) -> Result<(), ConfigError> {
    if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
        return Err(ConfigError::Invalid(format!(
            "Scene dimensions must be positive and finite, got {width}x{height}"
        )));
    }
    Ok(())
}

/// # Simulation Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Gravity in simulation units per second squared
    pub gravity: Vec2,

    /// Fixed simulation rate; Δt is `1 / tick_rate_hz`
    pub tick_rate_hz: u32,

    /// Size of the visible simulation area in simulation units
    ///
    /// The scene's `(width, height)` maps onto this extent, so the unit
    /// scale on each axis is `width / extent.x` and `height / extent.y`.
    pub extent: Vec2,

    /// Bodies leaving this box are destroyed by the world
    pub bounds: Option<WorldBounds>,
}

impl SimulationConfig {
    /// Set gravity
    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.gravity = Vec2::new(x, y);
        self
    }

    /// Set the fixed tick rate
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz;
        self
    }

    /// Set the visible simulation extent
    pub fn with_extent(mut self, width: f32, height: f32) -> Self {
        self.extent = Vec2::new(width, height);
        self
    }

    /// Destroy bodies that leave the given box
    pub fn with_bounds(mut self, bounds: WorldBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Fixed time step in seconds
    pub fn timestep(&self) -> f32 {
        1.0 / self.tick_rate_hz.max(1) as f32
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate_hz == 0 {
            return Err(ConfigError::Invalid("Tick rate must be at least 1 Hz".to_string()));
        }
        if !(self.gravity.x.is_finite() && self.gravity.y.is_finite()) {
            return Err(ConfigError::Invalid("Gravity must be finite".to_string()));
        }
        if !(self.extent.x.is_finite() && self.extent.x > 0.0 && self.extent.y.is_finite() && self.extent.y > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "Simulation extent must be positive, got {}x{}",
                self.extent.x, self.extent.y
            )));
        }
        if let Some(bounds) = &self.bounds {
            if bounds.min.x >= bounds.max.x || bounds.min.y >= bounds.max.y {
                return Err(ConfigError::Invalid("World bounds min must be below max".to_string()));
            }
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            tick_rate_hz: 60,
            extent: Vec2::new(15.0, 10.0),
            bounds: None,
        }
    }
}

/// Axis-aligned box in simulation units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl WorldBounds {
    /// Create bounds from two corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Check if a point lies inside (edges inclusive)
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y
    }
}

/// # Frame Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Cap on real time accepted per frame, in seconds
    ///
    /// Anything beyond the cap is discarded rather than simulated.
    pub max_frame_time: f32,

    /// Blend body-driven nodes between the last two ticks
    pub interpolate: bool,
}

impl FrameConfig {
    /// Set the accumulator cap
    pub fn with_max_frame_time(mut self, seconds: f32) -> Self {
        self.max_frame_time = seconds;
        self
    }

    /// Enable or disable render interpolation
    pub fn with_interpolation(mut self, enabled: bool) -> Self {
        self.interpolate = enabled;
        self
    }

    /// Accumulator cap as a duration
    pub fn max_frame_duration(&self) -> Duration {
        Duration::from_secs_f32(self.max_frame_time.max(0.0))
    }

    /// Validate the configuration against the tick rate
    pub fn validate(&self, tick_rate_hz: u32) -> Result<(), ConfigError> {
        if !self.max_frame_time.is_finite() || self.max_frame_time <= 0.0 {
            return Err(ConfigError::Invalid("Max frame time must be positive".to_string()));
        }
        let timestep = 1.0 / tick_rate_hz.max(1) as f32;
        if self.max_frame_time < timestep {
            return Err(ConfigError::Invalid(format!(
                "Max frame time {}s is shorter than one tick ({timestep}s); the scene would never step",
                self.max_frame_time
            )));
        }
        Ok(())
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_time: 0.25,
            interpolate: false,
        }
    }
}

/// # Synchronization Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Destroy a body's node when the world destroys the body
    pub destroy_orphaned_nodes: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            destroy_orphaned_nodes: true,
        }
    }
}
