//! # Core Module
//!
//! Shared configuration types used by every subsystem of a scene.

pub mod config;

// Re-export commonly used config types
pub use config::{
    SceneConfig,
    SimulationConfig,
    FrameConfig,
    SyncConfig,
    WorldBounds,
};
pub use crate::config::{Config, ConfigError};
