//! Frame pacing
//!
//! Fixed-timestep accumulation and the per-frame loop that steps and renders
//! a scene.

pub mod timestep;
pub mod driver;

pub use timestep::{frame_duration, Accumulated, FixedTimestep};
pub use driver::{FrameDriver, FramePhase, FrameRenderer, FrameStats, FrameTarget, NullRenderer};
