//! Physics-to-render synchronization
//!
//! Everything that crosses between the simulation world and the scene graph
//! goes through this module: unit conversion, the per-tick copy of
//! transforms through the entity registry, and the optional interpolation
//! history.

pub mod scale;
pub mod interpolation;
pub mod step;

pub use scale::UnitScale;
pub use interpolation::TransformHistory;
pub use step::{SyncReport, SyncStep};
