//! Entity module - logical game objects and their bindings
//!
//! A game object may own one simulation body, one scene node, or both.
//! [`EntityRegistry`] records that relation without owning either side.

pub mod id;
pub mod binding;
pub mod registry;

pub use id::{GameObjectId, IdAllocator};
pub use binding::{EntityBinding, SyncMode, VelocityPolicy};
pub use registry::{EntityRegistry, RegistryError, Unbound};
