//! Game object identity

use std::fmt;

/// Stable identifier for one logical game object
///
/// Ids are handed out by an [`IdAllocator`] in strictly increasing order and
/// are never reused by the allocator that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameObjectId {
    id: u64,
}

impl GameObjectId {
    /// Get the raw id value
    pub fn raw(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for GameObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GameObject#{}", self.id)
    }
}

/// Monotonic source of [`GameObjectId`]s
#[derive(Debug, Default)]
pub struct IdAllocator {
    next_id: u64,
}

impl IdAllocator {
    /// Create a new allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id
    pub fn allocate(&mut self) -> GameObjectId {
        let id = GameObjectId { id: self.next_id };
        self.next_id += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn allocated(&self) -> u64 {
        self.next_id
    }
}
