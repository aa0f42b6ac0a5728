use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest id a restored snapshot may carry; the allocator must be able to
/// step past every id in use.
pub const MAX_ENTITY_ID: u64 = u64::MAX - 1;

/// Opaque identity of a window or section, unique within one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source carried by a project value.
///
/// Two projects forked from one ancestor may hand out the same ids; ids are
/// unique within a single lineage only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Resumes allocation past every id already in use.
    pub fn resume_after(used: impl IntoIterator<Item = EntityId>) -> Self {
        let next = used
            .into_iter()
            .map(|id| id.0.saturating_add(1))
            .max()
            .unwrap_or(1)
            .max(1);
        Self { next }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}
