//! The persistence port.
//!
//! Region sets do not read or write files. A [`RegionStore`] supplies the
//! definitions when a world loads and receives the full list after each
//! mutation. [`MemoryStore`] keeps them in memory.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use hashbrown::HashMap;
use region_types::{RegionDefinition, WorldId};

/// Errors reported by a [`RegionStore`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("region store I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored data could not be understood.
    #[error("stored regions for world {world} are corrupt: {reason}")]
    Corrupt {
        /// The world being loaded.
        world: WorldId,
        /// What was wrong.
        reason: String,
    },

    /// The store cannot be reached right now.
    #[error("region store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Creates a corrupt data error.
    #[must_use]
    pub fn corrupt(world: WorldId, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            world,
            reason: reason.into(),
        }
    }

    /// Returns `true` if retrying later might succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }
}

/// Source and sink of region definitions, one list per world.
pub trait RegionStore: Send + Sync {
    /// Loads every definition stored for `world`. A world never saved has
    /// no regions.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read.
    fn load_all(&self, world: &WorldId) -> Result<Vec<RegionDefinition>, StoreError>;

    /// Replaces the stored definitions for `world`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be written.
    fn persist(&self, world: &WorldId, regions: &[RegionDefinition]) -> Result<(), StoreError>;
}

/// A thread-safe in-memory store.
///
/// # Example
///
/// ```
/// use region_set::{MemoryStore, RegionStore};
/// use region_types::{RegionDefinition, Shape, WorldId};
///
/// let store = MemoryStore::new();
/// let world = WorldId::new("world");
/// store.persist(&world, &[RegionDefinition::new("spawn", Shape::Global)])?;
/// assert_eq!(store.load_all(&world)?.len(), 1);
/// assert!(store.load_all(&WorldId::new("nether"))?.is_empty());
/// # Ok::<(), region_set::StoreError>(())
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    worlds: Mutex<HashMap<WorldId, Vec<RegionDefinition>>>,
    available: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            worlds: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            saves: AtomicUsize::new(0),
        }
    }

    /// Creates a store holding `regions` for `world`.
    #[must_use]
    pub fn with_world(self, world: WorldId, regions: Vec<RegionDefinition>) -> Self {
        self.worlds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(world, regions);
        self
    }

    /// Makes every call fail with [`StoreError::Unavailable`] until
    /// re-enabled.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful [`RegionStore::persist`] calls.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Returns a copy of what is stored for `world`.
    #[must_use]
    pub fn stored(&self, world: &WorldId) -> Option<Vec<RegionDefinition>> {
        self.worlds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(world)
            .cloned()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store disabled".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionStore for MemoryStore {
    fn load_all(&self, world: &WorldId) -> Result<Vec<RegionDefinition>, StoreError> {
        self.check_available()?;
        Ok(self.stored(world).unwrap_or_default())
    }

    fn persist(&self, world: &WorldId, regions: &[RegionDefinition]) -> Result<(), StoreError> {
        self.check_available()?;
        self.worlds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(world.clone(), regions.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use region_types::Shape;

    #[test]
    fn test_round_trip() {
        let store = MemoryStore::new();
        let world = WorldId::new("w");
        let regions = vec![RegionDefinition::new("a", Shape::Global)];
        store.persist(&world, &regions).unwrap();
        assert_eq!(store.load_all(&world).unwrap(), regions);
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn test_unavailable() {
        let store = MemoryStore::new().with_world(WorldId::new("w"), Vec::new());
        store.set_available(false);
        let error = store.load_all(&WorldId::new("w")).unwrap_err();
        assert!(error.is_transient());
        assert!(store.persist(&WorldId::new("w"), &[]).is_err());
        assert_eq!(store.saves(), 0);

        store.set_available(true);
        assert!(store.load_all(&WorldId::new("w")).unwrap().is_empty());
    }

    #[test]
    fn test_error_display() {
        let error = StoreError::corrupt(WorldId::new("w"), "bad priority");
        assert!(error.to_string().contains("bad priority"));
        assert!(!error.is_transient());
        let io: StoreError = io::Error::other("disk full").into();
        assert!(io.to_string().contains("disk full"));
    }
}
