//! Per-world region contexts.
//!
//! A [`RegionManager`] owns one [`WorldRegions`] per loaded world. There is
//! no global state: tests and servers create as many managers as they like.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use hashbrown::HashMap;
use nalgebra::Point3;
use region_resolve::{FlagResolver, NoParents, ResolvedValue};
use region_types::{
    ActorContext, FlagEntry, FlagId, FlagRegistry, Region, RegionDefinition, RegionError,
    RegionId, RegionResult, RegionSummary, Shape, WorldId,
};
use tracing::{info, warn};

use crate::config::WorldConfig;
use crate::set::RegionSet;
use crate::store::{RegionStore, StoreError};

/// Errors from loading a world.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The store could not supply the definitions.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored definitions do not form a valid region set.
    #[error(transparent)]
    Region(#[from] RegionError),
}

/// The outcome of a mutation that was applied in memory.
///
/// A persistence failure does not undo the mutation; it is reported here
/// instead.
#[derive(Debug)]
pub struct Applied<T> {
    /// What the mutation returned.
    pub value: T,
    /// Set if saving the new state failed.
    pub persist_warning: Option<StoreError>,
}

impl<T> Applied<T> {
    /// Returns `true` if the new state was saved (or saving is disabled).
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.persist_warning.is_none()
    }

    /// Discards the persistence outcome.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }
}

/// The regions of one world plus the store they are saved to.
pub struct WorldRegions {
    world: WorldId,
    set: RegionSet,
    store: Arc<dyn RegionStore>,
    persisted: Mutex<u64>,
}

impl fmt::Debug for WorldRegions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldRegions")
            .field("world", &self.world)
            .field("set", &self.set)
            .finish_non_exhaustive()
    }
}

impl WorldRegions {
    /// Returns the world id.
    #[must_use]
    pub const fn world(&self) -> &WorldId {
        &self.world
    }

    /// Returns the region set.
    #[must_use]
    pub const fn set(&self) -> &RegionSet {
        &self.set
    }

    /// Saves the current snapshot if it is newer than the last one saved.
    ///
    /// Concurrent callers serialise here, and each saves whatever is
    /// current when it gets the lock, so the store never ends up behind.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the in-memory state is unaffected.
    pub fn save(&self) -> Result<(), StoreError> {
        let mut persisted = self.persisted.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.set.snapshot();
        if snapshot.generation() <= *persisted {
            return Ok(());
        }
        self.store.persist(&self.world, &snapshot.definitions())?;
        *persisted = snapshot.generation();
        Ok(())
    }

    fn after_mutation<T>(&self, value: T) -> Applied<T> {
        if !self.set.config().persist_on_mutation() {
            return Applied {
                value,
                persist_warning: None,
            };
        }
        let persist_warning = self.save().err().inspect(|e| {
            warn!(
                world = %self.world,
                generation = self.set.generation(),
                error = %e,
                "Failed to persist regions; keeping in-memory state"
            );
        });
        Applied {
            value,
            persist_warning,
        }
    }
}

/// All loaded worlds.
///
/// # Example
///
/// ```
/// use nalgebra::Point3;
/// use region_set::{MemoryStore, RegionManager, WorldConfig};
/// use region_types::{
///     FlagEntry, FlagId, FlagRegistry, RegionDefinition, Shape, State, WorldId,
/// };
/// use std::sync::Arc;
///
/// let manager = RegionManager::new(Arc::new(FlagRegistry::with_defaults()));
/// let world = WorldId::new("world");
/// let store = Arc::new(MemoryStore::new());
/// manager.load_world(world.clone(), store.clone(), WorldConfig::default())?;
///
/// let pvp = FlagId::new("pvp");
/// let mut spawn = RegionDefinition::new(
///     "spawn",
///     Shape::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0))?,
/// );
/// spawn.flags.push((pvp.clone(), FlagEntry::new(State::Deny)));
/// let applied = manager.create_region(&world, spawn)?;
/// assert!(applied.is_persisted());
/// assert_eq!(store.saves(), 1);
///
/// let resolved = manager.resolve(&world, &Point3::new(5.0, 5.0, 5.0), &pvp, None);
/// assert!(resolved.is_denied());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct RegionManager {
    registry: Arc<FlagRegistry>,
    worlds: RwLock<HashMap<WorldId, Arc<WorldRegions>>>,
}

impl RegionManager {
    /// Creates a manager with no worlds loaded.
    #[must_use]
    pub fn new(registry: Arc<FlagRegistry>) -> Self {
        Self {
            registry,
            worlds: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the flag registry shared by every world.
    #[must_use]
    pub fn registry(&self) -> &FlagRegistry {
        &self.registry
    }

    /// Loads `world` from `store`, replacing it if already loaded.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Store`] if the store fails and
    /// [`LoadError::Region`] if the definitions are invalid. A world that
    /// was loaded before stays loaded.
    pub fn load_world(
        &self,
        world: WorldId,
        store: Arc<dyn RegionStore>,
        config: WorldConfig,
    ) -> Result<Arc<WorldRegions>, LoadError> {
        let definitions = store.load_all(&world)?;
        let set = RegionSet::from_definitions(definitions, config, Arc::clone(&self.registry))?;
        let snapshot = set.snapshot();
        info!(
            world = %world,
            regions = snapshot.len(),
            height = snapshot.index_stats().height,
            "Loaded world regions"
        );

        let regions = Arc::new(WorldRegions {
            world: world.clone(),
            persisted: Mutex::new(snapshot.generation()),
            set,
            store,
        });
        self.worlds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(world, Arc::clone(&regions));
        Ok(regions)
    }

    /// Unloads `world`, returning its context if it was loaded.
    pub fn unload_world(&self, world: &WorldId) -> Option<Arc<WorldRegions>> {
        let removed = self
            .worlds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(world);
        if let Some(regions) = &removed {
            info!(world = %world, regions = regions.set().len(), "Unloaded world regions");
        }
        removed
    }

    /// Returns the context of a loaded world.
    #[must_use]
    pub fn world(&self, world: &WorldId) -> Option<Arc<WorldRegions>> {
        self.worlds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(world)
            .cloned()
    }

    /// Returns the ids of every loaded world, sorted.
    #[must_use]
    pub fn worlds(&self) -> Vec<WorldId> {
        let mut worlds: Vec<_> = self
            .worlds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        worlds.sort();
        worlds
    }

    /// Resolves `flag` at `point` in `world`.
    ///
    /// Never fails. In a world that is not loaded no region applies, so the
    /// result is the flag's default.
    #[must_use]
    pub fn resolve(
        &self,
        world: &WorldId,
        point: &Point3<f64>,
        flag: &FlagId,
        actor: Option<&ActorContext>,
    ) -> ResolvedValue {
        match self.world(world) {
            Some(regions) => regions.set().resolve(point, flag, actor),
            None => FlagResolver::new(&self.registry).resolve(&NoParents, &[], flag, actor),
        }
    }

    /// Summaries of the regions containing `point` in `world`, in
    /// precedence order. Empty for a world that is not loaded.
    #[must_use]
    pub fn applicable_regions(&self, world: &WorldId, point: &Point3<f64>) -> Vec<RegionSummary> {
        self.world(world)
            .map(|regions| regions.set().summaries_at(point))
            .unwrap_or_default()
    }

    /// Creates a region from its plain-data form.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::WorldNotLoaded`], or any validation error of
    /// [`Region::from_definition`] and [`RegionSet::add`].
    pub fn create_region(
        &self,
        world: &WorldId,
        definition: RegionDefinition,
    ) -> RegionResult<Applied<RegionId>> {
        let regions = self.loaded(world)?;
        let region = Region::from_definition(definition)?;
        let id = region.id().clone();
        regions.set().add(region)?;
        Ok(regions.after_mutation(id))
    }

    /// Removes a region; its children lose their parent.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::WorldNotLoaded`] or [`RegionError::NotFound`].
    pub fn remove_region(&self, world: &WorldId, id: &RegionId) -> RegionResult<Applied<Region>> {
        let regions = self.loaded(world)?;
        let removed = regions.set().remove(id)?;
        Ok(regions.after_mutation(removed))
    }

    /// Replaces the shape of a region.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::WorldNotLoaded`] or any error of
    /// [`RegionSet::redefine`].
    pub fn redefine_region(
        &self,
        world: &WorldId,
        id: &RegionId,
        shape: Shape,
    ) -> RegionResult<Applied<()>> {
        let regions = self.loaded(world)?;
        regions.set().redefine(id, shape)?;
        Ok(regions.after_mutation(()))
    }

    /// Sets or clears the parent of a region.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::WorldNotLoaded`] or any error of
    /// [`RegionSet::set_parent`].
    pub fn set_parent(
        &self,
        world: &WorldId,
        id: &RegionId,
        parent: Option<RegionId>,
    ) -> RegionResult<Applied<()>> {
        let regions = self.loaded(world)?;
        regions.set().set_parent(id, parent)?;
        Ok(regions.after_mutation(()))
    }

    /// Sets a flag on a region, returning the previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::WorldNotLoaded`] or any error of
    /// [`RegionSet::set_flag`].
    pub fn set_flag(
        &self,
        world: &WorldId,
        id: &RegionId,
        flag: FlagId,
        entry: FlagEntry,
    ) -> RegionResult<Applied<Option<FlagEntry>>> {
        let regions = self.loaded(world)?;
        let previous = regions.set().set_flag(id, flag, entry)?;
        Ok(regions.after_mutation(previous))
    }

    fn loaded(&self, world: &WorldId) -> RegionResult<Arc<WorldRegions>> {
        self.world(world)
            .ok_or_else(|| RegionError::WorldNotLoaded(world.clone()))
    }
}
