//! The region set of one world.
//!
//! Readers take the current [`RegionSnapshot`] with one short read lock and
//! then work on it without any further locking. Writers serialise on a
//! mutex, apply their change to a private copy, verify it and publish it
//! by swapping the pointer. A failed mutation is simply never published.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use hashbrown::HashMap;
use nalgebra::Point3;
use region_resolve::ResolvedValue;
use region_types::{
    ActorContext, FlagEntry, FlagId, FlagRegistry, Region, RegionDefinition, RegionError,
    RegionId, RegionResult, RegionSummary, Shape,
};
use tracing::{debug, error, info, warn};
use ward_spatial::RTree;

use crate::config::WorldConfig;
use crate::snapshot::RegionSnapshot;

/// What happens to the children of a removed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemovalStrategy {
    /// Children stay and lose their parent.
    #[default]
    UnsetParentInChildren,
    /// Children and all their descendants are removed too.
    RemoveChildren,
}

/// All regions of one world, shared between reader and writer threads.
///
/// # Example
///
/// ```
/// use nalgebra::Point3;
/// use region_set::{RegionSet, WorldConfig};
/// use region_types::{FlagEntry, FlagId, FlagRegistry, Region, RegionId, Shape, State};
/// use std::sync::Arc;
///
/// let set = RegionSet::new(WorldConfig::default(), Arc::new(FlagRegistry::with_defaults()))?;
/// let pvp = FlagId::new("pvp");
/// set.add(
///     Region::new(
///         RegionId::new("spawn")?,
///         Shape::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0))?,
///     )?
///     .with_flag(pvp.clone(), FlagEntry::new(State::Deny)),
/// )?;
///
/// assert!(set.resolve(&Point3::new(5.0, 5.0, 5.0), &pvp, None).is_denied());
/// assert_eq!(set.generation(), 1);
/// # Ok::<(), region_types::RegionError>(())
/// ```
#[derive(Debug)]
pub struct RegionSet {
    current: RwLock<Arc<RegionSnapshot>>,
    writer: Mutex<()>,
    config: WorldConfig,
    registry: Arc<FlagRegistry>,
}

impl RegionSet {
    /// Creates an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Spatial`] for an invalid index configuration
    /// and [`RegionError::InvalidPriority`] if the priority bounds are
    /// inverted.
    pub fn new(config: WorldConfig, registry: Arc<FlagRegistry>) -> RegionResult<Self> {
        check_bounds(&config)?;
        let index = RTree::with_config(*config.index())?;
        Ok(Self::from_snapshot(RegionSnapshot::empty(index), config, registry))
    }

    /// Creates a set from stored definitions in one bulk build.
    ///
    /// Parents that do not exist or would close a cycle are dropped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns the first validation error among the definitions, or
    /// [`RegionError::DuplicateId`] if two share an id.
    pub fn from_definitions(
        definitions: Vec<RegionDefinition>,
        config: WorldConfig,
        registry: Arc<FlagRegistry>,
    ) -> RegionResult<Self> {
        check_bounds(&config)?;
        let snapshot = build_snapshot(definitions, 0, &config, &registry)?;
        Ok(Self::from_snapshot(snapshot, config, registry))
    }

    fn from_snapshot(
        snapshot: RegionSnapshot,
        config: WorldConfig,
        registry: Arc<FlagRegistry>,
    ) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(()),
            config,
            registry,
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RegionSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Returns the flag registry.
    #[must_use]
    pub fn registry(&self) -> &FlagRegistry {
        &self.registry
    }

    /// Generation of the current snapshot.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.snapshot().generation()
    }

    /// Number of regions in the current snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns `true` if the current snapshot has no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Resolves `flag` at `point` against the current snapshot.
    #[must_use]
    pub fn resolve(
        &self,
        point: &Point3<f64>,
        flag: &FlagId,
        actor: Option<&ActorContext>,
    ) -> ResolvedValue {
        self.snapshot()
            .resolve(&self.registry, self.config.flag_defaults(), point, flag, actor)
    }

    /// Summaries of the regions containing `point`, in precedence order.
    #[must_use]
    pub fn summaries_at(&self, point: &Point3<f64>) -> Vec<RegionSummary> {
        self.snapshot().summaries_at(point)
    }

    /// Adds a region.
    ///
    /// # Errors
    ///
    /// - [`RegionError::InvalidPriority`] if the priority is out of bounds.
    /// - [`RegionError::FlagTypeMismatch`] if a flag value has the wrong kind.
    /// - [`RegionError::DuplicateId`] if the id is taken.
    /// - [`RegionError::UnknownParent`] if the parent does not exist.
    pub fn add(&self, region: Region) -> RegionResult<()> {
        self.check_priority(region.priority())?;
        self.check_flags(&region)?;
        let id = region.id().clone();
        self.commit("add", &id, |next| {
            if next.contains(&id) {
                return Err(RegionError::DuplicateId(id.clone()));
            }
            if let Some(parent) = region.parent() {
                if !next.contains(parent) {
                    return Err(RegionError::UnknownParent {
                        region: id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            next.insert(region)
        })
    }

    /// Removes a region. Its children lose their parent.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::NotFound`] if there is no such region.
    pub fn remove(&self, id: &RegionId) -> RegionResult<Region> {
        self.commit("remove", id, |next| {
            let removed = next.take(id)?;
            next.orphan_children(id);
            Ok(Arc::unwrap_or_clone(removed))
        })
    }

    /// Removes a region, handling its children per `strategy`. Returns the
    /// ids of every removed region, starting with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::NotFound`] if there is no such region.
    pub fn remove_with(
        &self,
        id: &RegionId,
        strategy: RemovalStrategy,
    ) -> RegionResult<Vec<RegionId>> {
        self.commit("remove", id, |next| match strategy {
            RemovalStrategy::UnsetParentInChildren => {
                next.take(id)?;
                next.orphan_children(id);
                Ok(vec![id.clone()])
            }
            RemovalStrategy::RemoveChildren => {
                if !next.contains(id) {
                    return Err(RegionError::NotFound(id.clone()));
                }
                let mut removed = vec![id.clone()];
                let mut cursor = 0;
                while cursor < removed.len() {
                    let children: Vec<RegionId> = next
                        .children_of(&removed[cursor])
                        .into_iter()
                        .map(|child| child.id().clone())
                        .filter(|child| !removed.contains(child))
                        .collect();
                    removed.extend(children);
                    cursor += 1;
                }
                for region in &removed {
                    next.take(region)?;
                }
                Ok(removed)
            }
        })
    }

    /// Replaces the shape of a region. Readers see either the old or the new
    /// shape, never neither.
    ///
    /// # Errors
    ///
    /// - [`RegionError::InvalidShape`] if the shape is degenerate.
    /// - [`RegionError::NotFound`] if there is no such region.
    /// - [`RegionError::ImmutableField`] when switching to or from a global
    ///   shape.
    pub fn redefine(&self, id: &RegionId, shape: Shape) -> RegionResult<()> {
        shape.validate()?;
        self.commit("redefine", id, |next| {
            let current = next
                .get(id)
                .ok_or_else(|| RegionError::NotFound(id.clone()))?;
            if current.is_global() || shape.is_global() {
                return Err(RegionError::ImmutableField {
                    region: id.clone(),
                    field: "shape",
                });
            }
            let mut region = current.clone();
            region.set_shape(shape)?;
            next.take(id)?;
            next.insert(region)
        })
    }

    /// Sets or clears the parent of a region.
    ///
    /// # Errors
    ///
    /// - [`RegionError::NotFound`] if there is no such region.
    /// - [`RegionError::UnknownParent`] if the parent does not exist.
    /// - [`RegionError::CircularInheritance`] if `id` is `parent` or one of
    ///   its ancestors. Neither region is modified.
    pub fn set_parent(&self, id: &RegionId, parent: Option<RegionId>) -> RegionResult<()> {
        self.commit("set_parent", id, |next| {
            if !next.contains(id) {
                return Err(RegionError::NotFound(id.clone()));
            }
            if let Some(parent) = &parent {
                if !next.contains(parent) {
                    return Err(RegionError::UnknownParent {
                        region: id.clone(),
                        parent: parent.clone(),
                    });
                }
                if next.is_ancestor_or_self(id, parent) {
                    return Err(RegionError::CircularInheritance {
                        region: id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            modify(next, id, |region| region.set_parent(parent))
        })
    }

    /// Changes the priority of a region.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidPriority`] if out of bounds and
    /// [`RegionError::NotFound`] if there is no such region.
    pub fn set_priority(&self, id: &RegionId, priority: i32) -> RegionResult<()> {
        self.check_priority(priority)?;
        self.commit("set_priority", id, |next| {
            modify(next, id, |region| {
                region.set_priority(priority);
                Ok(())
            })
        })
    }

    /// Sets a flag on a region, returning the previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::FlagTypeMismatch`] if a value has the wrong
    /// kind and [`RegionError::NotFound`] if there is no such region.
    pub fn set_flag(
        &self,
        id: &RegionId,
        flag: FlagId,
        entry: FlagEntry,
    ) -> RegionResult<Option<FlagEntry>> {
        self.registry.check_entry(&flag, &entry)?;
        self.commit("set_flag", id, |next| {
            modify(next, id, |region| Ok(region.set_flag(flag, entry)))
        })
    }

    /// Removes a flag from a region, returning the removed entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::NotFound`] if there is no such region.
    pub fn clear_flag(&self, id: &RegionId, flag: &FlagId) -> RegionResult<Option<FlagEntry>> {
        self.commit("clear_flag", id, |next| {
            modify(next, id, |region| Ok(region.clear_flag(flag)))
        })
    }

    /// Edits a copy of a region and publishes it if the result is valid.
    ///
    /// Owners, members, flags and priority may change. The id, shape and
    /// parent have their own operations.
    ///
    /// # Errors
    ///
    /// - [`RegionError::NotFound`] if there is no such region.
    /// - [`RegionError::ImmutableField`] if `edit` changed the id, shape or
    ///   parent.
    /// - [`RegionError::InvalidPriority`] or [`RegionError::FlagTypeMismatch`]
    ///   if the edited region does not validate.
    pub fn update(&self, id: &RegionId, edit: impl FnOnce(&mut Region)) -> RegionResult<()> {
        self.commit("update", id, |next| {
            let before = next
                .get(id)
                .ok_or_else(|| RegionError::NotFound(id.clone()))?;
            let mut region = before.clone();
            edit(&mut region);

            let changed = if region.id() != before.id() {
                Some("id")
            } else if region.shape() != before.shape() {
                Some("shape")
            } else if region.parent() != before.parent() {
                Some("parent")
            } else {
                None
            };
            if let Some(field) = changed {
                return Err(RegionError::ImmutableField {
                    region: id.clone(),
                    field,
                });
            }

            self.check_priority(region.priority())?;
            self.check_flags(&region)?;
            next.replace(region);
            Ok(())
        })
    }

    /// Replaces every region with `definitions` in one bulk build. Returns
    /// the number of regions loaded.
    ///
    /// # Errors
    ///
    /// Fails like [`RegionSet::from_definitions`]; the current regions are
    /// then kept.
    pub fn bulk_load(&self, definitions: Vec<RegionDefinition>) -> RegionResult<usize> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.snapshot().generation() + 1;
        let next = build_snapshot(definitions, generation, &self.config, &self.registry)?;
        let count = next.len();
        self.publish(next, "bulk_load")?;
        Ok(count)
    }

    fn check_priority(&self, priority: i32) -> RegionResult<()> {
        if self.config.priority_allowed(priority) {
            Ok(())
        } else {
            Err(RegionError::InvalidPriority {
                priority,
                min: self.config.min_priority(),
                max: self.config.max_priority(),
            })
        }
    }

    fn check_flags(&self, region: &Region) -> RegionResult<()> {
        check_flags(&self.registry, region)
    }

    /// Applies `apply` to a copy of the current snapshot and publishes it.
    fn commit<T>(
        &self,
        operation: &'static str,
        id: &RegionId,
        apply: impl FnOnce(&mut RegionSnapshot) -> RegionResult<T>,
    ) -> RegionResult<T> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = RegionSnapshot::clone(&self.snapshot());
        let value = apply(&mut next)?;
        next.next_generation();
        debug!(
            operation,
            region = %id,
            generation = next.generation(),
            "Committing region mutation"
        );
        self.publish(next, operation)?;
        Ok(value)
    }

    /// Verifies `next` if configured and makes it current. The writer lock
    /// must be held.
    fn publish(&self, next: RegionSnapshot, operation: &'static str) -> RegionResult<()> {
        if self.config.verify_commits() {
            if let Err(e) = next.check_consistency() {
                error!(
                    operation,
                    generation = next.generation(),
                    error = %e,
                    "Rejected mutation that failed the consistency check"
                );
                return Err(e);
            }
        }
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        Ok(())
    }
}

/// Replaces region `id` with an edited copy.
fn modify<T>(
    next: &mut RegionSnapshot,
    id: &RegionId,
    edit: impl FnOnce(&mut Region) -> RegionResult<T>,
) -> RegionResult<T> {
    let mut region = next
        .get(id)
        .ok_or_else(|| RegionError::NotFound(id.clone()))?
        .clone();
    let value = edit(&mut region)?;
    next.replace(region);
    Ok(value)
}

fn check_bounds(config: &WorldConfig) -> RegionResult<()> {
    if config.min_priority() > config.max_priority() {
        return Err(RegionError::InvalidPriority {
            priority: config.min_priority(),
            min: config.min_priority(),
            max: config.max_priority(),
        });
    }
    Ok(())
}

fn check_flags(registry: &FlagRegistry, region: &Region) -> RegionResult<()> {
    for (flag, entry) in region.flags().iter() {
        registry.check_entry(flag, entry)?;
    }
    Ok(())
}

/// Returns `true` if walking up from `from` reaches `target`.
fn reaches(regions: &HashMap<RegionId, Region>, from: &RegionId, target: &RegionId) -> bool {
    let mut current = Some(from);
    let mut steps = 0;
    while let Some(id) = current {
        if id == target {
            return true;
        }
        steps += 1;
        if steps > regions.len() {
            return false;
        }
        current = regions.get(id).and_then(Region::parent);
    }
    false
}

/// Builds a snapshot from stored definitions. Parents are attached only
/// after every region exists.
fn build_snapshot(
    definitions: Vec<RegionDefinition>,
    generation: u64,
    config: &WorldConfig,
    registry: &FlagRegistry,
) -> RegionResult<RegionSnapshot> {
    let mut regions: HashMap<RegionId, Region> = HashMap::with_capacity(definitions.len());
    let mut parents: Vec<(RegionId, String)> = Vec::new();

    for mut definition in definitions {
        let parent = definition.parent.take();
        let region = Region::from_definition(definition)?;
        if !config.priority_allowed(region.priority()) {
            return Err(RegionError::InvalidPriority {
                priority: region.priority(),
                min: config.min_priority(),
                max: config.max_priority(),
            });
        }
        check_flags(registry, &region)?;

        let id = region.id().clone();
        if regions.contains_key(&id) {
            return Err(RegionError::DuplicateId(id));
        }
        if let Some(parent) = parent {
            parents.push((id.clone(), parent));
        }
        regions.insert(id, region);
    }

    parents.sort();
    for (child, parent) in parents {
        let Some(parent) = RegionId::new(&parent)
            .ok()
            .filter(|parent| regions.contains_key(parent))
        else {
            warn!(region = %child, %parent, "Dropping unknown parent");
            continue;
        };
        if reaches(&regions, &parent, &child) {
            warn!(region = %child, %parent, "Dropping parent that would create a cycle");
            continue;
        }
        if let Some(region) = regions.get_mut(&child) {
            region.set_parent(Some(parent))?;
        }
    }

    let index = RTree::bulk_load(
        regions
            .values()
            .filter_map(|region| region.bounding_box().map(|bbox| (region.id().clone(), bbox))),
        *config.index(),
    )?;
    let stats = index.stats();
    info!(
        regions = regions.len(),
        indexed = stats.entries,
        height = stats.height,
        "Built region index"
    );

    let regions = regions
        .into_iter()
        .map(|(id, region)| (id, Arc::new(region)))
        .collect();
    Ok(RegionSnapshot::from_parts(generation, regions, index))
}
