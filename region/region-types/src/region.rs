//! The region entity and its plain-data forms.

use std::cmp::Ordering;

use nalgebra::Point3;
use ward_spatial::Aabb;

use crate::domain::{ActorContext, Association, Domain};
use crate::error::{RegionError, RegionResult};
use crate::flag::{FlagEntry, FlagId, FlagMap};
use crate::id::RegionId;
use crate::shape::{Shape, ShapeKind};

/// One protected area.
///
/// The id never changes. The shape is replaced wholesale, never edited in
/// place. The parent is a reference by id into the same region set; the set
/// checks that it exists and that the chain is acyclic.
///
/// # Example
///
/// ```
/// use nalgebra::Point3;
/// use region_types::{FlagEntry, FlagId, Region, RegionId, Shape, State};
///
/// let arena = Region::new(
///     RegionId::new("arena")?,
///     Shape::cuboid(Point3::new(2.0, 2.0, 2.0), Point3::new(8.0, 8.0, 8.0))?,
/// )?
/// .with_priority(10)
/// .with_flag(FlagId::new("pvp"), FlagEntry::new(State::Allow));
///
/// assert!(arena.contains(&Point3::new(5.0, 5.0, 5.0)));
/// assert_eq!(arena.priority(), 10);
/// # Ok::<(), region_types::RegionError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: RegionId,
    shape: Shape,
    priority: i32,
    flags: FlagMap,
    owners: Domain,
    members: Domain,
    parent: Option<RegionId>,
}

impl Region {
    /// Creates a region with priority 0 and no flags, owners or parent.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidShape`] if the shape is degenerate.
    pub fn new(id: RegionId, shape: Shape) -> RegionResult<Self> {
        shape.validate()?;
        Ok(Self {
            id,
            shape,
            priority: 0,
            flags: FlagMap::new(),
            owners: Domain::new(),
            members: Domain::new(),
            parent: None,
        })
    }

    /// Creates the conventional `__global__` region.
    #[must_use]
    pub fn global() -> Self {
        Self {
            id: RegionId::global(),
            shape: Shape::Global,
            priority: 0,
            flags: FlagMap::new(),
            owners: Domain::new(),
            members: Domain::new(),
            parent: None,
        }
    }

    /// Rebuilds a region from its plain-data form, validating everything
    /// that can be checked without the rest of the set.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidId`] for a malformed id or parent id,
    /// [`RegionError::InvalidShape`] for a degenerate shape, and
    /// [`RegionError::CircularInheritance`] if the region names itself as
    /// parent.
    pub fn from_definition(definition: RegionDefinition) -> RegionResult<Self> {
        let id = RegionId::new(&definition.id)?;
        let mut region = Self::new(id, definition.shape)?;
        region.priority = definition.priority;
        region.flags = definition.flags.into_iter().collect();
        region.owners = definition.owners;
        region.members = definition.members;
        if let Some(parent) = definition.parent {
            region.set_parent(Some(RegionId::new(parent)?))?;
        }
        Ok(region)
    }

    /// Exports the region as plain data. Flags are sorted by id.
    #[must_use]
    pub fn to_definition(&self) -> RegionDefinition {
        RegionDefinition {
            id: self.id.to_string(),
            shape: self.shape.clone(),
            priority: self.priority,
            flags: self
                .flags
                .sorted()
                .into_iter()
                .map(|(flag, entry)| (flag.clone(), entry.clone()))
                .collect(),
            owners: self.owners.clone(),
            members: self.members.clone(),
            parent: self.parent.as_ref().map(ToString::to_string),
        }
    }

    /// Returns the id.
    #[must_use]
    pub const fn id(&self) -> &RegionId {
        &self.id
    }

    /// Returns the shape.
    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the priority. Higher wins.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns the flags.
    #[must_use]
    pub const fn flags(&self) -> &FlagMap {
        &self.flags
    }

    /// Returns the flags for editing.
    pub fn flags_mut(&mut self) -> &mut FlagMap {
        &mut self.flags
    }

    /// Returns the owners.
    #[must_use]
    pub const fn owners(&self) -> &Domain {
        &self.owners
    }

    /// Returns the owners for editing.
    pub fn owners_mut(&mut self) -> &mut Domain {
        &mut self.owners
    }

    /// Returns the members.
    #[must_use]
    pub const fn members(&self) -> &Domain {
        &self.members
    }

    /// Returns the members for editing.
    pub fn members_mut(&mut self) -> &mut Domain {
        &mut self.members
    }

    /// Returns the parent id.
    #[must_use]
    pub const fn parent(&self) -> Option<&RegionId> {
        self.parent.as_ref()
    }

    /// Returns `true` for a global region.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.shape.is_global()
    }

    /// Returns the box the spatial index stores for this region.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.shape.bounding_box()
    }

    /// Returns `true` if the region's shape contains `point`.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        self.shape.contains(point)
    }

    /// Returns the flag entry for `flag`.
    #[must_use]
    pub fn flag(&self, flag: &FlagId) -> Option<&FlagEntry> {
        self.flags.get(flag)
    }

    /// Sets the parent, or clears it with `None`.
    ///
    /// Only self-reference is checked here; the region set checks the rest
    /// of the chain.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::CircularInheritance`] if `parent` is this
    /// region.
    pub fn set_parent(&mut self, parent: Option<RegionId>) -> RegionResult<()> {
        if let Some(parent) = &parent {
            if *parent == self.id {
                return Err(RegionError::CircularInheritance {
                    region: self.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
        self.parent = parent;
        Ok(())
    }

    /// Replaces the shape.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidShape`] if the shape is degenerate.
    pub fn set_shape(&mut self, shape: Shape) -> RegionResult<()> {
        shape.validate()?;
        self.shape = shape;
        Ok(())
    }

    /// Sets the priority.
    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Sets a flag, returning the previous entry. An empty entry clears it.
    pub fn set_flag(&mut self, flag: FlagId, entry: FlagEntry) -> Option<FlagEntry> {
        self.flags.set(flag, entry)
    }

    /// Clears a flag, returning the previous entry.
    pub fn clear_flag(&mut self, flag: &FlagId) -> Option<FlagEntry> {
        self.flags.remove(flag)
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets a flag.
    #[must_use]
    pub fn with_flag(mut self, flag: FlagId, entry: FlagEntry) -> Self {
        self.flags.set(flag, entry);
        self
    }

    /// Replaces the owners.
    #[must_use]
    pub fn with_owners(mut self, owners: Domain) -> Self {
        self.owners = owners;
        self
    }

    /// Replaces the members.
    #[must_use]
    pub fn with_members(mut self, members: Domain) -> Self {
        self.members = members;
        self
    }

    /// Sets the parent.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::CircularInheritance`] if `parent` is this
    /// region.
    pub fn with_parent(mut self, parent: RegionId) -> RegionResult<Self> {
        self.set_parent(Some(parent))?;
        Ok(self)
    }

    /// How the actor is listed on this region alone, ignoring ancestors.
    #[must_use]
    pub fn association_direct(&self, actor: &ActorContext) -> Association {
        if self.owners.contains(actor) {
            Association::Owner
        } else if self.members.contains(actor) {
            Association::Member
        } else {
            Association::NonMember
        }
    }

    /// Returns `true` if no owners and no members are listed.
    #[must_use]
    pub fn has_no_members(&self) -> bool {
        self.owners.is_empty() && self.members.is_empty()
    }

    /// Query precedence: non-global before global, then higher priority,
    /// then id.
    #[must_use]
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        self.is_global()
            .cmp(&other.is_global())
            .then_with(|| other.priority.cmp(&self.priority))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A region as plain data, as exchanged with a region store.
///
/// Ids are raw strings here; [`Region::from_definition`] validates them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionDefinition {
    /// Region id.
    pub id: String,
    /// Extent.
    pub shape: Shape,
    /// Priority; higher wins.
    pub priority: i32,
    /// Flag entries.
    pub flags: Vec<(FlagId, FlagEntry)>,
    /// Owners.
    pub owners: Domain,
    /// Members.
    pub members: Domain,
    /// Parent region id.
    pub parent: Option<String>,
}

impl RegionDefinition {
    /// A definition with priority 0 and nothing else set.
    #[must_use]
    pub fn new(id: impl Into<String>, shape: Shape) -> Self {
        Self {
            id: id.into(),
            shape,
            priority: 0,
            flags: Vec::new(),
            owners: Domain::new(),
            members: Domain::new(),
            parent: None,
        }
    }
}

/// Diagnostic view of a region.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionSummary {
    /// Region id.
    pub id: RegionId,
    /// Shape variant.
    pub kind: ShapeKind,
    /// Priority.
    pub priority: i32,
    /// Bounding box; `None` for global regions.
    pub bounds: Option<Aabb>,
    /// Parent id.
    pub parent: Option<RegionId>,
    /// Number of flags set.
    pub flag_count: usize,
    /// Number of owner entries.
    pub owner_count: usize,
    /// Number of member entries.
    pub member_count: usize,
}

impl From<&Region> for RegionSummary {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id.clone(),
            kind: region.shape.kind(),
            priority: region.priority,
            bounds: region.bounding_box(),
            parent: region.parent.clone(),
            flag_count: region.flags.len(),
            owner_count: region.owners.len(),
            member_count: region.members.len(),
        }
    }
}
