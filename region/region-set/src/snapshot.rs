//! Immutable views of a world's regions.
//!
//! A [`RegionSnapshot`] is never modified once published. Writers build a
//! new one from a copy (the index shares unchanged nodes with the old one)
//! and swap it in, so a reader holding a snapshot always sees one
//! consistent generation.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use nalgebra::Point3;
use region_resolve::{FlagResolver, RegionLookup, ResolvedValue};
use region_types::{
    ActorContext, FlagId, FlagRegistry, FlagValue, Region, RegionDefinition, RegionError, RegionId,
    RegionResult, RegionSummary, Shape,
};
use ward_spatial::{Aabb, RTree, TreeStats};

/// One consistent generation of a world's regions.
#[derive(Debug, Clone)]
pub struct RegionSnapshot {
    generation: u64,
    regions: HashMap<RegionId, Arc<Region>>,
    globals: Vec<RegionId>,
    index: RTree<RegionId>,
}

impl RegionSnapshot {
    pub(crate) fn empty(index: RTree<RegionId>) -> Self {
        Self {
            generation: 0,
            regions: HashMap::new(),
            globals: Vec::new(),
            index,
        }
    }

    /// Builds a snapshot from regions that are already checked.
    pub(crate) fn from_parts(
        generation: u64,
        regions: HashMap<RegionId, Arc<Region>>,
        index: RTree<RegionId>,
    ) -> Self {
        let mut snapshot = Self {
            generation,
            regions,
            globals: Vec::new(),
            index,
        };
        snapshot.globals = snapshot
            .regions
            .values()
            .filter(|region| region.is_global())
            .map(|region| region.id().clone())
            .collect();
        snapshot.sort_globals();
        snapshot
    }

    /// Monotonic version number; each published mutation adds one.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of regions, global ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if there are no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Returns the region with this id.
    #[must_use]
    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.get(id).map(AsRef::as_ref)
    }

    /// Returns `true` if a region with this id exists.
    #[must_use]
    pub fn contains(&self, id: &RegionId) -> bool {
        self.regions.contains_key(id)
    }

    /// Iterates over every region in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values().map(AsRef::as_ref)
    }

    /// Returns every region id, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<RegionId> {
        let mut ids: Vec<_> = self.regions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns the regions whose parent is `id`, sorted by id.
    #[must_use]
    pub fn children_of(&self, id: &RegionId) -> Vec<&Region> {
        let mut children: Vec<&Region> = self
            .iter()
            .filter(|region| region.parent() == Some(id))
            .collect();
        children.sort_by(|a, b| a.id().cmp(b.id()));
        children
    }

    /// Returns the regions containing `point`, in precedence order:
    /// non-global regions by descending priority then id, then global
    /// regions.
    ///
    /// # Example
    ///
    /// ```
    /// use nalgebra::Point3;
    /// use region_set::{RegionSet, WorldConfig};
    /// use region_types::{FlagRegistry, Region, RegionId, Shape};
    /// use std::sync::Arc;
    ///
    /// let set = RegionSet::new(WorldConfig::default(), Arc::new(FlagRegistry::with_defaults()))?;
    /// let cube = |lo: f64, hi: f64| Shape::cuboid(Point3::new(lo, lo, lo), Point3::new(hi, hi, hi));
    /// set.add(Region::new(RegionId::new("outer")?, cube(0.0, 10.0)?)?)?;
    /// set.add(Region::new(RegionId::new("inner")?, cube(2.0, 8.0)?)?.with_priority(5))?;
    ///
    /// let snapshot = set.snapshot();
    /// let ids: Vec<_> = snapshot
    ///     .applicable_regions(&Point3::new(5.0, 5.0, 5.0))
    ///     .iter()
    ///     .map(|r| r.id().as_str())
    ///     .collect();
    /// assert_eq!(ids, vec!["inner", "outer"]);
    /// # Ok::<(), region_types::RegionError>(())
    /// ```
    #[must_use]
    pub fn applicable_regions(&self, point: &Point3<f64>) -> Vec<&Region> {
        let mut found = Vec::new();
        self.index.for_each_containing(point, |id, _| {
            if let Some(region) = self.get(id) {
                if region.contains(point) {
                    found.push(region);
                }
            }
        });
        found.sort_by(|a: &&Region, b: &&Region| a.cmp_precedence(b));
        found.extend(self.globals());
        found
    }

    /// Returns the regions whose bounding box intersects `area`, in
    /// precedence order. Global regions are not included.
    #[must_use]
    pub fn regions_overlapping(&self, area: &Aabb) -> Vec<&Region> {
        let mut found = Vec::new();
        self.index.for_each_intersecting(area, |id, _| {
            if let Some(region) = self.get(id) {
                found.push(region);
            }
        });
        found.sort_by(|a: &&Region, b: &&Region| a.cmp_precedence(b));
        found
    }

    /// Returns the regions whose shape intersects `shape`, in precedence
    /// order. Global regions are not included.
    #[must_use]
    pub fn regions_intersecting(&self, shape: &Shape) -> Vec<&Region> {
        let Some(area) = shape.bounding_box() else {
            return Vec::new();
        };
        let mut found = self.regions_overlapping(&area);
        found.retain(|region| region.shape().intersects(shape));
        found
    }

    /// Resolves `flag` at `point` for `actor`.
    #[must_use]
    pub fn resolve(
        &self,
        registry: &FlagRegistry,
        defaults: &HashMap<FlagId, FlagValue>,
        point: &Point3<f64>,
        flag: &FlagId,
        actor: Option<&ActorContext>,
    ) -> ResolvedValue {
        let candidates = self.applicable_regions(point);
        FlagResolver::new(registry)
            .with_defaults(defaults)
            .resolve(self, &candidates, flag, actor)
    }

    /// Summaries of the regions containing `point`, in precedence order.
    #[must_use]
    pub fn summaries_at(&self, point: &Point3<f64>) -> Vec<RegionSummary> {
        self.applicable_regions(point)
            .into_iter()
            .map(RegionSummary::from)
            .collect()
    }

    /// Every region as plain data, sorted by id.
    #[must_use]
    pub fn definitions(&self) -> Vec<RegionDefinition> {
        self.ids()
            .iter()
            .filter_map(|id| self.get(id))
            .map(Region::to_definition)
            .collect()
    }

    /// Shape statistics of the spatial index.
    #[must_use]
    pub fn index_stats(&self) -> TreeStats {
        self.index.stats()
    }

    /// Checks every structural invariant.
    ///
    /// - indexed ids are exactly the non-global region ids
    /// - each indexed box equals its region's bounding box
    /// - the globals list names exactly the global regions
    /// - every parent exists and no parent chain loops
    /// - the index itself is well formed
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InconsistentState`] describing the first
    /// violation found.
    pub fn check_consistency(&self) -> RegionResult<()> {
        let mut non_global = 0;
        for (id, region) in &self.regions {
            if region.id() != id {
                return Err(RegionError::inconsistent(format!(
                    "region {} stored under id {id}",
                    region.id()
                )));
            }
            match region.bounding_box() {
                Some(expected) => {
                    non_global += 1;
                    match self.index.get(id) {
                        Some(indexed) if *indexed == expected => {}
                        Some(_) => {
                            return Err(RegionError::inconsistent(format!(
                                "indexed box of {id} does not match its shape"
                            )));
                        }
                        None => {
                            return Err(RegionError::inconsistent(format!(
                                "region {id} is missing from the index"
                            )));
                        }
                    }
                }
                None => {
                    if !self.globals.contains(id) {
                        return Err(RegionError::inconsistent(format!(
                            "global region {id} is not listed"
                        )));
                    }
                }
            }
        }

        if self.index.len() != non_global {
            return Err(RegionError::inconsistent(format!(
                "index holds {} ids but {non_global} regions are indexable",
                self.index.len()
            )));
        }
        if self.globals.len() != self.regions.len() - non_global {
            return Err(RegionError::inconsistent("globals list is out of date"));
        }

        for region in self.regions.values() {
            if let Some(parent) = region.parent() {
                if !self.regions.contains_key(parent) {
                    return Err(RegionError::inconsistent(format!(
                        "parent {parent} of {} does not exist",
                        region.id()
                    )));
                }
            }
            if let Some(cycle) = self.cycle_through(region.id()) {
                return Err(RegionError::inconsistent(format!(
                    "parent chain of {} loops back to {cycle}",
                    region.id()
                )));
            }
        }

        self.index.check_invariants().map_err(|e| {
            RegionError::inconsistent(format!("spatial index: {e}"))
        })
    }

    /// Returns the first id seen twice while walking up from `start`.
    pub(crate) fn cycle_through(&self, start: &RegionId) -> Option<RegionId> {
        let mut seen = HashSet::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if !seen.insert(id) {
                return Some(id.clone());
            }
            current = self.get(id).and_then(Region::parent);
        }
        None
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: &RegionId, id: &RegionId) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(id);
        while let Some(next) = current {
            if next == ancestor {
                return true;
            }
            if !seen.insert(next) {
                return false;
            }
            current = self.get(next).and_then(Region::parent);
        }
        false
    }

    fn globals(&self) -> impl Iterator<Item = &Region> {
        self.globals.iter().filter_map(|id| self.get(id))
    }

    fn sort_globals(&mut self) {
        let regions = &self.regions;
        self.globals.sort_by(|a, b| match (regions.get(a), regions.get(b)) {
            (Some(a), Some(b)) => a.cmp_precedence(b),
            _ => a.cmp(b),
        });
    }

    // Mutation helpers for the region set. None of these are visible to
    // readers until the snapshot is published.

    pub(crate) fn next_generation(&mut self) {
        self.generation += 1;
    }

    pub(crate) fn insert(&mut self, region: Region) -> RegionResult<()> {
        let id = region.id().clone();
        match region.bounding_box() {
            Some(bbox) => self.index.insert(id.clone(), bbox)?,
            None => {
                self.globals.push(id.clone());
            }
        }
        self.regions.insert(id, Arc::new(region));
        self.sort_globals();
        Ok(())
    }

    pub(crate) fn take(&mut self, id: &RegionId) -> RegionResult<Arc<Region>> {
        let region = self
            .regions
            .remove(id)
            .ok_or_else(|| RegionError::NotFound(id.clone()))?;
        if region.is_global() {
            self.globals.retain(|g| g != id);
        } else {
            self.index.remove(id)?;
        }
        Ok(region)
    }

    /// Replaces a region whose id and extent are unchanged.
    pub(crate) fn replace(&mut self, region: Region) {
        let id = region.id().clone();
        let global = region.is_global();
        self.regions.insert(id, Arc::new(region));
        if global {
            self.sort_globals();
        }
    }

    pub(crate) fn region_mut(&mut self, id: &RegionId) -> Option<&mut Region> {
        self.regions.get_mut(id).map(Arc::make_mut)
    }

    /// Clears the parent of every child of `id`, returning their ids.
    pub(crate) fn orphan_children(&mut self, id: &RegionId) -> Vec<RegionId> {
        let children: Vec<RegionId> = self
            .children_of(id)
            .into_iter()
            .map(|child| child.id().clone())
            .collect();
        for child in &children {
            if let Some(region) = self.region_mut(child) {
                // Clearing a parent cannot fail.
                let _ = region.set_parent(None);
            }
        }
        children
    }
}

impl RegionLookup for RegionSnapshot {
    fn region(&self, id: &RegionId) -> Option<&Region> {
        self.get(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn cube(id: &str, lo: f64, hi: f64) -> Region {
        Region::new(
            RegionId::new(id).unwrap(),
            Shape::cuboid(Point3::new(lo, lo, lo), Point3::new(hi, hi, hi)).unwrap(),
        )
        .unwrap()
    }

    fn snapshot(regions: Vec<Region>) -> RegionSnapshot {
        let mut snapshot = RegionSnapshot::empty(RTree::new());
        for region in regions {
            snapshot.insert(region).unwrap();
        }
        snapshot
    }

    #[test]
    fn test_applicable_order() {
        let snapshot = snapshot(vec![
            cube("b", 0.0, 10.0),
            cube("a", 0.0, 10.0),
            cube("top", 4.0, 6.0).with_priority(3),
            Region::global(),
            cube("far", 50.0, 60.0),
        ]);
        let ids: Vec<_> = snapshot
            .applicable_regions(&Point3::new(5.0, 5.0, 5.0))
            .iter()
            .map(|r| r.id().as_str())
            .collect();
        assert_eq!(ids, vec!["top", "a", "b", "__global__"]);
        snapshot.check_consistency().unwrap();
    }

    #[test]
    fn test_polygon_filtered_exactly() {
        let triangle = Region::new(
            RegionId::new("tri").unwrap(),
            Shape::polygon(
                vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), Point2::new(0.0, 10.0)],
                0.0,
                10.0,
            )
            .unwrap(),
        )
        .unwrap();
        let snapshot = snapshot(vec![triangle]);
        // Inside the bounding box but outside the triangle.
        assert!(snapshot.applicable_regions(&Point3::new(9.0, 5.0, 9.0)).is_empty());
        assert_eq!(snapshot.applicable_regions(&Point3::new(1.0, 5.0, 1.0)).len(), 1);
    }

    #[test]
    fn test_overlapping_and_intersecting() {
        let triangle = Region::new(
            RegionId::new("tri").unwrap(),
            Shape::polygon(
                vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), Point2::new(0.0, 10.0)],
                0.0,
                10.0,
            )
            .unwrap(),
        )
        .unwrap();
        let snapshot = snapshot(vec![triangle, cube("box", 20.0, 30.0), Region::global()]);

        let corner = Shape::cuboid(Point3::new(8.0, 0.0, 8.0), Point3::new(9.0, 1.0, 9.0)).unwrap();
        assert_eq!(snapshot.regions_overlapping(&corner.bounding_box().unwrap()).len(), 1);
        assert!(snapshot.regions_intersecting(&corner).is_empty());
        assert!(snapshot.regions_intersecting(&Shape::Global).is_empty());

        let wide = Aabb::new(Point3::new(-100.0, -100.0, -100.0), Point3::new(100.0, 100.0, 100.0)).unwrap();
        assert_eq!(snapshot.regions_overlapping(&wide).len(), 2);
    }

    #[test]
    fn test_take_and_orphan() {
        let parent = cube("parent", 0.0, 10.0);
        let child = cube("child", 1.0, 2.0).with_parent(parent.id().clone()).unwrap();
        let mut snapshot = snapshot(vec![parent, child]);

        let parent_id = RegionId::new("parent").unwrap();
        assert_eq!(snapshot.children_of(&parent_id).len(), 1);
        snapshot.take(&parent_id).unwrap();
        let orphans = snapshot.orphan_children(&parent_id);
        assert_eq!(orphans, vec![RegionId::new("child").unwrap()]);
        assert!(snapshot.get(&orphans[0]).unwrap().parent().is_none());
        snapshot.check_consistency().unwrap();

        assert!(snapshot.take(&parent_id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_consistency_detects_dangling_parent() {
        let child = cube("child", 1.0, 2.0)
            .with_parent(RegionId::new("ghost").unwrap())
            .unwrap();
        let snapshot = snapshot(vec![child]);
        assert!(snapshot.check_consistency().unwrap_err().is_inconsistent());
    }

    #[test]
    fn test_cycle_detection() {
        let a = cube("a", 0.0, 1.0).with_parent(RegionId::new("b").unwrap()).unwrap();
        let b = cube("b", 0.0, 1.0).with_parent(RegionId::new("a").unwrap()).unwrap();
        let snapshot = snapshot(vec![a, b]);
        let a_id = RegionId::new("a").unwrap();
        assert!(snapshot.cycle_through(&a_id).is_some());
        assert!(snapshot.check_consistency().is_err());
        assert!(snapshot.is_ancestor_or_self(&RegionId::new("b").unwrap(), &a_id));
    }

    #[test]
    fn test_definitions_sorted() {
        let snapshot = snapshot(vec![cube("zed", 0.0, 1.0), cube("alpha", 0.0, 1.0)]);
        let ids: Vec<_> = snapshot.definitions().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["alpha", "zed"]);
        assert_eq!(snapshot.index_stats().entries, 2);
    }
}
