//! Parent lookups and actor association.
//!
//! Regions name their parent by id. Walking the chain needs something that
//! turns ids back into regions; that is [`RegionLookup`]. Region sets
//! implement it over their entity table, and plain maps implement it for
//! tests and tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use hashbrown::HashMap;
use region_types::{ActorContext, Association, Region, RegionId};
use smallvec::SmallVec;

/// Resolves region ids to regions.
pub trait RegionLookup {
    /// Returns the region with this id, if present.
    fn region(&self, id: &RegionId) -> Option<&Region>;
}

impl<L: RegionLookup + ?Sized> RegionLookup for &L {
    fn region(&self, id: &RegionId) -> Option<&Region> {
        (**self).region(id)
    }
}

impl RegionLookup for HashMap<RegionId, Region> {
    fn region(&self, id: &RegionId) -> Option<&Region> {
        self.get(id)
    }
}

impl RegionLookup for HashMap<RegionId, Arc<Region>> {
    fn region(&self, id: &RegionId) -> Option<&Region> {
        self.get(id).map(AsRef::as_ref)
    }
}

impl RegionLookup for BTreeMap<RegionId, Region> {
    fn region(&self, id: &RegionId) -> Option<&Region> {
        self.get(id)
    }
}

/// A lookup with no regions. Every parent reference dangles, so chains stop
/// at the region itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParents;

impl RegionLookup for NoParents {
    fn region(&self, _id: &RegionId) -> Option<&Region> {
        None
    }
}

/// Iterator over a region followed by its ancestors.
///
/// Stops at the first parent the lookup cannot find (a dangling parent
/// counts as no parent) and at any region already visited.
pub struct Ancestors<'a, L: ?Sized> {
    lookup: &'a L,
    next: Option<&'a Region>,
    seen: SmallVec<[&'a RegionId; 8]>,
}

impl<'a, L: RegionLookup + ?Sized> Iterator for Ancestors<'a, L> {
    type Item = &'a Region;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if self.seen.contains(&current.id()) {
            return None;
        }
        self.seen.push(current.id());
        let lookup = self.lookup;
        self.next = current.parent().and_then(|parent| lookup.region(parent));
        Some(current)
    }
}

/// Iterates over `region` and then each of its ancestors.
///
/// # Example
///
/// ```
/// use hashbrown::HashMap;
/// use nalgebra::Point3;
/// use region_resolve::lookup::ancestors;
/// use region_types::{Region, RegionId, Shape};
///
/// let shape = Shape::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0))?;
/// let town = Region::new(RegionId::new("town")?, shape.clone())?;
/// let plot = Region::new(RegionId::new("plot")?, shape)?.with_parent(town.id().clone())?;
///
/// let mut table = HashMap::new();
/// table.insert(town.id().clone(), town.clone());
///
/// let chain: Vec<_> = ancestors(&table, &plot).map(|r| r.id().as_str()).collect();
/// assert_eq!(chain, vec!["plot", "town"]);
/// # Ok::<(), region_types::RegionError>(())
/// ```
pub fn ancestors<'a, L: RegionLookup + ?Sized>(lookup: &'a L, region: &'a Region) -> Ancestors<'a, L> {
    Ancestors {
        lookup,
        next: Some(region),
        seen: SmallVec::new(),
    }
}

/// How `actor` relates to `region`, counting ancestors.
///
/// An owner of the region or of any ancestor is an owner. Otherwise a
/// member of the region or of any ancestor is a member.
pub fn association<L: RegionLookup + ?Sized>(
    lookup: &L,
    region: &Region,
    actor: &ActorContext,
) -> Association {
    if actor.is_anonymous() {
        return Association::NonMember;
    }
    let mut member = false;
    for current in ancestors(lookup, region) {
        if current.owners().contains(actor) {
            return Association::Owner;
        }
        member |= current.members().contains(actor);
    }
    if member {
        Association::Member
    } else {
        Association::NonMember
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use region_types::{Domain, Shape};
    use uuid::Uuid;

    fn region(id: &str) -> Region {
        Region::new(
            RegionId::new(id).unwrap(),
            Shape::cuboid(Point3::origin(), Point3::new(4.0, 4.0, 4.0)).unwrap(),
        )
        .unwrap()
    }

    fn child(id: &str, parent: &str) -> Region {
        region(id).with_parent(RegionId::new(parent).unwrap()).unwrap()
    }

    fn table(regions: Vec<Region>) -> HashMap<RegionId, Region> {
        regions.into_iter().map(|r| (r.id().clone(), r)).collect()
    }

    #[test]
    fn test_chain_order() {
        let lookup = table(vec![region("a"), child("b", "a"), child("c", "b")]);
        let c = lookup.region(&RegionId::new("c").unwrap()).unwrap();
        let chain: Vec<_> = ancestors(&lookup, c).map(|r| r.id().as_str()).collect();
        assert_eq!(chain, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_dangling_parent_ends_chain() {
        let lookup = table(vec![child("orphan", "gone")]);
        let orphan = lookup.region(&RegionId::new("orphan").unwrap()).unwrap();
        assert_eq!(ancestors(&lookup, orphan).count(), 1);
        assert_eq!(ancestors(&NoParents, orphan).count(), 1);
    }

    #[test]
    fn test_cycle_terminates() {
        let lookup = table(vec![child("x", "y"), child("y", "x")]);
        let x = lookup.region(&RegionId::new("x").unwrap()).unwrap();
        assert_eq!(ancestors(&lookup, x).count(), 2);
    }

    #[test]
    fn test_association_inherits() {
        let alice = Uuid::from_u128(1);
        let bob = Uuid::from_u128(2);
        let lookup = table(vec![
            region("town").with_owners(Domain::new().with_player(alice)),
            child("plot", "town").with_members(Domain::new().with_player(bob).with_player(alice)),
        ]);
        let plot = lookup.region(&RegionId::new("plot").unwrap()).unwrap();
        let town = lookup.region(&RegionId::new("town").unwrap()).unwrap();

        assert_eq!(association(&lookup, plot, &ActorContext::player(alice)), Association::Owner);
        assert_eq!(association(&lookup, plot, &ActorContext::player(bob)), Association::Member);
        assert_eq!(association(&lookup, town, &ActorContext::player(bob)), Association::NonMember);
        assert_eq!(
            association(&lookup, plot, &ActorContext::anonymous()),
            Association::NonMember
        );
    }

    #[test]
    fn test_association_by_group() {
        let lookup = table(vec![region("hall").with_members(Domain::new().with_group("guild"))]);
        let hall = lookup.region(&RegionId::new("hall").unwrap()).unwrap();
        let actor = ActorContext::player(Uuid::from_u128(9)).with_group("Guild");
        assert_eq!(association(&lookup, hall, &actor), Association::Member);
    }
}
