//! Whether an actor belongs everywhere it stands.

use region_types::{ActorContext, Region, RegionId};
use smallvec::SmallVec;

use crate::effective::{passes_through, rank};
use crate::lookup::{RegionLookup, ancestors, association};

/// Outcome of a membership test over a set of candidate regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Membership {
    /// No region counted: none applied, or all pass through.
    NoRegions,
    /// The actor is not a member of every counted region.
    Fail,
    /// The actor is a member of every counted region.
    Success,
}

impl Membership {
    /// Returns `true` for [`Membership::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Tests `actor` against `candidates`, which must be in precedence order.
///
/// Only the highest-priority regions that count are considered; a region
/// counts unless its effective `passthrough` is allow. The actor must be a
/// member (or owner) of each counted region, except that membership of a
/// child region also satisfies its ancestors.
///
/// Returns the outcome and the ids of the counted regions.
pub fn membership<'r, L: RegionLookup + ?Sized>(
    lookup: &'r L,
    candidates: &[&'r Region],
    actor: &ActorContext,
) -> (Membership, Vec<RegionId>) {
    let mut minimum: Option<i64> = None;
    let mut counted = Vec::new();
    let mut needs_clear: SmallVec<[&RegionId; 8]> = SmallVec::new();
    let mut cleared: SmallVec<[&RegionId; 8]> = SmallVec::new();

    for &region in candidates {
        let priority = rank(region);
        if minimum.is_some_and(|minimum| priority < minimum) {
            break;
        }
        if passes_through(lookup, region, Some(actor)) {
            continue;
        }

        minimum = Some(priority);
        counted.push(region.id().clone());

        if cleared.contains(&region.id()) {
            continue;
        }
        if association(lookup, region, actor).is_member() {
            for parent in ancestors(lookup, region).skip(1) {
                if let Some(index) = needs_clear.iter().position(|id| *id == parent.id()) {
                    needs_clear.swap_remove(index);
                } else {
                    cleared.push(parent.id());
                }
            }
        } else {
            needs_clear.push(region.id());
        }
    }

    let outcome = if counted.is_empty() {
        Membership::NoRegions
    } else if needs_clear.is_empty() {
        Membership::Success
    } else {
        Membership::Fail
    };
    (outcome, counted)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lookup::NoParents;
    use hashbrown::HashMap;
    use nalgebra::Point3;
    use region_types::{Domain, FlagEntry, FlagId, Shape, State, names};
    use uuid::Uuid;

    const ALICE: Uuid = Uuid::from_u128(1);

    fn region(id: &str, priority: i32) -> Region {
        Region::new(
            RegionId::new(id).unwrap(),
            Shape::cuboid(Point3::origin(), Point3::new(4.0, 4.0, 4.0)).unwrap(),
        )
        .unwrap()
        .with_priority(priority)
    }

    fn alice() -> ActorContext {
        ActorContext::player(ALICE)
    }

    fn members() -> Domain {
        Domain::new().with_player(ALICE)
    }

    #[test]
    fn test_no_regions() {
        assert_eq!(membership(&NoParents, &[], &alice()).0, Membership::NoRegions);
        let global = Region::global();
        assert_eq!(membership(&NoParents, &[&global], &alice()).0, Membership::NoRegions);
    }

    #[test]
    fn test_must_be_member_of_all_at_top_priority() {
        let a = region("a", 0).with_members(members());
        let b = region("b", 0);
        assert_eq!(membership(&NoParents, &[&a, &b], &alice()).0, Membership::Fail);

        let b = region("b", 0).with_members(members());
        let (outcome, counted) = membership(&NoParents, &[&a, &b], &alice());
        assert_eq!(outcome, Membership::Success);
        assert_eq!(counted.len(), 2);
    }

    #[test]
    fn test_lower_priority_ignored() {
        let top = region("top", 5).with_members(members());
        let below = region("below", 1);
        let (outcome, counted) = membership(&NoParents, &[&top, &below], &alice());
        assert_eq!(outcome, Membership::Success);
        assert_eq!(counted, vec![top.id().clone()]);
    }

    #[test]
    fn test_passthrough_not_counted() {
        let open = region("open", 5).with_flag(
            FlagId::new(names::PASSTHROUGH),
            FlagEntry::new(State::Allow),
        );
        let owned = region("owned", 0).with_members(members());
        let (outcome, counted) = membership(&NoParents, &[&open, &owned], &alice());
        assert_eq!(outcome, Membership::Success);
        assert_eq!(counted, vec![owned.id().clone()]);
    }

    #[test]
    fn test_child_membership_clears_parent() {
        let parent = region("parent", 0);
        let child = region("child", 0)
            .with_parent(parent.id().clone())
            .unwrap()
            .with_members(members());
        let lookup: HashMap<_, _> = [
            (parent.id().clone(), parent.clone()),
            (child.id().clone(), child.clone()),
        ]
        .into_iter()
        .collect();

        // Parent first, then child.
        assert_eq!(membership(&lookup, &[&parent, &child], &alice()).0, Membership::Success);
        // Child first, then parent.
        assert_eq!(membership(&lookup, &[&child, &parent], &alice()).0, Membership::Success);
        // Someone else fails both.
        let stranger = ActorContext::player(Uuid::from_u128(2));
        assert_eq!(membership(&lookup, &[&child, &parent], &stranger).0, Membership::Fail);
    }

    #[test]
    fn test_global_with_members_counts() {
        let global = Region::global().with_members(members());
        assert_eq!(membership(&NoParents, &[&global], &alice()).0, Membership::Success);
        assert_eq!(
            membership(&NoParents, &[&global], &ActorContext::anonymous()).0,
            Membership::Fail
        );
        assert!(Membership::Success.is_success());
    }
}
