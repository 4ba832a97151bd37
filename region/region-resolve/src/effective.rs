//! A single region's value for a flag, following the parent chain.

use region_types::{
    ActorContext, Association, Combinator, FlagDefinition, FlagId, FlagKind, FlagValue, Region,
    RegionGroup, State, names,
};

use crate::lookup::{RegionLookup, ancestors, association};

static ALLOW: FlagValue = FlagValue::State(State::Allow);

/// The parts of a flag definition resolution needs.
///
/// Unregistered flags get an unscoped first-match rule that accepts any
/// value kind.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Rule<'a> {
    pub flag: &'a FlagId,
    pub kind: Option<FlagKind>,
    pub combinator: Combinator,
    pub default_group: Option<RegionGroup>,
    pub membership_fallback: bool,
    pub passthrough: bool,
}

impl<'a> Rule<'a> {
    pub fn new(flag: &'a FlagId, definition: Option<&'a FlagDefinition>) -> Self {
        let passthrough = flag.as_str() == names::PASSTHROUGH;
        match definition {
            Some(definition) => Self {
                flag,
                kind: Some(definition.kind()),
                combinator: definition.combinator(),
                default_group: definition.default_group(),
                membership_fallback: definition.membership_fallback(),
                passthrough,
            },
            None => Self {
                flag,
                kind: None,
                combinator: Combinator::FirstMatch,
                default_group: None,
                membership_fallback: false,
                passthrough,
            },
        }
    }

    fn accepts(&self, value: &FlagValue) -> bool {
        self.kind.is_none_or(|kind| value.kind() == kind)
    }
}

/// Returns the value `region` gives `actor` for the rule's flag, and the
/// region in its chain that supplied it.
///
/// The region is tried first, then each ancestor; the first one whose entry
/// yields a value for the actor wins. Group scopes are tested against the
/// actor's association with `region` itself (which already counts
/// ancestors), not with the ancestor holding the entry.
///
/// Global regions are special: they pass through unless they list owners or
/// members or set `passthrough` to deny themselves, and an allow on a
/// membership-fallback flag (such as `build`) is ignored there.
pub(crate) fn effective_value<'r, L: RegionLookup + ?Sized>(
    lookup: &'r L,
    region: &'r Region,
    rule: &Rule<'_>,
    actor: Option<&ActorContext>,
) -> Option<(&'r FlagValue, &'r Region)> {
    if region.is_global() {
        if rule.passthrough {
            let denied = region
                .flag(rule.flag)
                .and_then(|entry| entry.value())
                .is_some_and(|value| value.as_state() == Some(State::Deny));
            return if region.has_no_members() && !denied {
                Some((&ALLOW, region))
            } else {
                None
            };
        }
        if rule.membership_fallback {
            return region
                .flag(rule.flag)
                .and_then(|entry| entry.value())
                .filter(|value| rule.accepts(value) && value.as_state() != Some(State::Allow))
                .map(|value| (value, region));
        }
    }

    let mut cached: Option<Association> = None;
    for current in ancestors(lookup, region) {
        let Some(entry) = current.flag(rule.flag) else {
            continue;
        };
        let scope = actor.map(|actor| {
            *cached.get_or_insert_with(|| association(lookup, region, actor))
        });
        if let Some(value) = entry.effective(scope, rule.default_group) {
            if rule.accepts(value) {
                return Some((value, current));
            }
        }
    }
    None
}

/// Returns `true` if the region's effective `passthrough` is allow.
pub(crate) fn passes_through<L: RegionLookup + ?Sized>(
    lookup: &L,
    region: &Region,
    actor: Option<&ActorContext>,
) -> bool {
    let flag = FlagId::new(names::PASSTHROUGH);
    let rule = Rule {
        flag: &flag,
        kind: Some(FlagKind::State),
        combinator: Combinator::FirstMatch,
        default_group: None,
        membership_fallback: false,
        passthrough: true,
    };
    effective_value(lookup, region, &rule, actor)
        .is_some_and(|(value, _)| value.as_state() == Some(State::Allow))
}

/// Priority used for ordering cut-offs. Global regions sit below every
/// other region.
pub(crate) fn rank(region: &Region) -> i64 {
    if region.is_global() {
        i64::MIN
    } else {
        i64::from(region.priority())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lookup::NoParents;
    use hashbrown::HashMap;
    use nalgebra::Point3;
    use region_types::{Domain, FlagEntry, RegionId, Shape};
    use uuid::Uuid;

    fn region(id: &str) -> Region {
        Region::new(
            RegionId::new(id).unwrap(),
            Shape::cuboid(Point3::origin(), Point3::new(4.0, 4.0, 4.0)).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_parent_supplies_value() {
        let pvp = FlagId::new("pvp");
        let parent = region("a").with_flag(pvp.clone(), FlagEntry::new(State::Allow));
        let child = region("c").with_parent(parent.id().clone()).unwrap();
        let lookup: HashMap<_, _> = [(parent.id().clone(), parent.clone())].into_iter().collect();

        let rule = Rule::new(&pvp, None);
        let (value, source) = effective_value(&lookup, &child, &rule, None).unwrap();
        assert_eq!(value, &FlagValue::ALLOW);
        assert_eq!(source.id().as_str(), "a");

        assert!(effective_value(&NoParents, &child, &rule, None).is_none());
    }

    #[test]
    fn test_scoped_entry_falls_through_to_parent() {
        let alice = Uuid::from_u128(1);
        let flag = FlagId::new("use");
        let parent = region("town").with_flag(flag.clone(), FlagEntry::new(State::Deny));
        let child = region("shop")
            .with_parent(parent.id().clone())
            .unwrap()
            .with_members(Domain::new().with_player(alice))
            .with_flag(
                flag.clone(),
                FlagEntry::new(State::Allow).with_group(RegionGroup::Members),
            );
        let lookup: HashMap<_, _> = [(parent.id().clone(), parent.clone())].into_iter().collect();
        let rule = Rule::new(&flag, None);

        let member = ActorContext::player(alice);
        let stranger = ActorContext::player(Uuid::from_u128(2));
        assert_eq!(
            effective_value(&lookup, &child, &rule, Some(&member)).unwrap().0,
            &FlagValue::ALLOW
        );
        assert_eq!(
            effective_value(&lookup, &child, &rule, Some(&stranger)).unwrap().0,
            &FlagValue::DENY
        );
    }

    #[test]
    fn test_mistyped_value_ignored() {
        let definition = FlagDefinition::integer("heal-amount");
        let flag = definition.id().clone();
        let bad = region("r").with_flag(flag.clone(), FlagEntry::new("ten"));
        let rule = Rule::new(&flag, Some(&definition));
        assert!(effective_value(&NoParents, &bad, &rule, None).is_none());
    }

    #[test]
    fn test_global_passthrough() {
        let global = Region::global();
        assert!(passes_through(&NoParents, &global, None));

        let claimed = Region::global().with_members(Domain::new().with_group("staff"));
        assert!(!passes_through(&NoParents, &claimed, None));

        let closed = Region::global()
            .with_flag(FlagId::new(names::PASSTHROUGH), FlagEntry::new(State::Deny));
        assert!(!passes_through(&NoParents, &closed, None));

        assert!(!passes_through(&NoParents, &region("plain"), None));
    }

    #[test]
    fn test_global_build_allow_ignored() {
        let definition = FlagDefinition::state(names::BUILD)
            .with_default(State::Allow)
            .with_membership_fallback(true);
        let flag = definition.id().clone();
        let rule = Rule::new(&flag, Some(&definition));

        let allow = Region::global().with_flag(flag.clone(), FlagEntry::new(State::Allow));
        assert!(effective_value(&NoParents, &allow, &rule, None).is_none());

        let deny = Region::global().with_flag(flag.clone(), FlagEntry::new(State::Deny));
        assert_eq!(
            effective_value(&NoParents, &deny, &rule, None).unwrap().0,
            &FlagValue::DENY
        );
    }

    #[test]
    fn test_rank() {
        assert_eq!(rank(&region("r").with_priority(-3)), -3);
        assert!(rank(&Region::global().with_priority(i32::MAX)) < rank(&region("r").with_priority(i32::MIN)));
    }
}
