//! Resolving one flag across overlapping regions.

use hashbrown::HashMap;
use region_types::{
    ActorContext, Combinator, FlagId, FlagRegistry, FlagValue, Region, RegionId, State,
};
use smallvec::SmallVec;

use crate::combine::combine;
use crate::effective::{Rule, effective_value, passes_through, rank};
use crate::lookup::{RegionLookup, ancestors};
use crate::membership::{Membership, membership};
use crate::value::{ResolvedValue, ValueSource};

/// Resolves flags against a registry and optional per-world defaults.
///
/// The resolver holds no region state. Each call takes the candidate
/// regions (in precedence order: non-global before global, priority
/// descending, id ascending) and a [`RegionLookup`] for parent chains.
///
/// Resolution never fails. Unknown flags resolve as unscoped first-match
/// flags with no default.
///
/// # Example
///
/// ```
/// use hashbrown::HashMap;
/// use nalgebra::Point3;
/// use region_resolve::FlagResolver;
/// use region_types::{FlagEntry, FlagId, FlagRegistry, Region, RegionId, Shape, State};
///
/// let cube = |lo: f64, hi: f64| {
///     Shape::cuboid(Point3::new(lo, lo, lo), Point3::new(hi, hi, hi))
/// };
/// let pvp = FlagId::new("pvp");
/// let spawn = Region::new(RegionId::new("spawn")?, cube(0.0, 10.0)?)?
///     .with_flag(pvp.clone(), FlagEntry::new(State::Deny));
/// let arena = Region::new(RegionId::new("arena")?, cube(2.0, 8.0)?)?
///     .with_priority(10)
///     .with_flag(pvp.clone(), FlagEntry::new(State::Allow));
///
/// let registry = FlagRegistry::with_defaults();
/// let resolver = FlagResolver::new(&registry);
/// let lookup: HashMap<RegionId, Region> = HashMap::new();
///
/// let inner = resolver.resolve(&lookup, &[&arena, &spawn], &pvp, None);
/// assert!(inner.is_allowed());
/// let outer = resolver.resolve(&lookup, &[&spawn], &pvp, None);
/// assert!(outer.is_denied());
/// # Ok::<(), region_types::RegionError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FlagResolver<'a> {
    registry: &'a FlagRegistry,
    defaults: Option<&'a HashMap<FlagId, FlagValue>>,
}

impl<'a> FlagResolver<'a> {
    /// Creates a resolver over `registry`.
    #[must_use]
    pub const fn new(registry: &'a FlagRegistry) -> Self {
        Self {
            registry,
            defaults: None,
        }
    }

    /// Uses `defaults` in place of registry defaults for the flags it
    /// lists.
    #[must_use]
    pub const fn with_defaults(mut self, defaults: &'a HashMap<FlagId, FlagValue>) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &'a FlagRegistry {
        self.registry
    }

    /// Returns the value used when no region supplies `flag`.
    #[must_use]
    pub fn default_for(&self, flag: &FlagId) -> Option<&'a FlagValue> {
        self.defaults
            .and_then(|defaults| defaults.get(flag))
            .or_else(|| self.registry.get(flag).and_then(|d| d.default_value()))
    }

    /// Resolves `flag` for `actor` over `candidates`.
    ///
    /// With `actor` of `None` (an event with no player behind it) group
    /// scoping is ignored and membership never decides a value.
    ///
    /// First-match flags take the first value in precedence order, and once
    /// a region at some priority supplies a value no lower priority is
    /// consulted. Combined flags gather a value from every candidate.
    /// Either way, a child's value replaces any value its ancestors
    /// contributed as candidates.
    pub fn resolve<L: RegionLookup + ?Sized>(
        &self,
        lookup: &L,
        candidates: &[&Region],
        flag: &FlagId,
        actor: Option<&ActorContext>,
    ) -> ResolvedValue {
        debug_assert!(
            candidates
                .windows(2)
                .all(|pair| pair[0].cmp_precedence(pair[1]).is_le()),
            "candidates must be in precedence order"
        );

        let rule = Rule::new(flag, self.registry.get(flag));
        let considered = gather(lookup, candidates, &rule, actor);

        if !considered.is_empty() {
            let value = combine(rule.combinator, considered.iter().map(|(_, value)| *value));
            if let Some(value) = value {
                let contributors = match rule.combinator {
                    Combinator::FirstMatch => vec![considered[0].0.clone()],
                    _ => considered
                        .iter()
                        .filter(|(_, v)| **v == value)
                        .map(|(id, _)| (*id).clone())
                        .collect(),
                };
                return ResolvedValue::new(flag.clone(), Some(value), ValueSource::Regions(contributors));
            }
        }

        if rule.membership_fallback {
            if let Some(actor) = actor {
                let (outcome, counted) = membership(lookup, candidates, actor);
                match outcome {
                    Membership::Success => {
                        return ResolvedValue::new(
                            flag.clone(),
                            Some(FlagValue::State(State::Allow)),
                            ValueSource::Membership(counted),
                        );
                    }
                    Membership::Fail => {
                        return ResolvedValue::new(
                            flag.clone(),
                            Some(FlagValue::State(State::Deny)),
                            ValueSource::Membership(counted),
                        );
                    }
                    Membership::NoRegions => {}
                }
            }
        }

        match self.default_for(flag) {
            Some(value) => ResolvedValue::new(flag.clone(), Some(value.clone()), ValueSource::Default),
            None => ResolvedValue::unset(flag.clone()),
        }
    }

    /// Combines several state flags with deny-overrides.
    ///
    /// Each flag is resolved in turn; the first deny ends the test. Flags
    /// that resolve to nothing do not count, so `None` means none of them
    /// had a value.
    pub fn test_state<L: RegionLookup + ?Sized>(
        &self,
        lookup: &L,
        candidates: &[&Region],
        flags: &[FlagId],
        actor: Option<&ActorContext>,
    ) -> Option<State> {
        let mut result = None;
        for flag in flags {
            let state = self.resolve(lookup, candidates, flag, actor).as_state();
            result = State::combine([result, state]);
            if result == Some(State::Deny) {
                break;
            }
        }
        result
    }

    /// Tests `actor`'s membership of the candidates.
    pub fn membership<L: RegionLookup + ?Sized>(
        &self,
        lookup: &L,
        candidates: &[&Region],
        actor: &ActorContext,
    ) -> Membership {
        membership(lookup, candidates, actor).0
    }

    /// Returns the value a single region gives `actor` for `flag`, following
    /// its parent chain, and the id of the region in the chain that set it.
    pub fn effective_value<'r, L: RegionLookup + ?Sized>(
        &self,
        lookup: &'r L,
        region: &'r Region,
        flag: &FlagId,
        actor: Option<&ActorContext>,
    ) -> Option<(&'r FlagValue, &'r RegionId)> {
        let rule = Rule::new(flag, self.registry.get(flag));
        effective_value(lookup, region, &rule, actor).map(|(value, source)| (value, source.id()))
    }
}

/// Collects `(candidate id, value)` pairs in precedence order.
fn gather<'r, L: RegionLookup + ?Sized>(
    lookup: &'r L,
    candidates: &[&'r Region],
    rule: &Rule<'_>,
    actor: Option<&ActorContext>,
) -> Vec<(&'r RegionId, &'r FlagValue)> {
    let first_match = !rule.combinator.is_combining();
    let mut minimum: Option<i64> = None;
    let mut considered: Vec<(&RegionId, &FlagValue)> = Vec::new();
    let mut ignored: SmallVec<[&RegionId; 8]> = SmallVec::new();

    for &region in candidates {
        let priority = rank(region);
        if first_match && minimum.is_some_and(|minimum| priority < minimum) {
            break;
        }

        if let Some((value, _)) = effective_value(lookup, region, rule, actor) {
            if !ignored.contains(&region.id()) {
                minimum = Some(priority);
                for parent in ancestors(lookup, region).skip(1) {
                    if let Some(index) = considered.iter().position(|(id, _)| *id == parent.id()) {
                        considered.remove(index);
                    } else {
                        ignored.push(parent.id());
                    }
                }
                considered.push((region.id(), value));
            }
        }

        // A region that counts for membership also closes lower priorities
        // for membership-fallback flags, even without a value of its own.
        if first_match
            && rule.membership_fallback
            && minimum != Some(priority)
            && !passes_through(lookup, region, actor)
        {
            minimum = Some(priority);
        }
    }
    considered
}
