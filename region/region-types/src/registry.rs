//! Flag definitions and the registry that holds them.
//!
//! A [`FlagDefinition`] declares what a flag means: its value kind, its
//! default when no region sets it, how overlapping regions combine, and
//! which group a bare value applies to. [`FlagRegistry::with_defaults`]
//! provides the built-in catalog.
//!
//! # Example
//!
//! ```
//! use region_types::{Combinator, FlagDefinition, FlagId, FlagKind, FlagRegistry, FlagValue};
//!
//! let mut registry = FlagRegistry::with_defaults();
//! registry.register(
//!     FlagDefinition::integer("max-claims")
//!         .with_default(FlagValue::Int(3))
//!         .with_combinator(Combinator::Max),
//! )?;
//!
//! let pvp = registry.get(&FlagId::new("pvp")).expect("built in");
//! assert_eq!(pvp.kind(), FlagKind::State);
//! assert!(registry.check_value(&FlagId::new("max-claims"), &FlagValue::Bool(true)).is_err());
//! # Ok::<(), region_types::RegionError>(())
//! ```

use hashbrown::HashMap;

use crate::error::{RegionError, RegionResult};
use crate::flag::{Combinator, FlagEntry, FlagId, FlagKind, FlagValue, RegionGroup, State};

/// Names of the built-in flags.
pub mod names {
    /// Building and breaking. Falls back to region membership when unset.
    pub const BUILD: &str = "build";
    /// Regions with `passthrough = allow` do not count for membership.
    pub const PASSTHROUGH: &str = "passthrough";
    /// Player versus player combat.
    pub const PVP: &str = "pvp";
    /// Breaking blocks.
    pub const BLOCK_BREAK: &str = "block-break";
    /// Placing blocks.
    pub const BLOCK_PLACE: &str = "block-place";
    /// Using doors, buttons, levers.
    pub const USE: &str = "use";
    /// Natural mob spawning.
    pub const MOB_SPAWNING: &str = "mob-spawning";
    /// Walking into the region.
    pub const ENTRY: &str = "entry";
    /// Walking out of the region.
    pub const EXIT: &str = "exit";
    /// TNT explosions.
    pub const TNT: &str = "tnt";
    /// Creeper explosions.
    pub const CREEPER_EXPLOSION: &str = "creeper-explosion";
    /// Fire spreading between blocks.
    pub const FIRE_SPREAD: &str = "fire-spread";
    /// Lava setting blocks on fire.
    pub const LAVA_FIRE: &str = "lava-fire";
    /// Lightning strikes.
    pub const LIGHTNING: &str = "lightning";
    /// Players take no damage.
    pub const INVINCIBLE: &str = "invincible";
    /// Message shown on entry.
    pub const GREETING: &str = "greeting";
    /// Message shown on exit.
    pub const FAREWELL: &str = "farewell";
    /// Health restored per heal tick.
    pub const HEAL_AMOUNT: &str = "heal-amount";
    /// Seconds between heal ticks.
    pub const HEAL_DELAY: &str = "heal-delay";
    /// Sending chat messages.
    pub const SEND_CHAT: &str = "send-chat";
    /// Notify members when someone enters.
    pub const NOTIFY_ENTER: &str = "notify-enter";
    /// Walk speed multiplier.
    pub const WALK_SPEED: &str = "walk-speed";
}

/// Declaration of a flag.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlagDefinition {
    id: FlagId,
    kind: FlagKind,
    default: Option<FlagValue>,
    combinator: Combinator,
    default_group: Option<RegionGroup>,
    membership_fallback: bool,
}

impl FlagDefinition {
    /// Creates a definition with no default, first-match combination and
    /// no group scoping.
    #[must_use]
    pub fn new(id: impl Into<FlagId>, kind: FlagKind) -> Self {
        Self {
            id: id.into(),
            kind,
            default: None,
            combinator: Combinator::FirstMatch,
            default_group: None,
            membership_fallback: false,
        }
    }

    /// An allow/deny flag.
    #[must_use]
    pub fn state(id: impl Into<FlagId>) -> Self {
        Self::new(id, FlagKind::State)
    }

    /// A boolean flag.
    #[must_use]
    pub fn boolean(id: impl Into<FlagId>) -> Self {
        Self::new(id, FlagKind::Boolean)
    }

    /// An integer flag.
    #[must_use]
    pub fn integer(id: impl Into<FlagId>) -> Self {
        Self::new(id, FlagKind::Integer)
    }

    /// A float flag.
    #[must_use]
    pub fn float(id: impl Into<FlagId>) -> Self {
        Self::new(id, FlagKind::Float)
    }

    /// A text flag.
    #[must_use]
    pub fn text(id: impl Into<FlagId>) -> Self {
        Self::new(id, FlagKind::Text)
    }

    /// Sets the value used when no region supplies one.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<FlagValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets how overlapping regions combine.
    #[must_use]
    pub const fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    /// Sets the group a bare region value applies to.
    #[must_use]
    pub const fn with_default_group(mut self, group: RegionGroup) -> Self {
        self.default_group = Some(group);
        self
    }

    /// Makes an unset flag fall back to the actor's region membership.
    #[must_use]
    pub const fn with_membership_fallback(mut self, enabled: bool) -> Self {
        self.membership_fallback = enabled;
        self
    }

    /// Returns the flag id.
    #[must_use]
    pub const fn id(&self) -> &FlagId {
        &self.id
    }

    /// Returns the value kind.
    #[must_use]
    pub const fn kind(&self) -> FlagKind {
        self.kind
    }

    /// Returns the default value.
    #[must_use]
    pub const fn default_value(&self) -> Option<&FlagValue> {
        self.default.as_ref()
    }

    /// Returns the combinator.
    #[must_use]
    pub const fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// Returns the default group scope.
    #[must_use]
    pub const fn default_group(&self) -> Option<RegionGroup> {
        self.default_group
    }

    /// Returns `true` if membership decides when no region sets the flag.
    #[must_use]
    pub const fn membership_fallback(&self) -> bool {
        self.membership_fallback
    }

    /// Checks the definition for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::FlagConflict`] if the combinator does not suit
    /// the kind or membership fallback is set on a non-state flag, and
    /// [`RegionError::FlagTypeMismatch`] if the default has the wrong kind.
    pub fn validate(&self) -> RegionResult<()> {
        if !self.combinator.suits(self.kind) {
            return Err(RegionError::flag_conflict(
                self.id.clone(),
                format!(
                    "combinator {:?} cannot combine {} values",
                    self.combinator, self.kind
                ),
            ));
        }
        if self.membership_fallback && self.kind != FlagKind::State {
            return Err(RegionError::flag_conflict(
                self.id.clone(),
                "membership fallback needs a state flag",
            ));
        }
        if let Some(default) = &self.default {
            self.check_value(default)?;
        }
        Ok(())
    }

    /// Checks that `value` has this flag's kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::FlagTypeMismatch`] on a kind mismatch.
    pub fn check_value(&self, value: &FlagValue) -> RegionResult<()> {
        if value.kind() == self.kind {
            Ok(())
        } else {
            Err(RegionError::FlagTypeMismatch {
                flag: self.id.clone(),
                expected: self.kind,
                found: value.kind(),
            })
        }
    }
}

/// The set of known flags.
#[derive(Debug, Clone, Default)]
pub struct FlagRegistry {
    definitions: HashMap<FlagId, FlagDefinition>,
}

impl FlagRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in flags.
    ///
    /// Explosion and fire flags combine with deny-overrides, so one region
    /// forbidding them is enough. `heal-amount` takes the largest value and
    /// `heal-delay` the smallest. Everything else is first match.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for definition in builtin_flags() {
            registry
                .definitions
                .insert(definition.id.clone(), definition);
        }
        registry
    }

    /// Adds a definition.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::FlagConflict`] if the id is taken or the
    /// definition is inconsistent.
    pub fn register(&mut self, definition: FlagDefinition) -> RegionResult<()> {
        definition.validate()?;
        if self.definitions.contains_key(&definition.id) {
            return Err(RegionError::flag_conflict(
                definition.id,
                "already registered",
            ));
        }
        self.definitions.insert(definition.id.clone(), definition);
        Ok(())
    }

    /// Returns the definition for `flag`.
    #[must_use]
    pub fn get(&self, flag: &FlagId) -> Option<&FlagDefinition> {
        self.definitions.get(flag)
    }

    /// Returns the definition for `flag`, or an error naming it.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::UnknownFlag`] if `flag` is not registered.
    pub fn definition(&self, flag: &FlagId) -> RegionResult<&FlagDefinition> {
        self.get(flag)
            .ok_or_else(|| RegionError::UnknownFlag(flag.clone()))
    }

    /// Returns `true` if `flag` is registered.
    #[must_use]
    pub fn contains(&self, flag: &FlagId) -> bool {
        self.definitions.contains_key(flag)
    }

    /// Type-checks a value for `flag`. Unregistered flags accept anything.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::FlagTypeMismatch`] on a kind mismatch.
    pub fn check_value(&self, flag: &FlagId, value: &FlagValue) -> RegionResult<()> {
        match self.get(flag) {
            Some(definition) => definition.check_value(value),
            None => Ok(()),
        }
    }

    /// Type-checks every value in an entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::FlagTypeMismatch`] for the first bad value.
    pub fn check_entry(&self, flag: &FlagId, entry: &FlagEntry) -> RegionResult<()> {
        entry
            .values()
            .try_for_each(|value| self.check_value(flag, value))
    }

    /// Iterates over every definition in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &FlagDefinition> {
        self.definitions.values()
    }

    /// Number of registered flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn builtin_flags() -> Vec<FlagDefinition> {
    use names::*;

    vec![
        FlagDefinition::state(BUILD)
            .with_default(State::Allow)
            .with_membership_fallback(true),
        FlagDefinition::state(PASSTHROUGH),
        FlagDefinition::state(PVP),
        FlagDefinition::state(BLOCK_BREAK),
        FlagDefinition::state(BLOCK_PLACE),
        FlagDefinition::state(USE),
        FlagDefinition::state(MOB_SPAWNING).with_default(State::Allow),
        FlagDefinition::state(ENTRY)
            .with_default(State::Allow)
            .with_default_group(RegionGroup::NonMembers),
        FlagDefinition::state(EXIT)
            .with_default(State::Allow)
            .with_default_group(RegionGroup::NonMembers),
        FlagDefinition::state(TNT).with_combinator(Combinator::DenyOverrides),
        FlagDefinition::state(CREEPER_EXPLOSION)
            .with_default(State::Allow)
            .with_combinator(Combinator::DenyOverrides),
        FlagDefinition::state(FIRE_SPREAD)
            .with_default(State::Allow)
            .with_combinator(Combinator::DenyOverrides),
        FlagDefinition::state(LAVA_FIRE)
            .with_default(State::Allow)
            .with_combinator(Combinator::DenyOverrides),
        FlagDefinition::state(LIGHTNING)
            .with_default(State::Allow)
            .with_combinator(Combinator::DenyOverrides),
        FlagDefinition::state(INVINCIBLE),
        FlagDefinition::text(GREETING),
        FlagDefinition::text(FAREWELL),
        FlagDefinition::integer(HEAL_AMOUNT).with_combinator(Combinator::Max),
        FlagDefinition::integer(HEAL_DELAY).with_combinator(Combinator::Min),
        FlagDefinition::state(SEND_CHAT).with_default(State::Allow),
        FlagDefinition::boolean(NOTIFY_ENTER),
        FlagDefinition::float(WALK_SPEED),
    ]
}
