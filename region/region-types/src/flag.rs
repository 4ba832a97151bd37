//! Flag identifiers, values, and per-region flag entries.
//!
//! A flag is a named protection setting. Each region may carry a
//! [`FlagEntry`] per flag: an optional base value, an optional group scope
//! for that value, and values overridden for specific [`RegionGroup`]s.
//!
//! # Example
//!
//! ```
//! use region_types::{Association, FlagEntry, FlagValue, RegionGroup, State};
//!
//! // Deny building to everyone except members.
//! let entry = FlagEntry::new(FlagValue::State(State::Deny))
//!     .with_override(RegionGroup::Members, FlagValue::State(State::Allow));
//!
//! assert_eq!(
//!     entry.effective(Some(Association::Member), None),
//!     Some(&FlagValue::State(State::Allow))
//! );
//! assert_eq!(
//!     entry.effective(Some(Association::NonMember), None),
//!     Some(&FlagValue::State(State::Deny))
//! );
//! ```

use std::collections::BTreeMap;
use std::fmt;

use hashbrown::HashMap;

use crate::domain::Association;

/// Name of a flag, such as `pvp` or `build`. Stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "String", into = "String")
)]
pub struct FlagId(String);

impl FlagId {
    /// Creates a flag id, lower-casing the name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_lowercase())
    }

    /// Returns the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FlagId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FlagId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<FlagId> for String {
    fn from(id: FlagId) -> Self {
        id.0
    }
}

/// Allow/deny value of permission-style flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum State {
    /// Permit the action.
    Allow,
    /// Forbid the action.
    Deny,
}

impl State {
    /// Combines states so that deny overrides allow, and allow overrides
    /// nothing.
    ///
    /// # Example
    ///
    /// ```
    /// use region_types::State;
    ///
    /// assert_eq!(State::combine([Some(State::Allow), None]), Some(State::Allow));
    /// assert_eq!(State::combine([Some(State::Allow), Some(State::Deny)]), Some(State::Deny));
    /// assert_eq!(State::combine([None, None]), None);
    /// ```
    #[must_use]
    pub fn combine(states: impl IntoIterator<Item = Option<Self>>) -> Option<Self> {
        let mut result = None;
        for state in states.into_iter().flatten() {
            match state {
                Self::Deny => return Some(Self::Deny),
                Self::Allow => result = Some(Self::Allow),
            }
        }
        result
    }

    /// Returns `true` for [`State::Allow`].
    #[must_use]
    pub const fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        })
    }
}

/// The type of value a flag holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlagKind {
    /// [`FlagValue::State`].
    State,
    /// [`FlagValue::Bool`].
    Boolean,
    /// [`FlagValue::Int`].
    Integer,
    /// [`FlagValue::Float`].
    Float,
    /// [`FlagValue::Text`].
    Text,
}

impl FlagKind {
    /// Returns `true` for integer and float flags.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::State => "state",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
        })
    }
}

/// A typed flag value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlagValue {
    /// Allow or deny.
    State(State),
    /// A plain boolean.
    Bool(bool),
    /// An integer, such as a heal amount.
    Int(i64),
    /// A float, such as a speed multiplier.
    Float(f64),
    /// Free text, such as a greeting.
    Text(String),
}

impl FlagValue {
    /// Shorthand for `FlagValue::State(State::Allow)`.
    pub const ALLOW: Self = Self::State(State::Allow);
    /// Shorthand for `FlagValue::State(State::Deny)`.
    pub const DENY: Self = Self::State(State::Deny);

    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> FlagKind {
        match self {
            Self::State(_) => FlagKind::State,
            Self::Bool(_) => FlagKind::Boolean,
            Self::Int(_) => FlagKind::Integer,
            Self::Float(_) => FlagKind::Float,
            Self::Text(_) => FlagKind::Text,
        }
    }

    /// Returns the state, if this is a state value.
    #[must_use]
    pub const fn as_state(&self) -> Option<State> {
        match self {
            Self::State(state) => Some(*state),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer, if this is an integer value.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the number as a float, for integer and float values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Returns the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State(state) => write!(f, "{state}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<State> for FlagValue {
    fn from(state: State) -> Self {
        Self::State(state)
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FlagValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// How the values of several overlapping regions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Combinator {
    /// The highest-precedence region that defines the flag wins.
    #[default]
    FirstMatch,
    /// State flags: any deny wins, otherwise allow.
    DenyOverrides,
    /// Boolean flags: true only if every contributing region says true.
    And,
    /// Boolean flags: true if any contributing region says true.
    Or,
    /// Numeric flags: the smallest contributed value.
    Min,
    /// Numeric flags: the largest contributed value.
    Max,
}

impl Combinator {
    /// Returns `true` if this combinator can combine values of `kind`.
    #[must_use]
    pub const fn suits(self, kind: FlagKind) -> bool {
        match self {
            Self::FirstMatch => true,
            Self::DenyOverrides => matches!(kind, FlagKind::State),
            Self::And | Self::Or => matches!(kind, FlagKind::Boolean),
            Self::Min | Self::Max => kind.is_numeric(),
        }
    }

    /// Returns `true` if every contributing region's value is gathered,
    /// rather than only the first.
    #[must_use]
    pub const fn is_combining(self) -> bool {
        !matches!(self, Self::FirstMatch)
    }
}

/// Groups a flag value can be scoped to.
///
/// Variants are declared in override precedence order: when an actor falls
/// into several groups that carry an override, the earliest wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegionGroup {
    /// Owners only.
    Owners,
    /// Owners and members.
    Members,
    /// Everyone who is not an owner.
    NonOwners,
    /// Everyone who is neither owner nor member.
    NonMembers,
    /// Everyone.
    All,
    /// No one.
    Nobody,
}

impl RegionGroup {
    /// Returns `true` if an actor with this association belongs to the
    /// group.
    #[must_use]
    pub const fn contains(self, association: Association) -> bool {
        match self {
            Self::All => true,
            Self::Owners => matches!(association, Association::Owner),
            Self::Members => matches!(association, Association::Owner | Association::Member),
            Self::NonOwners => !matches!(association, Association::Owner),
            Self::NonMembers => matches!(association, Association::NonMember),
            Self::Nobody => false,
        }
    }
}

impl fmt::Display for RegionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Owners => "owners",
            Self::Members => "members",
            Self::NonOwners => "nonowners",
            Self::NonMembers => "nonmembers",
            Self::All => "all",
            Self::Nobody => "none",
        })
    }
}

/// One flag as set on one region.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlagEntry {
    value: Option<FlagValue>,
    group: Option<RegionGroup>,
    overrides: BTreeMap<RegionGroup, FlagValue>,
}

impl FlagEntry {
    /// Creates an entry with a base value and no scoping.
    #[must_use]
    pub fn new(value: impl Into<FlagValue>) -> Self {
        Self {
            value: Some(value.into()),
            group: None,
            overrides: BTreeMap::new(),
        }
    }

    /// Creates an entry with no base value, to carry only overrides.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Restricts the base value to actors in `group`.
    #[must_use]
    pub const fn with_group(mut self, group: RegionGroup) -> Self {
        self.group = Some(group);
        self
    }

    /// Sets the value seen by actors in `group`.
    #[must_use]
    pub fn with_override(mut self, group: RegionGroup, value: impl Into<FlagValue>) -> Self {
        self.overrides.insert(group, value.into());
        self
    }

    /// Returns the base value.
    #[must_use]
    pub const fn value(&self) -> Option<&FlagValue> {
        self.value.as_ref()
    }

    /// Returns the scope of the base value, if set on the entry.
    #[must_use]
    pub const fn group(&self) -> Option<RegionGroup> {
        self.group
    }

    /// Returns the per-group overrides in precedence order.
    pub fn overrides(&self) -> impl Iterator<Item = (RegionGroup, &FlagValue)> {
        self.overrides.iter().map(|(g, v)| (*g, v))
    }

    /// Returns `true` if the entry holds no value at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.overrides.is_empty()
    }

    /// Iterates over every value held by the entry.
    pub fn values(&self) -> impl Iterator<Item = &FlagValue> {
        self.value.iter().chain(self.overrides.values())
    }

    /// Returns the value this entry gives an actor.
    ///
    /// With `association` of `None` (no actor, such as fire spreading),
    /// group scoping does not apply and the base value is returned as is.
    /// Otherwise the first override whose group contains the association
    /// wins, then the base value if its scope (the entry's group, else
    /// `default_group`, else everyone) contains the association.
    #[must_use]
    pub fn effective(
        &self,
        association: Option<Association>,
        default_group: Option<RegionGroup>,
    ) -> Option<&FlagValue> {
        let Some(association) = association else {
            return self.value.as_ref();
        };

        if let Some((_, value)) = self
            .overrides
            .iter()
            .find(|(group, _)| group.contains(association))
        {
            return Some(value);
        }

        let scope = self.group.or(default_group).unwrap_or(RegionGroup::All);
        if scope.contains(association) {
            self.value.as_ref()
        } else {
            None
        }
    }
}

impl From<FlagValue> for FlagEntry {
    fn from(value: FlagValue) -> Self {
        Self::new(value)
    }
}

/// The flags set on one region.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlagMap {
    entries: HashMap<FlagId, FlagEntry>,
}

impl FlagMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `flag`.
    #[must_use]
    pub fn get(&self, flag: &FlagId) -> Option<&FlagEntry> {
        self.entries.get(flag)
    }

    /// Sets the entry for `flag`, returning the previous one.
    ///
    /// Setting an empty entry removes the flag.
    pub fn set(&mut self, flag: FlagId, entry: FlagEntry) -> Option<FlagEntry> {
        if entry.is_empty() {
            self.entries.remove(&flag)
        } else {
            self.entries.insert(flag, entry)
        }
    }

    /// Removes the entry for `flag`.
    pub fn remove(&mut self, flag: &FlagId) -> Option<FlagEntry> {
        self.entries.remove(flag)
    }

    /// Returns `true` if `flag` is set.
    #[must_use]
    pub fn contains(&self, flag: &FlagId) -> bool {
        self.entries.contains_key(flag)
    }

    /// Iterates over the entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&FlagId, &FlagEntry)> {
        self.entries.iter()
    }

    /// Returns the entries sorted by flag id.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&FlagId, &FlagEntry)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Number of flags set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no flags are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(FlagId, FlagEntry)> for FlagMap {
    fn from_iter<I: IntoIterator<Item = (FlagId, FlagEntry)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (flag, entry) in iter {
            map.set(flag, entry);
        }
        map
    }
}
