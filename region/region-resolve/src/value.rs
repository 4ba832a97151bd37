//! Resolution results.

use region_types::{FlagId, FlagValue, RegionId, State};

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueSource {
    /// Set on these regions, in precedence order. For first-match flags this
    /// is the single winning region; for combined flags, every region whose
    /// value equals the result.
    Regions(Vec<RegionId>),
    /// No region set the flag; the actor's membership of these regions
    /// decided it.
    Membership(Vec<RegionId>),
    /// The flag's default.
    Default,
    /// Nothing applied and the flag has no default.
    Unset,
}

/// The outcome of resolving one flag at one point.
///
/// # Example
///
/// ```
/// use region_resolve::{ResolvedValue, ValueSource};
/// use region_types::{FlagId, FlagValue};
///
/// let resolved = ResolvedValue::new(FlagId::new("pvp"), Some(FlagValue::DENY), ValueSource::Default);
/// assert!(!resolved.is_allowed());
/// assert!(resolved.contributors().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedValue {
    flag: FlagId,
    value: Option<FlagValue>,
    source: ValueSource,
}

impl ResolvedValue {
    /// Creates a result.
    #[must_use]
    pub const fn new(flag: FlagId, value: Option<FlagValue>, source: ValueSource) -> Self {
        Self {
            flag,
            value,
            source,
        }
    }

    /// A result with no value and no source.
    #[must_use]
    pub const fn unset(flag: FlagId) -> Self {
        Self::new(flag, None, ValueSource::Unset)
    }

    /// Returns the flag that was resolved.
    #[must_use]
    pub const fn flag(&self) -> &FlagId {
        &self.flag
    }

    /// Returns the value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&FlagValue> {
        self.value.as_ref()
    }

    /// Consumes the result, returning the value.
    #[must_use]
    pub fn into_value(self) -> Option<FlagValue> {
        self.value
    }

    /// Returns where the value came from.
    #[must_use]
    pub const fn source(&self) -> &ValueSource {
        &self.source
    }

    /// Returns the regions that supplied the value, or that decided it
    /// through membership.
    #[must_use]
    pub fn contributors(&self) -> &[RegionId] {
        match &self.source {
            ValueSource::Regions(ids) | ValueSource::Membership(ids) => ids,
            ValueSource::Default | ValueSource::Unset => &[],
        }
    }

    /// Returns the value as a state.
    #[must_use]
    pub fn as_state(&self) -> Option<State> {
        self.value.as_ref().and_then(FlagValue::as_state)
    }

    /// Returns the value as a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_ref().and_then(FlagValue::as_bool)
    }

    /// Returns the value as an integer.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        self.value.as_ref().and_then(FlagValue::as_integer)
    }

    /// Returns the value as a float. Integers convert.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        self.value.as_ref().and_then(FlagValue::as_float)
    }

    /// Returns the value as text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_ref().and_then(FlagValue::as_text)
    }

    /// Returns `true` only for an explicit allow (or a true boolean).
    ///
    /// An unset value is not an allow; callers wanting "allowed unless
    /// denied" should test `!is_denied()`.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        match &self.value {
            Some(FlagValue::State(state)) => state.is_allow(),
            Some(FlagValue::Bool(value)) => *value,
            _ => false,
        }
    }

    /// Returns `true` only for an explicit deny (or a false boolean).
    #[must_use]
    pub fn is_denied(&self) -> bool {
        match &self.value {
            Some(FlagValue::State(state)) => !state.is_allow(),
            Some(FlagValue::Bool(value)) => !*value,
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_and_deny() {
        let pvp = FlagId::new("pvp");
        let unset = ResolvedValue::unset(pvp.clone());
        assert!(!unset.is_allowed());
        assert!(!unset.is_denied());

        let yes = ResolvedValue::new(pvp.clone(), Some(FlagValue::Bool(true)), ValueSource::Default);
        assert!(yes.is_allowed());

        let no = ResolvedValue::new(pvp, Some(FlagValue::DENY), ValueSource::Default);
        assert!(no.is_denied());
        assert_eq!(no.as_state(), Some(State::Deny));
        assert_eq!(no.as_bool(), None);
    }

    #[test]
    fn test_contributors() {
        let id = RegionId::new("spawn").unwrap();
        let resolved = ResolvedValue::new(
            FlagId::new("heal-amount"),
            Some(FlagValue::Int(4)),
            ValueSource::Regions(vec![id.clone()]),
        );
        assert_eq!(resolved.contributors(), [id]);
        assert_eq!(resolved.as_integer(), Some(4));
        assert_eq!(resolved.as_float(), Some(4.0));
        assert_eq!(resolved.as_text(), None);
        assert_eq!(resolved.into_value(), Some(FlagValue::Int(4)));
    }
}
