//! Error types for region operations.
//!
//! This module defines [`RegionError`], returned by every fallible region
//! operation, and [`ErrorKind`], which sorts errors into the four classes
//! callers act on.

use ward_spatial::SpatialError;

use crate::flag::{FlagId, FlagKind};
use crate::id::{RegionId, WorldId};

/// Result alias for region operations.
pub type RegionResult<T> = Result<T, RegionError>;

/// Broad classes of [`RegionError`].
///
/// Administrative callers usually only need to tell these apart: a
/// validation error is the caller's fault, a cycle is a specific validation
/// failure worth reporting separately, and an inconsistent state is a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input: bad id, degenerate shape, wrong flag type.
    Validation,
    /// The named region or world does not exist.
    NotFound,
    /// A parent assignment would create an inheritance cycle.
    Cycle,
    /// An internal invariant does not hold. The mutation was rejected.
    InconsistentState,
}

/// Errors that can occur during region operations.
///
/// # Example
///
/// ```
/// use region_types::{ErrorKind, RegionError, RegionId};
///
/// let error = RegionError::NotFound(RegionId::new("spawn")?);
/// assert!(error.is_not_found());
/// assert_eq!(error.kind(), ErrorKind::NotFound);
/// assert!(error.to_string().contains("spawn"));
/// # Ok::<(), RegionError>(())
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum RegionError {
    /// The region id is empty or contains characters outside
    /// `[A-Za-z0-9_,'-+/]`.
    #[error("invalid region id {id:?}: {reason}")]
    InvalidId {
        /// The rejected id.
        id: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The shape is degenerate: non-finite, inverted, too few vertices or
    /// zero area.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// A region with this id already exists.
    #[error("region {0} already exists")]
    DuplicateId(RegionId),

    /// The priority is outside the world's configured bounds.
    #[error("priority {priority} is outside the allowed range {min}..={max}")]
    InvalidPriority {
        /// The rejected priority.
        priority: i32,
        /// Lowest allowed priority.
        min: i32,
        /// Highest allowed priority.
        max: i32,
    },

    /// No region with this id exists.
    #[error("region {0} not found")]
    NotFound(RegionId),

    /// Making `parent` the parent of `region` would close a cycle.
    #[error("setting the parent of {region} to {parent} would create a cycle")]
    CircularInheritance {
        /// The region being re-parented.
        region: RegionId,
        /// The proposed parent.
        parent: RegionId,
    },

    /// The proposed parent does not exist.
    #[error("parent {parent} of region {region} does not exist")]
    UnknownParent {
        /// The region being re-parented.
        region: RegionId,
        /// The missing parent.
        parent: RegionId,
    },

    /// A flag value does not match the flag's declared kind.
    #[error("flag {flag} expects a {expected} value, got {found}")]
    FlagTypeMismatch {
        /// The flag.
        flag: FlagId,
        /// The kind the flag is declared with.
        expected: FlagKind,
        /// The kind of the supplied value.
        found: FlagKind,
    },

    /// The flag is not registered.
    #[error("flag {0} is not registered")]
    UnknownFlag(FlagId),

    /// A flag definition conflicts with the registry or with itself.
    #[error("flag {flag}: {reason}")]
    FlagConflict {
        /// The flag.
        flag: FlagId,
        /// What is wrong with the definition.
        reason: String,
    },

    /// An internal invariant was violated; the offending mutation was
    /// rejected.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),

    /// No regions are loaded for this world.
    #[error("world {0} is not loaded")]
    WorldNotLoaded(WorldId),

    /// An in-place update tried to change a field that needs its own
    /// operation.
    #[error("field {field} of region {region} cannot be changed in place")]
    ImmutableField {
        /// The region being updated.
        region: RegionId,
        /// The field that changed.
        field: &'static str,
    },

    /// The spatial index rejected the operation.
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

impl RegionError {
    /// Creates an invalid shape error with the given message.
    ///
    /// # Example
    ///
    /// ```
    /// use region_types::RegionError;
    ///
    /// let error = RegionError::invalid_shape("polygon needs at least 3 vertices");
    /// assert!(error.to_string().contains("3 vertices"));
    /// ```
    #[must_use]
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        Self::InvalidShape(message.into())
    }

    /// Creates an inconsistent state error with the given message.
    #[must_use]
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::InconsistentState(message.into())
    }

    /// Creates a flag conflict error.
    #[must_use]
    pub fn flag_conflict(flag: FlagId, reason: impl Into<String>) -> Self {
        Self::FlagConflict {
            flag,
            reason: reason.into(),
        }
    }

    /// Returns the broad class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId { .. }
            | Self::InvalidShape(_)
            | Self::DuplicateId(_)
            | Self::InvalidPriority { .. }
            | Self::FlagTypeMismatch { .. }
            | Self::UnknownFlag(_)
            | Self::FlagConflict { .. }
            | Self::ImmutableField { .. } => ErrorKind::Validation,
            Self::NotFound(_) | Self::UnknownParent { .. } | Self::WorldNotLoaded(_) => {
                ErrorKind::NotFound
            }
            Self::CircularInheritance { .. } => ErrorKind::Cycle,
            Self::InconsistentState(_) => ErrorKind::InconsistentState,
            Self::Spatial(error) => match error {
                SpatialError::KeyNotFound(_) => ErrorKind::NotFound,
                SpatialError::CorruptTree(_) => ErrorKind::InconsistentState,
                _ => ErrorKind::Validation,
            },
        }
    }

    /// Returns `true` if this error rejects malformed input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation)
    }

    /// Returns `true` if this error names a missing region or world.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound)
    }

    /// Returns `true` if this error is a rejected inheritance cycle.
    #[must_use]
    pub const fn is_cycle(&self) -> bool {
        matches!(self, Self::CircularInheritance { .. })
    }

    /// Returns `true` if this error reports a broken internal invariant.
    #[must_use]
    pub const fn is_inconsistent(&self) -> bool {
        matches!(self.kind(), ErrorKind::InconsistentState)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(s: &str) -> RegionId {
        RegionId::new(s).unwrap()
    }

    #[test]
    fn test_kinds() {
        assert_eq!(RegionError::invalid_shape("x").kind(), ErrorKind::Validation);
        assert_eq!(RegionError::DuplicateId(id("a")).kind(), ErrorKind::Validation);
        assert_eq!(RegionError::NotFound(id("a")).kind(), ErrorKind::NotFound);
        assert_eq!(
            RegionError::CircularInheritance {
                region: id("a"),
                parent: id("b"),
            }
            .kind(),
            ErrorKind::Cycle
        );
        assert_eq!(
            RegionError::inconsistent("index has 3 ids, table has 2").kind(),
            ErrorKind::InconsistentState
        );
        assert_eq!(
            RegionError::WorldNotLoaded(WorldId::new("nether")).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_spatial_conversion() {
        let error: RegionError = SpatialError::corrupt("leaf depth").into();
        assert!(error.is_inconsistent());
        assert!(error.to_string().contains("leaf depth"));

        let error: RegionError = SpatialError::KeyNotFound("a".into()).into();
        assert!(error.is_not_found());

        let error: RegionError = SpatialError::DuplicateKey("a".into()).into();
        assert!(error.is_validation());
    }

    #[test]
    fn test_predicates() {
        let cycle = RegionError::CircularInheritance {
            region: id("a"),
            parent: id("b"),
        };
        assert!(cycle.is_cycle());
        assert!(!cycle.is_validation());
        assert!(cycle.to_string().contains("cycle"));

        let priority = RegionError::InvalidPriority {
            priority: 500,
            min: -100,
            max: 100,
        };
        assert!(priority.is_validation());
        assert!(priority.to_string().contains("-100..=100"));
    }

    #[test]
    fn test_flag_errors_display() {
        let error = RegionError::FlagTypeMismatch {
            flag: FlagId::new("pvp"),
            expected: FlagKind::State,
            found: FlagKind::Integer,
        };
        let text = error.to_string();
        assert!(text.contains("pvp"));
        assert!(text.contains("state"));
        assert!(text.contains("integer"));

        let error = RegionError::flag_conflict(FlagId::new("heal-amount"), "already registered");
        assert!(error.to_string().contains("already registered"));
    }
}
