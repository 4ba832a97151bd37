//! Region and world identifiers.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::error::{RegionError, RegionResult};

/// Unique identifier of a region within a world.
///
/// Ids are non-empty, use only `A-Z a-z 0-9 _ , ' - + /`, and are stored
/// lower-cased, so `Spawn` and `spawn` name the same region.
///
/// # Example
///
/// ```
/// use region_types::RegionId;
///
/// let id = RegionId::new("Market_Square")?;
/// assert_eq!(id.as_str(), "market_square");
/// assert!(RegionId::new("no spaces").is_err());
/// assert!(RegionId::global().is_global());
/// # Ok::<(), region_types::RegionError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct RegionId(String);

impl RegionId {
    /// The conventional id of a world's global region.
    pub const GLOBAL: &'static str = "__global__";

    /// Validates and normalises an id.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidId`] if the id is empty or contains a
    /// character outside the allowed set.
    pub fn new(id: impl AsRef<str>) -> RegionResult<Self> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(RegionError::InvalidId {
                id: id.to_string(),
                reason: "id is empty",
            });
        }
        if !id.chars().all(Self::is_valid_char) {
            return Err(RegionError::InvalidId {
                id: id.to_string(),
                reason: "allowed characters are A-Z a-z 0-9 _ , ' - + /",
            });
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Returns the id of the global region.
    #[must_use]
    pub fn global() -> Self {
        Self(Self::GLOBAL.to_string())
    }

    /// Returns `true` if `c` may appear in an id.
    #[must_use]
    pub const fn is_valid_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '_' | ',' | '\'' | '-' | '+' | '/')
    }

    /// Returns `true` if `id` would be accepted by [`RegionId::new`].
    #[must_use]
    pub fn is_valid(id: &str) -> bool {
        !id.is_empty() && id.chars().all(Self::is_valid_char)
    }

    /// Returns `true` if this is the conventional global region id.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0 == Self::GLOBAL
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RegionId {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RegionId {
    type Error = RegionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RegionId {
    type Error = RegionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegionId> for String {
    fn from(id: RegionId) -> Self {
        id.0
    }
}

impl AsRef<str> for RegionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RegionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier of a world (a dimension or map with its own region set).
///
/// World ids are opaque names; they are compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldId(String);

impl WorldId {
    /// Creates a world id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorldId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for WorldId {
    fn from(name: String) -> Self {
        Self(name)
    }
}
