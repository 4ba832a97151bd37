//! Error types for spatial operations.

use crate::Aabb;

/// Errors that can occur during spatial index operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SpatialError {
    /// A bounding box has a non-finite coordinate or an inverted axis.
    #[error("invalid bounding box {aabb:?}: {reason}")]
    InvalidBox {
        /// The rejected box.
        aabb: Aabb,
        /// Why the box was rejected.
        reason: &'static str,
    },

    /// The key is already present in the index.
    #[error("key {0} is already indexed")]
    DuplicateKey(String),

    /// The key is not present in the index.
    #[error("key {0} is not indexed")]
    KeyNotFound(String),

    /// The index configuration is invalid.
    #[error("invalid index configuration: {0}")]
    InvalidConfig(String),

    /// A structural invariant of the tree does not hold.
    #[error("corrupt tree: {0}")]
    CorruptTree(String),
}

impl SpatialError {
    /// Creates a corrupt tree error with the given message.
    #[must_use]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptTree(message.into())
    }

    /// Returns `true` if this is a "key not found" error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }

    /// Returns `true` if this error rejects malformed input rather than
    /// reporting index state.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidBox { .. } | Self::DuplicateKey(_) | Self::InvalidConfig(_)
        )
    }
}
