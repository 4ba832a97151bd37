//! Configuration for the R-tree index.
//!
//! # Example
//!
//! ```
//! use ward_spatial::RTreeConfig;
//!
//! let config = RTreeConfig::default()
//!     .with_max_children(32)
//!     .with_min_children(12);
//! assert!(config.validate().is_empty());
//! ```

/// Node capacity settings for [`RTree`](crate::RTree).
///
/// Every node except the root holds between `min_children` and
/// `max_children` entries. Larger nodes make the tree shallower but each
/// visited node costs more box tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RTreeConfig {
    /// Maximum entries per node before it splits.
    max_children: usize,
    /// Minimum entries per non-root node before it is dissolved.
    min_children: usize,
}

impl RTreeConfig {
    /// Creates a configuration with default settings.
    ///
    /// Defaults:
    /// - `max_children`: 16
    /// - `min_children`: 6
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_children: 16,
            min_children: 6,
        }
    }

    /// Sets the maximum number of entries per node.
    #[must_use]
    pub const fn with_max_children(mut self, max: usize) -> Self {
        self.max_children = max;
        self
    }

    /// Sets the minimum number of entries per non-root node.
    #[must_use]
    pub const fn with_min_children(mut self, min: usize) -> Self {
        self.min_children = min;
        self
    }

    /// Returns the maximum number of entries per node.
    #[must_use]
    pub const fn max_children(&self) -> usize {
        self.max_children
    }

    /// Returns the minimum number of entries per non-root node.
    #[must_use]
    pub const fn min_children(&self) -> usize {
        self.min_children
    }

    /// Validates the configuration and returns any issues.
    ///
    /// A split must be able to hand both halves at least `min_children`
    /// entries, so `min_children` may not exceed half of `max_children`.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.max_children < 4 {
            issues.push(format!(
                "max_children must be at least 4, got {}",
                self.max_children
            ));
        }
        if self.min_children < 2 {
            issues.push(format!(
                "min_children must be at least 2, got {}",
                self.min_children
            ));
        }
        if self.min_children > self.max_children / 2 {
            issues.push(format!(
                "min_children ({}) must not exceed half of max_children ({})",
                self.min_children, self.max_children
            ));
        }

        issues
    }
}

impl Default for RTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RTreeConfig::default();
        assert_eq!(config.max_children(), 16);
        assert_eq!(config.min_children(), 6);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_builder() {
        let config = RTreeConfig::new().with_max_children(8).with_min_children(3);
        assert_eq!(config.max_children(), 8);
        assert_eq!(config.min_children(), 3);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_min_too_large() {
        let issues = RTreeConfig::new()
            .with_max_children(8)
            .with_min_children(5)
            .validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("half"));
    }

    #[test]
    fn test_validate_tiny_nodes() {
        let issues = RTreeConfig::new()
            .with_max_children(2)
            .with_min_children(1)
            .validate();
        assert_eq!(issues.len(), 2);
    }
}
