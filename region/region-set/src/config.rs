//! Per-world configuration.
//!
//! # Example
//!
//! ```
//! use region_set::WorldConfig;
//! use region_types::{FlagId, FlagValue};
//!
//! let config = WorldConfig::new()
//!     .with_priority_bounds(-100, 100)
//!     .with_flag_default(FlagId::new("mob-spawning"), FlagValue::DENY);
//! assert!(config.validate().is_empty());
//! assert!(!config.priority_allowed(101));
//! ```

use hashbrown::HashMap;
use region_types::{FlagId, FlagValue};
use ward_spatial::RTreeConfig;

/// Settings for one world's region set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldConfig {
    /// Spatial index node sizes.
    index: RTreeConfig,
    /// Defaults that replace the registry's for this world.
    flag_defaults: HashMap<FlagId, FlagValue>,
    /// Lowest allowed region priority.
    min_priority: i32,
    /// Highest allowed region priority.
    max_priority: i32,
    /// Run the full consistency check before publishing each mutation.
    verify_commits: bool,
    /// Persist after each successful mutation.
    persist_on_mutation: bool,
}

impl WorldConfig {
    /// Creates a configuration with default settings.
    ///
    /// Defaults:
    /// - `index`: [`RTreeConfig::default`]
    /// - `flag_defaults`: empty
    /// - priority bounds: the full `i32` range
    /// - `verify_commits`: true
    /// - `persist_on_mutation`: true
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: RTreeConfig::new(),
            flag_defaults: HashMap::new(),
            min_priority: i32::MIN,
            max_priority: i32::MAX,
            verify_commits: true,
            persist_on_mutation: true,
        }
    }

    /// Sets the spatial index configuration.
    #[must_use]
    pub const fn with_index(mut self, index: RTreeConfig) -> Self {
        self.index = index;
        self
    }

    /// Overrides the default of one flag in this world.
    #[must_use]
    pub fn with_flag_default(mut self, flag: FlagId, value: FlagValue) -> Self {
        self.flag_defaults.insert(flag, value);
        self
    }

    /// Sets the inclusive priority range.
    #[must_use]
    pub const fn with_priority_bounds(mut self, min: i32, max: i32) -> Self {
        self.min_priority = min;
        self.max_priority = max;
        self
    }

    /// Enables or disables verification before each publish.
    #[must_use]
    pub const fn with_verify_commits(mut self, enabled: bool) -> Self {
        self.verify_commits = enabled;
        self
    }

    /// Enables or disables persistence after each mutation.
    #[must_use]
    pub const fn with_persist_on_mutation(mut self, enabled: bool) -> Self {
        self.persist_on_mutation = enabled;
        self
    }

    /// Returns the spatial index configuration.
    #[must_use]
    pub const fn index(&self) -> &RTreeConfig {
        &self.index
    }

    /// Returns the per-world flag defaults.
    #[must_use]
    pub const fn flag_defaults(&self) -> &HashMap<FlagId, FlagValue> {
        &self.flag_defaults
    }

    /// Returns the lowest allowed priority.
    #[must_use]
    pub const fn min_priority(&self) -> i32 {
        self.min_priority
    }

    /// Returns the highest allowed priority.
    #[must_use]
    pub const fn max_priority(&self) -> i32 {
        self.max_priority
    }

    /// Returns `true` if `priority` is within bounds.
    #[must_use]
    pub const fn priority_allowed(&self, priority: i32) -> bool {
        priority >= self.min_priority && priority <= self.max_priority
    }

    /// Returns `true` if commits are verified.
    #[must_use]
    pub const fn verify_commits(&self) -> bool {
        self.verify_commits
    }

    /// Returns `true` if mutations are persisted.
    #[must_use]
    pub const fn persist_on_mutation(&self) -> bool {
        self.persist_on_mutation
    }

    /// Validates the configuration and returns any issues.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut issues: Vec<String> = self
            .index
            .validate()
            .into_iter()
            .map(|issue| format!("index: {issue}"))
            .collect();

        if self.min_priority > self.max_priority {
            issues.push(format!(
                "min_priority ({}) exceeds max_priority ({})",
                self.min_priority, self.max_priority
            ));
        }

        issues
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorldConfig::default();
        assert!(config.validate().is_empty());
        assert!(config.verify_commits());
        assert!(config.persist_on_mutation());
        assert!(config.priority_allowed(i32::MIN));
        assert!(config.priority_allowed(i32::MAX));
        assert!(config.flag_defaults().is_empty());
    }

    #[test]
    fn test_builder() {
        let config = WorldConfig::new()
            .with_index(RTreeConfig::new().with_max_children(8).with_min_children(3))
            .with_priority_bounds(0, 10)
            .with_verify_commits(false)
            .with_persist_on_mutation(false)
            .with_flag_default(FlagId::new("pvp"), FlagValue::DENY);

        assert_eq!(config.index().max_children(), 8);
        assert_eq!(config.min_priority(), 0);
        assert_eq!(config.max_priority(), 10);
        assert!(!config.priority_allowed(-1));
        assert!(!config.verify_commits());
        assert!(!config.persist_on_mutation());
        assert_eq!(config.flag_defaults().get(&FlagId::new("pvp")), Some(&FlagValue::DENY));
    }

    #[test]
    fn test_validate() {
        let config = WorldConfig::new()
            .with_priority_bounds(5, 1)
            .with_index(RTreeConfig::new().with_max_children(2));
        let issues = config.validate();
        assert!(issues.iter().any(|i| i.contains("min_priority")));
        assert!(issues.iter().any(|i| i.starts_with("index:")));
    }
}
