//! Per-world region sets: the entity table, its spatial index and the
//! operations that keep them in step.
//!
//! # Overview
//!
//! - **Snapshots** ([`RegionSnapshot`]): an immutable generation of a
//!   world's regions with point, box and shape queries
//! - **Region sets** ([`RegionSet`]): the shared, mutable handle; readers
//!   take snapshots, writers publish new ones
//! - **Worlds** ([`RegionManager`], [`WorldRegions`]): one context per
//!   world, wired to a [`RegionStore`] for loading and saving
//! - **Configuration** ([`WorldConfig`]): index node sizes, priority bounds,
//!   per-world flag defaults, commit verification and persistence
//!
//! # Concurrency
//!
//! A [`RegionSet`] keeps the current snapshot behind an `RwLock<Arc<_>>`.
//! Readers hold the read lock only long enough to clone the `Arc`. Writers
//! take a mutex, change a private copy, check it and swap it in, so a
//! multi-step change such as moving a region is seen by readers all at once
//! or not at all. The spatial index shares unchanged nodes between
//! generations, so copying a snapshot does not copy the tree.
//!
//! # Example
//!
//! ```
//! use nalgebra::Point3;
//! use region_set::{RegionSet, WorldConfig};
//! use region_types::{FlagEntry, FlagId, FlagRegistry, Region, RegionId, Shape, State};
//! use std::sync::Arc;
//!
//! let set = RegionSet::new(WorldConfig::default(), Arc::new(FlagRegistry::with_defaults()))?;
//! let pvp = FlagId::new("pvp");
//! let cube = |lo: f64, hi: f64| Shape::cuboid(Point3::new(lo, lo, lo), Point3::new(hi, hi, hi));
//!
//! set.add(
//!     Region::new(RegionId::new("spawn")?, cube(0.0, 10.0)?)?
//!         .with_flag(pvp.clone(), FlagEntry::new(State::Deny)),
//! )?;
//! set.add(
//!     Region::new(RegionId::new("arena")?, cube(2.0, 8.0)?)?
//!         .with_priority(10)
//!         .with_flag(pvp.clone(), FlagEntry::new(State::Allow)),
//! )?;
//!
//! assert!(set.resolve(&Point3::new(5.0, 5.0, 5.0), &pvp, None).is_allowed());
//! assert!(set.resolve(&Point3::new(1.0, 1.0, 1.0), &pvp, None).is_denied());
//! # Ok::<(), region_types::RegionError>(())
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: Enables serialization/deserialization for [`WorldConfig`] and
//!   [`RemovalStrategy`]

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod manager;
pub mod set;
pub mod snapshot;
pub mod store;

pub use config::WorldConfig;
pub use manager::{Applied, LoadError, RegionManager, WorldRegions};
pub use set::{RegionSet, RemovalStrategy};
pub use snapshot::RegionSnapshot;
pub use store::{MemoryStore, RegionStore, StoreError};
