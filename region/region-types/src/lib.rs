//! Core types for protected regions: shapes, flags, owners and errors.
//!
//! This crate provides the foundational types for the region domain. It
//! holds data and per-region rules only; resolving a flag across
//! overlapping regions lives in `region-resolve`, and the per-world region
//! table lives in `region-set`.
//!
//! # Overview
//!
//! - **Identifiers**: [`RegionId`] (validated, lower-cased) and [`WorldId`]
//! - **Shapes**: [`Shape`] is a cuboid, an extruded [`Polygon`], or the
//!   whole world
//! - **Regions**: [`Region`] with priority, flags, owners, members and an
//!   optional parent; [`RegionDefinition`] is its plain-data form and
//!   [`RegionSummary`] its diagnostic view
//! - **Flags**: [`FlagId`], typed [`FlagValue`]s, per-region [`FlagEntry`]s
//!   with [`RegionGroup`] overrides, and a [`FlagRegistry`] of
//!   [`FlagDefinition`]s
//! - **Actors**: [`Domain`] lists players and groups, [`ActorContext`] says
//!   who is asking, [`Association`] is how they relate to a region
//! - **Errors**: [`RegionError`], grouped by [`ErrorKind`]
//!
//! # Example
//!
//! ```
//! use nalgebra::Point3;
//! use region_types::{
//!     ActorContext, Association, Domain, FlagEntry, FlagId, FlagValue, Region, RegionGroup,
//!     RegionId, Shape, State,
//! };
//! use uuid::Uuid;
//!
//! let owner = Uuid::from_u128(1);
//! let home = Region::new(
//!     RegionId::new("home")?,
//!     Shape::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(15.0, 255.0, 15.0))?,
//! )?
//! .with_owners(Domain::new().with_player(owner))
//! .with_flag(
//!     FlagId::new("use"),
//!     FlagEntry::new(State::Deny).with_override(RegionGroup::Owners, State::Allow),
//! );
//!
//! let association = home.association_direct(&ActorContext::player(owner));
//! assert_eq!(association, Association::Owner);
//!
//! let entry = home.flag(&FlagId::new("use")).expect("set above");
//! assert_eq!(entry.effective(Some(association), None), Some(&FlagValue::ALLOW));
//! # Ok::<(), region_types::RegionError>(())
//! ```
//!
//! # Integration with ward-spatial
//!
//! Bounding boxes are [`ward_spatial::Aabb`]; [`Shape::bounding_box`] yields
//! the box the index stores, and index errors convert into
//! [`RegionError::Spatial`].
//!
//! # Feature Flags
//!
//! - `serde`: Enables serialization/deserialization for all types

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod domain;
pub mod error;
pub mod flag;
pub mod id;
pub mod region;
pub mod registry;
pub mod shape;

// Re-export main types at crate root for convenience
pub use domain::{ActorContext, Association, Domain};
pub use error::{ErrorKind, RegionError, RegionResult};
pub use flag::{Combinator, FlagEntry, FlagId, FlagKind, FlagMap, FlagValue, RegionGroup, State};
pub use id::{RegionId, WorldId};
pub use region::{Region, RegionDefinition, RegionSummary};
pub use registry::{FlagDefinition, FlagRegistry, names};
pub use shape::{Polygon, Shape, ShapeKind};

pub use ward_spatial::Aabb;
