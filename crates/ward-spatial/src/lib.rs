//! Spatial indexing for Ward.
//!
//! This crate provides the bounding-volume index that region lookups are
//! built on:
//!
//! - [`Aabb`] - Closed axis-aligned box in world coordinates
//! - [`RTree`] - Dynamic R-tree from keys to boxes, with STR bulk loading
//! - [`RTreeConfig`] - Node capacity settings
//!
//! # Layer 0 Crate
//!
//! This crate knows nothing about regions, flags or players. Keys are any
//! cloneable, hashable type, so the same index can serve other lookups.
//!
//! # Coordinate Systems
//!
//! Coordinates are continuous `f64` values in a right-handed system with
//! **Y up**, matching block-world conventions:
//! - X: east/west
//! - Y: height
//! - Z: north/south
//!
//! Integer block coordinates convert losslessly. A box covering the blocks
//! `0..=9` on an axis spans `0.0..=9.0`; boxes are closed, so both end
//! blocks are inside.
//!
//! # Example
//!
//! ```
//! use ward_spatial::{Aabb, RTree, RTreeConfig};
//! use nalgebra::Point3;
//!
//! let mut plots = Vec::new();
//! for i in 0..100 {
//!     let x = f64::from(i) * 16.0;
//!     plots.push((i, Aabb::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 15.0, 255.0, 15.0))?));
//! }
//!
//! let index = RTree::bulk_load(plots, RTreeConfig::default())?;
//! assert_eq!(index.query_point(&Point3::new(40.0, 64.0, 3.0)), vec![2]);
//! # Ok::<(), ward_spatial::SpatialError>(())
//! ```
//!
//! # Snapshots
//!
//! Cloning an [`RTree`] shares every node with the original. Mutating the
//! clone copies only the nodes along the modified paths, so a writer can
//! prepare a new version while readers keep querying the old one.
//!
//! # Quality Standards
//!
//! This crate maintains A-grade standards:
//! - ≥90% test coverage
//! - Zero clippy/doc warnings
//! - Zero `unwrap`/`expect` in library code

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod aabb;
mod config;
mod error;
mod rtree;

// Re-export core types
pub use aabb::Aabb;
pub use config::RTreeConfig;
pub use error::SpatialError;
pub use rtree::{QueryStats, RTree, TreeStats};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
