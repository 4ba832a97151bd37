//! Flag resolution across overlapping regions.
//!
//! This crate turns "which regions contain this point" into "what is the
//! value of this flag here". It works on candidate lists produced by
//! `region-set` and on the types in `region-types`.
//!
//! # Overview
//!
//! - **Resolution** ([`FlagResolver`]): collapses the candidates and a flag
//!   into one [`ResolvedValue`], with the regions that supplied it
//! - **Membership** ([`membership::membership`]): whether an actor is a
//!   member of every region that counts at a point
//! - **Parent chains** ([`lookup::RegionLookup`]): id-to-region lookup used
//!   to walk inheritance and ownership up the parent chain
//! - **Combination** ([`combine::combine`]): first-match, deny-overrides,
//!   AND/OR and MIN/MAX folding
//!
//! # Resolution Order
//!
//! | Step | Rule |
//! |------|------|
//! | 1 | Candidates are walked in precedence order (non-global first, priority descending, id ascending) |
//! | 2 | Each candidate's value comes from the region itself, else its nearest ancestor that sets it for this actor |
//! | 3 | A child candidate's value replaces its ancestors' values |
//! | 4 | First-match flags stop at the first priority level with a value; combined flags fold all values |
//! | 5 | Membership-fallback flags (`build`) with no value: allow for members, deny for others |
//! | 6 | Otherwise the world default, then the flag default |
//!
//! # Example
//!
//! ```
//! use hashbrown::HashMap;
//! use nalgebra::Point3;
//! use region_resolve::{FlagResolver, ValueSource};
//! use region_types::{
//!     ActorContext, Domain, FlagId, FlagRegistry, Region, RegionId, Shape, names,
//! };
//! use uuid::Uuid;
//!
//! let alice = Uuid::from_u128(1);
//! let plot = Region::new(
//!     RegionId::new("plot")?,
//!     Shape::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(15.0, 255.0, 15.0))?,
//! )?
//! .with_members(Domain::new().with_player(alice));
//!
//! let registry = FlagRegistry::with_defaults();
//! let resolver = FlagResolver::new(&registry);
//! let lookup: HashMap<RegionId, Region> = HashMap::new();
//! let build = FlagId::new(names::BUILD);
//!
//! let resolved = resolver.resolve(&lookup, &[&plot], &build, Some(&ActorContext::player(alice)));
//! assert!(resolved.is_allowed());
//! assert!(matches!(resolved.source(), ValueSource::Membership(_)));
//!
//! let stranger = ActorContext::player(Uuid::from_u128(2));
//! assert!(resolver.resolve(&lookup, &[&plot], &build, Some(&stranger)).is_denied());
//! # Ok::<(), region_types::RegionError>(())
//! ```
//!
//! # Failure Model
//!
//! Resolution never returns an error. Unknown flags, values of the wrong
//! kind and dangling parents all degrade to "not set here", and an unset
//! flag falls back to its default.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod combine;
mod effective;
pub mod lookup;
pub mod membership;
pub mod resolver;
pub mod value;

pub use lookup::{NoParents, RegionLookup};
pub use membership::Membership;
pub use resolver::FlagResolver;
pub use value::{ResolvedValue, ValueSource};
