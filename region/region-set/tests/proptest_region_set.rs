//! Property-based tests for region sets.
//!
//! Random sequences of mutations are applied to a set and the snapshot is
//! checked after every step: the entity table and the index must agree and
//! point queries must match a brute-force scan.
//!
//! Run with: cargo test -p region-set -- proptest

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use nalgebra::{Point2, Point3};
use proptest::prelude::*;
use region_set::{RegionSet, RemovalStrategy, WorldConfig};
use region_types::{FlagRegistry, Region, RegionId, Shape};
use ward_spatial::RTreeConfig;

// =============================================================================
// Strategies
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Add { slot: u8, shape: Shape, priority: i32 },
    Remove { slot: u8, cascade: bool },
    Redefine { slot: u8, shape: Shape },
    SetParent { slot: u8, parent: Option<u8> },
    SetPriority { slot: u8, priority: i32 },
}

fn arb_cuboid() -> impl Strategy<Value = Shape> {
    (0.0..90.0f64, 0.0..90.0f64, 0.0..90.0f64, 0.5..20.0f64, 0.5..20.0f64, 0.5..20.0f64)
        .prop_map(|(x, y, z, w, h, d)| {
            Shape::cuboid(Point3::new(x, y, z), Point3::new(x + w, y + h, z + d)).unwrap()
        })
}

fn arb_triangle() -> impl Strategy<Value = Shape> {
    (0.0..90.0f64, 0.0..90.0f64, 1.0..20.0f64, 0.0..60.0f64, 1.0..40.0f64).prop_map(
        |(x, z, size, min_y, height)| {
            Shape::polygon(
                vec![
                    Point2::new(x, z),
                    Point2::new(x + size, z),
                    Point2::new(x, z + size),
                ],
                min_y,
                min_y + height,
            )
            .unwrap()
        },
    )
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        4 => arb_cuboid(),
        2 => arb_triangle(),
        1 => Just(Shape::Global),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    let slot = 0u8..12;
    prop_oneof![
        4 => (slot.clone(), arb_shape(), -5i32..5)
            .prop_map(|(slot, shape, priority)| Op::Add { slot, shape, priority }),
        2 => (slot.clone(), any::<bool>()).prop_map(|(slot, cascade)| Op::Remove { slot, cascade }),
        2 => (slot.clone(), arb_cuboid()).prop_map(|(slot, shape)| Op::Redefine { slot, shape }),
        2 => (slot.clone(), proptest::option::of(0u8..12))
            .prop_map(|(slot, parent)| Op::SetParent { slot, parent }),
        1 => (slot, -5i32..5).prop_map(|(slot, priority)| Op::SetPriority { slot, priority }),
    ]
}

fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    (-5.0..115.0f64, -5.0..115.0f64, -5.0..115.0f64).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

// =============================================================================
// Helpers
// =============================================================================

fn slot_id(slot: u8) -> RegionId {
    RegionId::new(format!("slot{slot}")).unwrap()
}

fn apply(set: &RegionSet, op: Op) {
    // Errors are expected (duplicate ids, cycles, missing regions); the
    // properties only care that the set stays consistent.
    let _ = match op {
        Op::Add { slot, shape, priority } => {
            let region = if shape.is_global() {
                Region::new(slot_id(slot), shape)
            } else {
                Region::new(slot_id(slot), shape).map(|r| r.with_priority(priority))
            };
            region.and_then(|region| set.add(region))
        }
        Op::Remove { slot, cascade } => {
            let strategy = if cascade {
                RemovalStrategy::RemoveChildren
            } else {
                RemovalStrategy::UnsetParentInChildren
            };
            set.remove_with(&slot_id(slot), strategy).map(|_| ())
        }
        Op::Redefine { slot, shape } => set.redefine(&slot_id(slot), shape),
        Op::SetParent { slot, parent } => set.set_parent(&slot_id(slot), parent.map(slot_id)),
        Op::SetPriority { slot, priority } => set.set_priority(&slot_id(slot), priority),
    };
}

fn small_tree_set() -> RegionSet {
    let config = WorldConfig::new()
        .with_index(RTreeConfig::new().with_max_children(4).with_min_children(2));
    RegionSet::new(config, Arc::new(FlagRegistry::with_defaults())).unwrap()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Every published snapshot passes the full consistency check.
    #[test]
    fn random_ops_stay_consistent(ops in prop::collection::vec(arb_op(), 1..60)) {
        let set = small_tree_set();
        let mut last = set.generation();
        for op in ops {
            apply(&set, op);
            let snapshot = set.snapshot();
            prop_assert!(snapshot.check_consistency().is_ok());
            prop_assert!(snapshot.generation() >= last);
            last = snapshot.generation();
        }
    }

    /// Point queries return exactly the regions whose shape contains the
    /// point, in precedence order with globals last.
    #[test]
    fn point_query_matches_scan(
        ops in prop::collection::vec(arb_op(), 1..60),
        points in prop::collection::vec(arb_point(), 1..20),
    ) {
        let set = small_tree_set();
        for op in ops {
            apply(&set, op);
        }
        let snapshot = set.snapshot();

        for point in &points {
            let found: Vec<RegionId> = snapshot
                .applicable_regions(point)
                .iter()
                .map(|r| r.id().clone())
                .collect();

            let mut expected: Vec<&Region> = snapshot.iter().filter(|r| r.contains(point)).collect();
            expected.sort_by(|a, b| a.cmp_precedence(b));
            let expected: Vec<RegionId> = expected.iter().map(|r| r.id().clone()).collect();

            prop_assert_eq!(found, expected);
        }
    }

    /// A failed mutation leaves the generation and contents untouched.
    #[test]
    fn failed_ops_change_nothing(ops in prop::collection::vec(arb_op(), 1..40)) {
        let set = small_tree_set();
        for op in ops {
            let before = set.snapshot();
            let ids_before = before.ids();
            let result = match op.clone() {
                Op::Redefine { slot, shape } => set.redefine(&slot_id(slot), shape),
                Op::SetParent { slot, parent } => set.set_parent(&slot_id(slot), parent.map(slot_id)),
                other => {
                    apply(&set, other);
                    continue;
                }
            };
            if result.is_err() {
                let after = set.snapshot();
                prop_assert_eq!(after.generation(), before.generation());
                prop_assert_eq!(after.ids(), ids_before);
            }
        }
    }
}
