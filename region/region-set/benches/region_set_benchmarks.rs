//! Benchmarks for region sets.
//!
//! Run with: cargo bench -p region-set
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p region-set -- --save-baseline main
//! 2. After changes: cargo bench -p region-set -- --baseline main

#![allow(missing_docs, clippy::unwrap_used)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use nalgebra::Point3;
use region_set::{RegionSet, WorldConfig};
use region_types::{
    FlagEntry, FlagId, FlagRegistry, Region, RegionDefinition, RegionId, Shape, State, names,
};

// =============================================================================
// Test Data Generation
// =============================================================================

/// A `side` x `side` grid of 16-block plots under one town region, every
/// fourth plot denying pvp.
fn town(side: u32) -> Vec<RegionDefinition> {
    let extent = f64::from(side) * 16.0;
    let mut town = Region::new(
        RegionId::new("town").unwrap(),
        Shape::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(extent, 256.0, extent)).unwrap(),
    )
    .unwrap()
    .with_flag(FlagId::new(names::PVP), FlagEntry::new(State::Allow))
    .to_definition();
    town.priority = -1;

    let mut definitions = vec![town];
    for i in 0..side * side {
        let x = f64::from(i % side) * 16.0;
        let z = f64::from(i / side) * 16.0;
        let mut plot = RegionDefinition::new(
            format!("plot{i}"),
            Shape::cuboid(Point3::new(x, 0.0, z), Point3::new(x + 15.0, 256.0, z + 15.0)).unwrap(),
        );
        plot.parent = Some("town".to_string());
        if i % 4 == 0 {
            plot.flags
                .push((FlagId::new(names::PVP), FlagEntry::new(State::Deny)));
        }
        definitions.push(plot);
    }
    definitions
}

fn load(side: u32) -> RegionSet {
    RegionSet::from_definitions(
        town(side),
        WorldConfig::default(),
        Arc::new(FlagRegistry::with_defaults()),
    )
    .unwrap()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_bulk_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("BulkLoad");

    for side in [10, 32, 100] {
        let definitions = town(side);
        group.throughput(Throughput::Elements(u64::from(side * side)));
        group.bench_with_input(BenchmarkId::from_parameter(side * side), &definitions, |b, defs| {
            b.iter(|| {
                black_box(
                    RegionSet::from_definitions(
                        defs.clone(),
                        WorldConfig::default(),
                        Arc::new(FlagRegistry::with_defaults()),
                    )
                    .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("ResolvePoint");
    let pvp = FlagId::new(names::PVP);

    for side in [10, 100] {
        let set = load(side);
        let point = Point3::new(8.0, 64.0, 8.0);
        group.bench_with_input(BenchmarkId::from_parameter(side * side), &set, |b, set| {
            b.iter(|| black_box(set.resolve(black_box(&point), &pvp, None)));
        });
    }

    group.finish();
}

fn bench_mutations(c: &mut Criterion) {
    let mut group = c.benchmark_group("Mutations");

    for side in [10, 100] {
        let set = load(side);
        let plot = RegionId::new("plot1").unwrap();
        let shapes = [
            Shape::cuboid(Point3::new(16.0, 0.0, 0.0), Point3::new(31.0, 256.0, 15.0)).unwrap(),
            Shape::cuboid(Point3::new(16.0, 0.0, 0.0), Point3::new(31.0, 128.0, 15.0)).unwrap(),
        ];
        let mut flip = 0;
        group.bench_function(BenchmarkId::new("redefine", side * side), |b| {
            b.iter(|| {
                flip ^= 1;
                set.redefine(&plot, shapes[flip].clone()).unwrap();
            });
        });
    }

    let unverified = RegionSet::from_definitions(
        town(100),
        WorldConfig::new().with_verify_commits(false),
        Arc::new(FlagRegistry::with_defaults()),
    )
    .unwrap();
    let plot = RegionId::new("plot2").unwrap();
    group.bench_function("set_priority_unverified/10000", |b| {
        let mut priority = 0;
        b.iter(|| {
            priority = (priority + 1) % 8;
            unverified.set_priority(&plot, priority).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_bulk_load, bench_resolve, bench_mutations);
criterion_main!(benches);
