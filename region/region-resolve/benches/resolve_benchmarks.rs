//! Benchmarks for flag resolution.
//!
//! Run with: cargo bench -p region-resolve
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p region-resolve -- --save-baseline main
//! 2. After changes: cargo bench -p region-resolve -- --baseline main

#![allow(missing_docs, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use hashbrown::HashMap;
use nalgebra::Point3;
use region_resolve::FlagResolver;
use region_types::{
    ActorContext, Domain, FlagEntry, FlagId, FlagRegistry, Region, RegionGroup, RegionId, Shape,
    State, names,
};
use uuid::Uuid;

// =============================================================================
// Test Data Generation
// =============================================================================

/// `depth` nested regions, each the parent of the next, with every third
/// region setting `pvp` and every region listing one member.
fn nested(depth: i32) -> (HashMap<RegionId, Region>, Vec<Region>) {
    let mut regions = Vec::new();
    for level in 0..depth {
        let lo = f64::from(level);
        let hi = 100.0 - f64::from(level);
        let mut region = Region::new(
            RegionId::new(format!("level{level}")).unwrap(),
            Shape::cuboid(Point3::new(lo, lo, lo), Point3::new(hi, hi, hi)).unwrap(),
        )
        .unwrap()
        .with_priority(level % 4)
        .with_members(Domain::new().with_player(Uuid::from_u128(u128::from(level.unsigned_abs()))));
        if level > 0 {
            region = region
                .with_parent(RegionId::new(format!("level{}", level - 1)).unwrap())
                .unwrap();
        }
        if level % 3 == 0 {
            region = region.with_flag(
                FlagId::new(names::PVP),
                FlagEntry::new(State::Deny).with_override(RegionGroup::Members, State::Allow),
            );
        }
        regions.push(region);
    }
    regions.sort_by(Region::cmp_precedence);
    let table = regions.iter().map(|r| (r.id().clone(), r.clone())).collect();
    (table, regions)
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("Resolve");
    let registry = FlagRegistry::with_defaults();
    let resolver = FlagResolver::new(&registry);
    let actor = ActorContext::player(Uuid::from_u128(1)).with_group("builders");

    for depth in [1, 4, 16] {
        let (table, regions) = nested(depth);
        let candidates: Vec<&Region> = regions.iter().collect();

        for flag in [names::PVP, names::BUILD, names::TNT] {
            let flag = FlagId::new(flag);
            group.bench_with_input(
                BenchmarkId::new(flag.as_str(), depth),
                &candidates,
                |b, candidates| {
                    b.iter(|| {
                        black_box(resolver.resolve(
                            &table,
                            black_box(candidates),
                            &flag,
                            Some(&actor),
                        ))
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_membership(c: &mut Criterion) {
    let mut group = c.benchmark_group("Membership");
    let registry = FlagRegistry::with_defaults();
    let resolver = FlagResolver::new(&registry);
    let actor = ActorContext::player(Uuid::from_u128(3));

    for depth in [4, 16] {
        let (table, regions) = nested(depth);
        let candidates: Vec<&Region> = regions.iter().collect();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &candidates, |b, candidates| {
            b.iter(|| black_box(resolver.membership(&table, black_box(candidates), &actor)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_membership);
criterion_main!(benches);
