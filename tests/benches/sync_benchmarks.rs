//! # Cellar Fleet Sync Benchmarks
//!
//! Hot paths of every management operation and every consumed event:
//!
//! | Path | Called |
//! |------|--------|
//! | Policy evaluation | once per identifier per direction |
//! | Selector resolution | once per bulk operation |
//! | Reconciliation | once per listing, selector or block |

use cf_01_cluster_sync::algorithms::{evaluate, merge_units, order_candidates, resolve};
use cf_01_cluster_sync::domain::{ExtendedState, LocalUnit, LocalUnitState, UnitState};
use cf_01_cluster_sync::{CandidateOrder, PatternCache, UnitStatus};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use indexmap::IndexMap;
use rand::Rng;
use std::time::Duration;

fn unit(id: u64) -> UnitState {
    UnitState {
        id,
        name: Some(format!("Unit {id}")),
        symbolic_name: format!("org.example.unit{id}"),
        version: format!("1.{}.0", id % 7),
        status: UnitStatus::Installed,
        location: format!("mvn:org.example/unit{id}/1.{}.0", id % 7),
    }
}

fn candidates(count: u64) -> IndexMap<String, ExtendedState<UnitState>> {
    (0..count)
        .map(|id| {
            let unit = unit(id);
            (unit.key(), ExtendedState::from_cluster(unit))
        })
        .collect()
}

// ============================================================================
// Policy evaluation
// ============================================================================

fn bench_policy_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy-evaluation");
    group.measurement_time(Duration::from_secs(5));

    let patterns = PatternCache::default();
    let whitelist = vec!["^mvn:org\\.example/.*".to_string()];

    for size in [1usize, 10, 100] {
        let blacklist: Vec<String> = (0..size)
            .map(|i| format!("^mvn:org\\.blocked/unit{i}/.*"))
            .collect();
        let identifiers: Vec<String> = {
            let mut rng = rand::thread_rng();
            (0..256)
                .map(|_| format!("mvn:org.example/unit{}/1.0.0", rng.gen_range(0..10_000)))
                .collect()
        };

        group.throughput(Throughput::Elements(identifiers.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("blacklist_size", size),
            &(blacklist, identifiers),
            |b, (blacklist, identifiers)| {
                b.iter(|| {
                    let mut allowed = 0u32;
                    for identifier in identifiers {
                        if evaluate(&whitelist, blacklist, identifier, &patterns).unwrap_or(false) {
                            allowed += 1;
                        }
                    }
                    black_box(allowed)
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Selector resolution
// ============================================================================

fn bench_selector_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector-resolution");
    let patterns = PatternCache::default();

    for count in [100u64, 1_000, 10_000] {
        let candidates = candidates(count);
        group.throughput(Throughput::Elements(count));

        for (label, selector) in [
            ("id", "42"),
            ("range", "10-60"),
            ("name_version", "unit4.*/1.4.0"),
            ("name", "^Unit 9"),
        ] {
            group.bench_with_input(BenchmarkId::new(label, count), &candidates, |b, candidates| {
                b.iter(|| black_box(resolve(selector, candidates, &patterns).map(|keys| keys.len())))
            });
        }
    }

    group.finish();
}

// ============================================================================
// Reconciliation
// ============================================================================

fn bench_reconciliation(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconciliation");

    for count in [100u64, 1_000] {
        let cluster: Vec<(String, UnitState)> = (0..count)
            .map(|id| {
                let unit = unit(id);
                (unit.key(), unit)
            })
            .collect();
        // half overlap, half local-only
        let local: Vec<LocalUnit> = (count / 2..count + count / 2)
            .map(|id| {
                let unit = unit(id);
                LocalUnit {
                    id,
                    name: None,
                    symbolic_name: unit.symbolic_name,
                    version: unit.version,
                    location: unit.location,
                    state: LocalUnitState::Active,
                }
            })
            .collect();

        group.throughput(Throughput::Elements(count));
        group.bench_with_input(
            BenchmarkId::new("merge_units_canonical", count),
            &(cluster, local),
            |b, (cluster, local)| {
                b.iter(|| {
                    let mut merged = merge_units(cluster.clone(), local);
                    order_candidates(&mut merged, CandidateOrder::Canonical);
                    black_box(merged.len())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_policy_evaluation,
    bench_selector_resolution,
    bench_reconciliation
);
criterion_main!(benches);
