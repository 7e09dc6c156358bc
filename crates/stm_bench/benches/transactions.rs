//! Transaction benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeMap;
use stm_core::{Ptr, Stm};

#[path = "../src/utils.rs"]
#[allow(dead_code)]
mod utils;

/// Create an engine with `count` integer slots.
fn slots(count: usize) -> (Stm, Vec<Ptr<i64>>) {
    let stm = Stm::new();
    let ptrs = (0..count)
        .map(|i| {
            let ptr = stm.new_pointer::<i64>();
            stm.store(ptr, &(i as i64)).unwrap();
            ptr
        })
        .collect();
    (stm, ptrs)
}

/// Benchmark committing transactions that write N pointers.
fn bench_commit_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_writes");

    for count in [1usize, 10, 100].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let (stm, ptrs) = slots(count);
            let mut round = 0i64;
            b.iter(|| {
                round += 1;
                stm.transact(|txn| {
                    for &ptr in &ptrs {
                        txn.set(ptr, black_box(round))?;
                    }
                    Ok(())
                })
                .unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark read-only transactions over N pointers.
fn bench_read_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_only");

    for count in [1usize, 10, 100].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let (stm, ptrs) = slots(count);
            b.iter(|| {
                let sum = stm
                    .transact(|txn| {
                        let mut sum = 0i64;
                        for &ptr in &ptrs {
                            sum += *txn.get(ptr)?;
                        }
                        Ok(sum)
                    })
                    .unwrap();
                black_box(sum);
            });
        });
    }

    group.finish();
}

/// Benchmark in-place edits of a map picked up by the commit check.
fn bench_in_place_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("in_place_map");

    for size in [16usize, 256, 4096].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let stm = Stm::new();
            let root = stm.init_root(&utils::random_map(size)).unwrap();
            let mut round = 0i64;
            b.iter(|| {
                round += 1;
                stm.transact(|txn| {
                    txn.get_mut(root)?.insert("counter".into(), round);
                    Ok(())
                })
                .unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark a nested child commit followed by the parent commit.
fn bench_nested(c: &mut Criterion) {
    c.bench_function("nested_commit", |b| {
        let stm = Stm::new();
        let root = stm.init_root(&BTreeMap::<String, i64>::new()).unwrap();
        let mut round = 0i64;
        b.iter(|| {
            round += 1;
            stm.transact(|txn| {
                txn.transact(|child| {
                    child.get_mut(root)?.insert("child".into(), round);
                    Ok(())
                })?;
                txn.get_mut(root)?.insert("parent".into(), round);
                Ok(())
            })
            .unwrap();
        });
    });
}

/// Benchmark detecting a conflict at commit.
fn bench_conflict(c: &mut Criterion) {
    c.bench_function("conflict_detection", |b| {
        let stm = Stm::new();
        let counter = stm.init_root(&0i64).unwrap();
        b.iter(|| {
            let mut stale = stm.begin();
            stale.get(counter).unwrap();
            stm.transact(|txn| txn.update(counter, |v| *v += 1)).unwrap();
            stale.set(counter, -1).unwrap();
            let err = stale.commit().unwrap_err();
            black_box(err);
        });
    });
}

criterion_group!(
    benches,
    bench_commit_writes,
    bench_read_only,
    bench_in_place_map,
    bench_nested,
    bench_conflict,
);
criterion_main!(benches);
