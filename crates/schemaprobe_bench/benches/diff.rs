//! Diff engine benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use schemaprobe_bench::{half_migrated, wide_schema};
use schemaprobe_core::{collections_to_create, collections_to_delete, compute_drift, Exclusions};
use schemaprobe_storage::{MemoryEngine, StorageEngine};

/// Benchmark collection set differences.
fn bench_collection_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection_diff");

    for size in [8usize, 64, 512].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let schema = wide_schema(size, 0);
            let existing: Vec<String> = (0..size).step_by(2).map(|c| format!("c{c}")).collect();

            b.iter(|| {
                let created = collections_to_create(black_box(&existing), black_box(&schema));
                let deleted = collections_to_delete(black_box(&existing), black_box(&schema));
                black_box((created, deleted));
            });
        });
    }

    group.finish();
}

/// Benchmark a full drift check against a live connection.
fn bench_compute_drift(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_drift");

    for size in [8usize, 64, 256].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let engine = MemoryEngine::new();
            let schema = wide_schema(size, 4);
            half_migrated(&engine, "bench", &schema);
            let conn = engine.open("bench", 1, &mut |_, _| Ok(())).unwrap();
            let exclude = Exclusions::new();

            b.iter(|| {
                let report = compute_drift(black_box(&conn), black_box(&schema), &exclude).unwrap();
                black_box(report);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_collection_diff, bench_compute_drift);
criterion_main!(benches);
