//! Storage-Layer Benchmarks
//!
//! Measures the Htree's put/get paths, the cost of taking a snapshot,
//! and the one-time clone a write pays after a snapshot.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use snapkv::storage::{Htree, Value};

fn populated(n: usize) -> Htree {
    let mut table = Htree::new();
    for i in 0..n {
        table.put(
            Bytes::from(format!("key:{}", i)),
            Value::Str(Bytes::from(format!("value:{}", i))),
        );
    }
    table
}

/// Benchmark PUT operations
fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");
    group.throughput(Throughput::Elements(1));

    // The directory never resizes, so chains grow with the table; reset
    // periodically to keep the measurement at a fixed chain length.
    group.bench_function("put_insert", |b| {
        let mut table = Htree::new();
        let mut i = 0u64;
        b.iter(|| {
            if table.len() >= 100_000 {
                table = Htree::new();
            }
            let key = Bytes::from(format!("key:{}", i));
            table.put(key, Value::Str(Bytes::from("small_value")));
            i += 1;
        });
    });

    group.bench_function("put_overwrite", |b| {
        let mut table = populated(1_000);
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i % 1_000));
            table.put(key, Value::Str(Bytes::from("replacement")));
            i += 1;
        });
    });

    // Each iteration pays for a snapshot plus the chain clone the write
    // forces afterwards - the worst case for a single put. The table is
    // rebuilt periodically so accumulated generations stay bounded.
    group.bench_function("put_after_snapshot", |b| {
        let mut table = populated(1_000);
        let mut i = 0u64;
        b.iter(|| {
            if table.generation_count() >= 10_000 {
                table = populated(1_000);
            }
            table.snapshot();
            let key = Bytes::from(format!("key:{}", i % 1_000));
            table.put(key, Value::Str(Bytes::from("cow_write")));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let table = populated(10_000);

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 10_000);
            black_box(table.get(key.as_bytes()));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            black_box(table.get(key.as_bytes()));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark snapshot cost against table size
fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    // Snapshot cost is O(bucket count), so these should be flat across
    // table sizes.
    for size in [100usize, 10_000, 100_000] {
        group.bench_function(format!("snapshot_{}_entries", size), |b| {
            let mut table = populated(size);
            b.iter(|| {
                if table.generation_count() >= 10_000 {
                    table = populated(size);
                }
                black_box(table.snapshot());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_put, bench_get, bench_snapshot);
criterion_main!(benches);
