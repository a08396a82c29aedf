// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Performance Benchmarks for Queue, Sync and Location Operations
//!
//! Run with: cargo bench -p fieldsync-core

use std::sync::Arc;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

// =============================================================================
// EVENT STORE BENCHMARKS
// =============================================================================

fn bench_storage(c: &mut Criterion) {
    use fieldsync_core::{EventType, Storage};

    let mut group = c.benchmark_group("storage");
    let payload = br#"{"guard":"A-17","zone":12,"lat":-6.2,"lng":106.8,"accuracy":9.5}"#;

    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("enqueue_in_memory", |b| {
        let storage = Storage::in_memory().unwrap();
        b.iter(|| storage.enqueue(&EventType::GpsPing, Utc::now(), black_box(payload)))
    });

    group.bench_function("list_unsynced_1000", |b| {
        let storage = Storage::in_memory().unwrap();
        for _ in 0..1000 {
            storage
                .enqueue(&EventType::GpsPing, Utc::now(), payload)
                .unwrap();
        }
        b.iter(|| storage.list_unsynced().unwrap())
    });

    group.bench_function("queue_stats_1000", |b| {
        let storage = Storage::in_memory().unwrap();
        for _ in 0..1000 {
            storage
                .enqueue(&EventType::Checklist, Utc::now(), payload)
                .unwrap();
        }
        b.iter(|| storage.queue_stats().unwrap())
    });

    group.finish();
}

// =============================================================================
// SYNC BENCHMARKS
// =============================================================================

fn bench_sync(c: &mut Criterion) {
    use fieldsync_core::{EventType, MockTransport, SyncConfig, SyncContext, SyncEngine};

    let mut group = c.benchmark_group("sync");

    group.bench_function("drain_500_events", |b| {
        b.iter_batched(
            || {
                let engine = SyncEngine::new(
                    SyncContext::in_memory().unwrap(),
                    Arc::new(MockTransport::new()),
                    SyncConfig::default(),
                );
                for _ in 0..500 {
                    engine
                        .context()
                        .storage()
                        .enqueue(&EventType::GpsPing, Utc::now(), b"{}")
                        .unwrap();
                }
                engine
            },
            |engine| engine.drain_and_sync().unwrap(),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

// =============================================================================
// LOCATION BENCHMARKS
// =============================================================================

fn bench_location(c: &mut Criterion) {
    use fieldsync_core::{classify_mock_location, distance_meters, LocationSample};

    let mut group = c.benchmark_group("location");

    group.bench_function("haversine", |b| {
        b.iter(|| distance_meters(black_box((-6.2, 106.8)), black_box((-6.21, 106.83))))
    });

    let sample = LocationSample::new(-6.2, 106.8, 12.0);
    group.bench_function("classify_mock_location", |b| {
        b.iter(|| classify_mock_location(black_box(&sample)))
    });

    group.finish();
}

// =============================================================================
// MAIN
// =============================================================================

criterion_group!(benches, bench_storage, bench_sync, bench_location);

criterion_main!(benches);
