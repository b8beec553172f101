//! Criterion micro-benchmarks for ensemble bookkeeping.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use drift_bench::{reference_grid, reference_state, seed_batch, EddyField};
use drift_state::NoBehavior;
use drift_tracker::{Tracker, TrackerConfig};
use tracing::Span;

const PARTICLES: usize = 100_000;

/// Benchmark: compact 100K particles with every third one dead.
fn bench_compact_100k(c: &mut Criterion) {
    let grid = reference_grid();
    let state = || {
        let mut s = reference_state(&grid, PARTICLES, 42);
        for (n, alive) in s.alive_mut().iter_mut().enumerate() {
            *alive = n % 3 != 0;
        }
        s
    };

    c.bench_function("compact_100k", |b| {
        b.iter_batched(
            state,
            |mut s| black_box(s.compact()),
            BatchSize::LargeInput,
        );
    });
}

/// Benchmark: append a 10K release batch to a 100K ensemble.
fn bench_append_10k(c: &mut Criterion) {
    let grid = reference_grid();
    let batch = seed_batch(&grid, 10_000, PARTICLES as u64, 9);

    c.bench_function("append_10k_to_100k", |b| {
        b.iter_batched(
            || (reference_state(&grid, PARTICLES, 42), batch.clone()),
            |(mut s, batch)| black_box(s.append(batch).unwrap()),
            BatchSize::LargeInput,
        );
    });
}

/// Benchmark: a full ensemble update of 100K particles.
fn bench_update_100k(c: &mut Criterion) {
    let grid = reference_grid();
    let field = EddyField { speed: 0.5 };
    let tracker = Tracker::new(
        &TrackerConfig {
            dt: 600.0,
            ..TrackerConfig::default()
        },
        Span::none(),
    )
    .unwrap();

    c.bench_function("update_100k", |b| {
        b.iter_batched(
            || reference_state(&grid, PARTICLES, 42),
            |mut s| black_box(s.update(&grid, &field, &tracker, &mut NoBehavior).unwrap()),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_compact_100k, bench_append_10k, bench_update_100k);
criterion_main!(benches);
