use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use powercurve_tracker::services::curve::merge_series;
use powercurve_tracker::services::power::{best_efforts, rolling_max_average};
use std::hint::black_box;

/// Deterministic ride-like watts: steady base with periodic surges.
fn synthetic_ride(seconds: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..seconds)
        .map(|i| {
            // xorshift64 step
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let noise = (state % 40) as f64;
            let surge = if i % 600 < 30 { 250.0 } else { 0.0 };
            180.0 + noise + surge
        })
        .collect()
}

fn benchmark_rolling_max(c: &mut Criterion) {
    let ride = synthetic_ride(4 * 3600, 0x5eed);

    let mut group = c.benchmark_group("rolling_max_average");
    for duration in [5u32, 60, 1200, 3600] {
        group.bench_with_input(
            BenchmarkId::from_parameter(duration),
            &duration,
            |b, &duration| b.iter(|| rolling_max_average(black_box(&ride), duration)),
        );
    }
    group.finish();

    c.bench_function("best_efforts_4h_ride", |b| {
        b.iter(|| best_efforts(black_box(&ride)))
    });
}

fn benchmark_merge(c: &mut Criterion) {
    let rides: Vec<Vec<f64>> = (1..=5)
        .map(|seed| synthetic_ride(2 * 3600, seed))
        .collect();

    c.bench_function("merge_five_2h_rides", |b| {
        b.iter(|| merge_series(black_box(rides.iter().map(Vec::as_slice))))
    });
}

criterion_group!(benches, benchmark_rolling_max, benchmark_merge);
criterion_main!(benches);
