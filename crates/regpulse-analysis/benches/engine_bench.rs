//! Engine benchmarks: aggregation, isolation ensemble, k-means, and the
//! full pipeline over synthetic record tables.
//!
//! Run with: cargo bench -p regpulse-analysis --bench engine_bench

use chrono::{Duration, NaiveDate};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use regpulse_analysis::aggregation::aggregate;
use regpulse_analysis::clustering::{cluster, region_features, ClusterParams};
use regpulse_analysis::outliers::isolation::{self, FeatureMatrix, IsolationParams};
use regpulse_analysis::AnalyticsPipeline;
use regpulse_core::traits::CancellationToken;
use regpulse_core::types::Dataset;
use regpulse_core::{Family, KeyField, Record, RecordTable, Region};

const STATES: [&str; 6] = ["Assam", "Bihar", "Goa", "Kerala", "Punjab", "Sikkim"];

/// `rows` records spread over 6 states, 5 districts each, and 90 days.
fn synthetic(family: Family, rows: usize) -> RecordTable {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let width = family.categories().len();
    let records = (0..rows)
        .map(|i| {
            let state = STATES[i % STATES.len()];
            let district = format!("{state}-{}", (i / STATES.len()) % 5);
            let date = start + Duration::days((i % 90) as i64);
            let counts: Vec<u64> = (0..width)
                .map(|c| ((i * 7919 + c * 104_729) % 97) as u64)
                .collect();
            Record::with_counts(Region::new(state, district), date, &counts)
        })
        .collect();
    RecordTable::new(family, records).unwrap()
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    for size in [10_000, 100_000] {
        let table = synthetic(Family::Enrollment, size);
        group.bench_with_input(BenchmarkId::new("state_district", size), &size, |b, _| {
            b.iter(|| {
                aggregate(&table, &[KeyField::State, KeyField::District], &["total_enroll"])
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_isolation(c: &mut Criterion) {
    let mut group = c.benchmark_group("isolation");
    group.sample_size(10);
    for size in [1_000, 10_000] {
        let table = synthetic(Family::Enrollment, size);
        let matrix = FeatureMatrix::for_table(&table).unwrap();
        let params = IsolationParams::default();
        let token = CancellationToken::new();
        group.bench_with_input(BenchmarkId::new("detect", size), &size, |b, _| {
            b.iter(|| isolation::detect(&matrix, &params, &token).unwrap());
        });
    }
    group.finish();
}

fn bench_kmeans(c: &mut Criterion) {
    let table = synthetic(Family::Biometric, 20_000);
    let features = region_features(&table).unwrap();
    let params = ClusterParams::new(4, 42);
    let token = CancellationToken::new();
    c.bench_function("cluster_regions", |b| {
        b.iter(|| cluster(&features, &params, &token).unwrap());
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);
    let dataset = Dataset::new(
        synthetic(Family::Biometric, 20_000),
        synthetic(Family::Demographic, 20_000),
        synthetic(Family::Enrollment, 20_000),
    );
    let pipeline = AnalyticsPipeline::default();
    group.bench_function("full_run", |b| {
        b.iter(|| pipeline.run(&dataset));
    });
    group.finish();
}

criterion_group!(benches, bench_aggregate, bench_isolation, bench_kmeans, bench_pipeline);
criterion_main!(benches);
