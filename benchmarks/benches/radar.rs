use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use num_bigint::BigUint;

use landscape_core::{quick_reject, Family, MainStar, PowerDifference, PrimalityOracle};
use landscape_stats::{AggregationEngine, ModelParams};
use satellite_radar::{Granularity, SatelliteScanner};

/// First base of the built-in quadruplet catalog.
const STAR: u64 = 117_309_848;

fn star() -> MainStar {
    let family = PowerDifference::default();
    let n = BigUint::from(STAR);
    let value = family.value(&n).unwrap();
    MainStar::new(n, value)
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let family = PowerDifference::default();

    for n in [1_000u64, 117_309_848, 41_262_186_068] {
        let n = BigUint::from(n);
        group.bench_with_input(BenchmarkId::from_parameter(&n), &n, |b, n| {
            b.iter(|| family.value(n).unwrap());
        });
    }

    group.finish();
}

fn bench_quick_reject(c: &mut Criterion) {
    let star = star();
    c.bench_function("quick_reject_star_minus_4", |b| {
        let candidate = &star.value - 4u32;
        b.iter(|| quick_reject(&candidate));
    });
}

fn bench_oracle(c: &mut Criterion) {
    let mut group = c.benchmark_group("oracle");
    group.sample_size(10);
    let star = star();

    for rounds in [0u32, 5, 25] {
        let oracle = PrimalityOracle::new(landscape_core::OracleConfig {
            rounds,
            ..Default::default()
        });
        group.bench_with_input(BenchmarkId::from_parameter(rounds), &star.value, |b, p| {
            b.iter(|| oracle.is_probable_prime(p));
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    group.sample_size(10);
    let family = PowerDifference::default();
    let oracle = PrimalityOracle::default();
    let star = star();

    for radius in [60u64, 120] {
        let scanner = SatelliteScanner::new(&oracle, family.admissibility(), Granularity::PerCandidate);
        group.bench_with_input(BenchmarkId::from_parameter(radius), &radius, |b, &r| {
            b.iter(|| scanner.scan(&star, r).unwrap());
        });
    }

    group.finish();
}

fn bench_singular_series(c: &mut Criterion) {
    c.bench_function("aggregation_engine_new", |b| {
        b.iter(|| AggregationEngine::new(ModelParams::default()).unwrap());
    });
}

criterion_group!(
    benches,
    bench_generate,
    bench_quick_reject,
    bench_oracle,
    bench_scan,
    bench_singular_series
);
criterion_main!(benches);
