//! Criterion benchmarks for stock game hot paths.
//!
//! Benchmarks:
//! 1. CSV parsing (decode, header resolution, date parsing, sort)
//! 2. Window carving (slice and numeric cleaning)
//! 3. Full sampling call over an in-memory corpus

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use stockgame_core::data::{parse_table, synthetic_table, MemorySource};
use stockgame_core::{carve_window, ConstrainedSampler, SamplerConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_csv(rows: usize) -> String {
    let base = NaiveDate::from_ymd_opt(2012, 1, 2).unwrap();
    let mut text =
        String::from("date,open,close,high,low,change_pct,volume,turnover_rate,pe,pb\n");
    // Newest first, as many vendor exports are.
    for i in (0..rows).rev() {
        let close = 10.0 + (i as f64 * 0.1).sin();
        text.push_str(&format!(
            "{},{:.2},{:.2},{:.2},{:.2},{:.2},{},{:.2},{:.2},{:.2}\n",
            (base + Duration::days(i as i64)).format("%Y-%m-%d"),
            close - 0.1,
            close,
            close + 0.2,
            close - 0.2,
            0.5,
            1_000_000 + i,
            1.2,
            15.0,
            2.0,
        ));
    }
    text
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2012, 1, 2).unwrap()
}

// ── 1. Parsing ───────────────────────────────────────────────────────

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_table");

    for rows in [500usize, 2500, 5000] {
        let text = make_csv(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &text, |b, text| {
            b.iter(|| parse_table("BENCH", black_box(text.as_bytes())).unwrap());
        });
    }

    group.finish();
}

// ── 2. Carving ───────────────────────────────────────────────────────

fn bench_carve(c: &mut Criterion) {
    let mut group = c.benchmark_group("carve_window");
    let table = synthetic_table("BENCH", start(), 3000, 7, &[]);

    for lookback in [60usize, 300] {
        group.bench_with_input(
            BenchmarkId::from_parameter(lookback),
            &lookback,
            |b, &lookback| {
                b.iter(|| carve_window(&table, black_box(1500), lookback));
            },
        );
    }

    group.finish();
}

// ── 3. Sampling ──────────────────────────────────────────────────────

fn bench_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample");
    let config = SamplerConfig::default();

    let eligible = (0..50).fold(MemorySource::new(), |source, i| {
        source.with_table(synthetic_table(&format!("S{i:03}"), start(), 2500, i, &[]))
    });
    group.bench_function("50_eligible", |b| {
        let sampler = ConstrainedSampler::new(&eligible, &config);
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| sampler.sample(&mut rng).unwrap());
    });

    // One eligible file among many short ones: exercises the retry loop.
    let sparse = (0..49)
        .fold(MemorySource::new(), |source, i| {
            source.with_table(synthetic_table(&format!("T{i:03}"), start(), 300, i, &[]))
        })
        .with_table(synthetic_table("LONG", start(), 2500, 99, &[]));
    let lenient = SamplerConfig {
        max_attempts: 10_000,
        ..SamplerConfig::default()
    };
    group.bench_function("1_of_50_eligible", |b| {
        let sampler = ConstrainedSampler::new(&sparse, &lenient);
        let mut rng = StdRng::seed_from_u64(1);
        b.iter(|| sampler.sample(&mut rng).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_carve, bench_sample);
criterion_main!(benches);
