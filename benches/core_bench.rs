//! Benchmarks for stackrun core operations.
//!
//! Run with: cargo bench
//!
//! Results include 95% confidence intervals via Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use stackrun::core::types::{RandomPetArgs, RandomStringArgs};
use stackrun::core::{parser, state};
use stackrun::provenance::hasher;
use stackrun::resources::{random_pet, random_string};

fn bench_random_pet(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_pet");
    for length in [1u32, 2, 3, 8] {
        let args = RandomPetArgs {
            length: Some(length),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        group.bench_with_input(BenchmarkId::from_parameter(length), &args, |b, args| {
            b.iter(|| black_box(random_pet::generate(black_box(args), &mut rng)));
        });
    }
    group.finish();
}

fn bench_random_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_string");
    for length in [16u32, 60, 256, 4096] {
        let args = RandomStringArgs {
            min_upper: Some(2),
            min_numeric: Some(2),
            ..RandomStringArgs::with_length(length)
        };
        let mut rng = StdRng::seed_from_u64(42);
        group.bench_with_input(BenchmarkId::from_parameter(length), &args, |b, args| {
            b.iter(|| black_box(random_string::generate(black_box(args), &mut rng)));
        });
    }
    group.finish();
}

fn bench_composite_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite_hash");
    for size in [64, 256, 1024, 4096] {
        let input: String = "x".repeat(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| black_box(hasher::composite_hash(black_box(&["fixtures", "dev", input.as_str()]))));
        });
    }
    group.finish();
}

fn bench_state_checksum(c: &mut Criterion) {
    let mut st = state::new_state("bench", "dev");
    for i in 0..32 {
        st.outputs.insert(
            format!("out-{i}"),
            stackrun::core::types::OutputValue::new(serde_json::json!(format!("value-{i}"))),
        );
    }
    c.bench_function("state_checksum_32_outputs", |b| {
        b.iter(|| black_box(state::compute_checksum(black_box(&st))));
    });
}

fn bench_settings_parse(c: &mut Criterion) {
    let yaml = r#"
version: "1.0"
project: bench
stack: dev
description: "benchmark settings"
program: named-string
config:
  name: x
  aws:region: us-west-2
  token:
    value: hunter2
    secret: true
policy:
  event_log: true
  state_file: true
"#;
    c.bench_function("settings_parse_validate", |b| {
        b.iter(|| {
            let settings = parser::parse_settings(black_box(yaml)).unwrap();
            black_box(parser::validate_settings(&settings));
        });
    });
}

criterion_group!(
    benches,
    bench_random_pet,
    bench_random_string,
    bench_composite_hash,
    bench_state_checksum,
    bench_settings_parse
);
criterion_main!(benches);
