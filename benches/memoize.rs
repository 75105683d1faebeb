//! Memoization Benchmarks
//!
//! Compares computing numeric primitives directly against going through a
//! [`CalculationContext`], whose memoized caches turn repeated calls into lookups.
//!
//! ### 1. Hot cache (`benchmark_hot_cache`)
//! The same argument is requested on every iteration, so after the first call
//! every lookup is a hit. This is the best case for memoization.
//!
//! ### 2. Parallel batches (`benchmark_parallel`)
//! A slice of inputs is evaluated with `sin_many`, which fans out over rayon while
//! sharing one cache, against a sequential loop of direct calls.
//!
//! ## Usage
//!
//! Run with: `cargo bench --bench memoize`

use std::hint::black_box;

use calcexpr::context::CalculationContext;
use calcexpr::operators::{combination, factorial};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn benchmark_hot_cache(c: &mut Criterion) {
    let ctx = CalculationContext::new();
    let mut group = c.benchmark_group("Hot Cache");

    group.bench_function("factorial/direct", |b| {
        b.iter(|| black_box(factorial(black_box(150))))
    });
    group.bench_function("factorial/memoized", |b| {
        b.iter(|| black_box(ctx.factorial(black_box(150))))
    });

    group.bench_function("combination/direct", |b| {
        b.iter(|| black_box(combination(black_box(60), black_box(30))))
    });
    group.bench_function("combination/memoized", |b| {
        b.iter(|| black_box(ctx.combination(black_box(60), black_box(30))))
    });

    group.bench_function("sin/direct", |b| b.iter(|| black_box(black_box(0.5f64).sin())));
    group.bench_function("sin/memoized", |b| {
        b.iter(|| black_box(ctx.sin(black_box(0.5))))
    });

    group.finish();
}

fn benchmark_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parallel Batches");

    for size in [100usize, 1_000, 10_000] {
        let xs: Vec<f64> = (0..size).map(|i| (i % 360) as f64).collect();
        let ctx = CalculationContext::new();

        group.bench_with_input(BenchmarkId::new("sequential", size), &xs, |b, xs| {
            b.iter(|| black_box(xs.iter().map(|x| x.sin()).collect::<Vec<_>>()))
        });
        group.bench_with_input(BenchmarkId::new("sin_many", size), &xs, |b, xs| {
            b.iter(|| black_box(ctx.sin_many(xs)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_hot_cache, benchmark_parallel);
criterion_main!(benches);
