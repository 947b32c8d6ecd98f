//! Criterion benchmarks for pricer_core linear algebra.
//!
//! Measures the two kernels the Monte Carlo core leans on:
//! - least-squares regression on design matrices of LSM size
//! - rank-reduced covariance square roots for market models

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{DMatrix, DVector};
use pricer_core::math::{least_squares, rank_reduced_sqrt};

fn design(rows: usize, cols: usize) -> (DMatrix<f64>, DVector<f64>) {
    let x = DMatrix::from_fn(rows, cols, |i, j| {
        let s = 0.5 + (i as f64 * 0.618).fract();
        s.powi(j as i32)
    });
    let y = DVector::from_fn(rows, |i, _| (i as f64 * 0.37).sin());
    (x, y)
}

/// Benchmark least-squares fits with a quadratic basis.
fn bench_least_squares(c: &mut Criterion) {
    let mut group = c.benchmark_group("least_squares");

    for rows in [1_000, 10_000, 50_000] {
        let (x, y) = design(rows, 3);
        group.bench_with_input(BenchmarkId::new("quadratic", rows), &rows, |b, _| {
            b.iter(|| black_box(least_squares(&x, &y)))
        });
    }

    group.finish();
}

/// Benchmark pseudo-square-roots of exponential correlation matrices.
fn bench_rank_reduced_sqrt(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_reduced_sqrt");

    for n in [10, 20, 40] {
        let corr = DMatrix::from_fn(n, n, |i, j| {
            0.5 + 0.5 * (-0.1 * (i as f64 - j as f64).abs()).exp()
        });
        for factors in [1, 3, n] {
            group.bench_with_input(
                BenchmarkId::new(format!("rates_{n}"), factors),
                &factors,
                |b, &f| b.iter(|| black_box(rank_reduced_sqrt(&corr, f, 1.0))),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_least_squares, bench_rank_reduced_sqrt);
criterion_main!(benches);
