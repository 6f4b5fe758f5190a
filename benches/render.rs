//! Benchmarks for the renderer: the escape-time function on its own, and
//! whole renders at a few anti-aliasing depths and thread counts.
//!
//! Run with: cargo bench --bench render

#[macro_use]
extern crate criterion;
extern crate mandelbrot;
extern crate num;

use criterion::{black_box, BenchmarkId, Criterion};
use mandelbrot::{escape_rate, render, RenderConfig};
use num::Complex;

fn escape(c: &mut Criterion) {
    c.bench_function("escape_rate inside", |b| {
        b.iter(|| escape_rate(black_box(Complex::new(-0.1, 0.1))))
    });
    c.bench_function("escape_rate boundary", |b| {
        b.iter(|| escape_rate(black_box(Complex::new(-0.7435, 0.1314))))
    });
}

fn whole_image(c: &mut Criterion) {
    let mut group = c.benchmark_group("render 160x120");
    group.sample_size(10);
    for &depth in &[0u32, 1, 2] {
        for &workers in &[1usize, 4] {
            let config = RenderConfig {
                width: 160,
                height: 120,
                aa_depth: depth,
                workers,
                ..RenderConfig::default()
            };
            group.bench_with_input(
                BenchmarkId::new(format!("depth {}", depth), workers),
                &config,
                |b, config| b.iter(|| render(config).unwrap()),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, escape, whole_image);
criterion_main!(benches);
