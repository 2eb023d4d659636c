//! Benchmarks for structural merge of override value trees.
//!
//! Measures the typical shapes merge sees in practice: shallow override
//! maps on top of chart defaults, deep nesting, and long layer stacks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use manifest_engine::merge::{merge, merge_all};
use manifest_engine::object::Values;
use serde_json::{json, Value};

/// Chart-style defaults with `width` top-level sections
fn defaults(width: usize) -> Values {
    let mut values = Values::new();
    for i in 0..width {
        values.insert(
            format!("component{}", i),
            json!({
                "image": {
                    "repository": "registry.local/app",
                    "tag": "1.0.0",
                    "pullPolicy": "IfNotPresent"
                },
                "replicas": 1,
                "resources": {"limits": {"cpu": "500m", "memory": "256Mi"}},
                "env": ["A=1", "B=2"],
                "enabled": true
            }),
        );
    }
    values
}

/// Overrides touching every tenth section
fn overrides(width: usize) -> Values {
    let mut values = Values::new();
    for i in (0..width).step_by(10) {
        values.insert(
            format!("component{}", i),
            json!({"image": {"tag": "2.0.0"}, "replicas": 3}),
        );
    }
    values
}

/// A single chain of `depth` nested mappings
fn nested(depth: usize, leaf: Value) -> Values {
    let mut value = leaf;
    for i in (0..depth).rev() {
        let mut level = Values::new();
        level.insert(format!("level{}", i), value);
        value = Value::Object(level);
    }
    match value {
        Value::Object(map) => map,
        _ => Values::new(),
    }
}

fn bench_merge_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_width");

    for width in [10, 100, 1000] {
        let base = defaults(width);
        let overlay = overrides(width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| merge(black_box(Some(&base)), black_box(Some(&overlay))))
        });
    }

    group.finish();
}

fn bench_merge_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_depth");

    for depth in [4, 16, 64] {
        let base = nested(depth, json!({"a": 1, "b": 2}));
        let overlay = nested(depth, json!({"b": 3}));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| merge(black_box(Some(&base)), black_box(Some(&overlay))))
        });
    }

    group.finish();
}

fn bench_merge_empty_sides(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_empty");
    let base = defaults(100);

    group.bench_function("no_overlay", |b| {
        b.iter(|| merge(black_box(Some(&base)), black_box(None)))
    });
    group.bench_function("no_base", |b| {
        b.iter(|| merge(black_box(None), black_box(Some(&base))))
    });

    group.finish();
}

fn bench_merge_layers(c: &mut Criterion) {
    let base = defaults(100);
    let layers: Vec<Values> = std::iter::once(base)
        .chain((0..10).map(|_| overrides(100)))
        .collect();

    c.bench_function("merge_all_11_layers", |b| {
        b.iter(|| merge_all(black_box(&layers)))
    });
}

criterion_group!(
    benches,
    bench_merge_width,
    bench_merge_depth,
    bench_merge_empty_sides,
    bench_merge_layers
);
criterion_main!(benches);
