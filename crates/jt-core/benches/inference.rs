//! Criterion benchmarks for junction-tree construction, propagation, and EM.
//!
//! Networks are synthetic so the numbers are reproducible across machines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jt_common::{Evidence, Network};
use jt_config::InferenceConfig;
use jt_core::inference::{Inference, JunctionTreeEngine};
use jt_core::learning::expectation_step;
use jt_core::structure::JunctionTree;
use serde_json::{json, Value};

/// Binary network where node `i` has parents `i-1` and `i-2`.
fn ladder(n: usize) -> Network {
    let name = |i: usize| format!("N{}", i);
    let nodes: Vec<Value> = (0..n)
        .map(|i| {
            let parents: Vec<usize> = (i.saturating_sub(2)..i).collect();
            if parents.is_empty() {
                return json!({"id": name(i), "states": ["T", "F"], "cpt": {"T": 0.3, "F": 0.7}});
            }
            let rows: Vec<Value> = (0..1usize << parents.len())
                .map(|ctx| {
                    let when: serde_json::Map<String, Value> = parents
                        .iter()
                        .enumerate()
                        .map(|(k, &p)| {
                            let bit = (ctx >> (parents.len() - 1 - k)) & 1;
                            (name(p), json!(if bit == 0 { "T" } else { "F" }))
                        })
                        .collect();
                    let p = 0.1 + 0.8 * ((ctx * 7 + i) % 10) as f64 / 10.0;
                    json!({"when": when, "then": {"T": p, "F": 1.0 - p}})
                })
                .collect();
            json!({"id": name(i), "states": ["T", "F"], "parents": parents.iter().map(|&p| name(p)).collect::<Vec<_>>(), "cpt": rows})
        })
        .collect();
    serde_json::from_value(Value::Array(nodes)).expect("ladder network is valid")
}

fn bench_structure(c: &mut Criterion) {
    let mut group = c.benchmark_group("structure");
    for n in [8usize, 16, 32] {
        let network = ladder(n);
        group.bench_with_input(BenchmarkId::new("build", n), &network, |b, net| {
            b.iter(|| JunctionTree::build(black_box(net), &[]).expect("structure builds"))
        });
    }
    group.finish();
}

fn bench_propagation(c: &mut Criterion) {
    let network = ladder(16);
    let hard = Evidence::new().hard("N3", "T").hard("N12", "F");
    let soft = Evidence::new()
        .soft("N2", [("T", 0.7), ("F", 0.3)])
        .soft("N9", [("T", 0.2), ("F", 0.8)])
        .hard("N14", "T");

    let mut group = c.benchmark_group("marginals");
    let uncached = JunctionTreeEngine::new(InferenceConfig::uncached());
    for (name, evidence) in [("none", Evidence::new()), ("hard", hard), ("soft", soft)] {
        group.bench_with_input(BenchmarkId::new("uncached", name), &evidence, |b, ev| {
            b.iter(|| {
                uncached
                    .marginals(black_box(&network), black_box(ev))
                    .expect("inference succeeds")
            })
        });
    }

    let cached = JunctionTreeEngine::default();
    let evidence = Evidence::new().hard("N5", "F");
    group.bench_function("cached_hit", |b| {
        b.iter(|| {
            cached
                .marginals(black_box(&network), black_box(&evidence))
                .expect("inference succeeds")
        })
    });
    group.finish();
}

fn bench_expectation_step(c: &mut Criterion) {
    let network = ladder(10);
    let observations: Vec<Evidence> = (0..200)
        .map(|k| {
            let w = 0.05 + 0.9 * (k % 17) as f64 / 16.0;
            Evidence::new()
                .hard(format!("N{}", k % 10), if k % 2 == 0 { "T" } else { "F" })
                .soft(format!("N{}", (k + 3) % 10), [("T", w), ("F", 1.0 - w)])
        })
        .collect();

    let mut group = c.benchmark_group("expectation_step");
    for workers in [1usize, 4] {
        let engine = JunctionTreeEngine::new(InferenceConfig::uncached());
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &w| {
            b.iter(|| {
                expectation_step(&engine, black_box(&network), black_box(&observations), w)
                    .expect("expectation step succeeds")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_structure, bench_propagation, bench_expectation_step);
criterion_main!(benches);
