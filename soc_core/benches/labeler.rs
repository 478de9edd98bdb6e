use std::collections::BTreeMap;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use soc_core::{ExtractOptions, extract_cycles, soc_for_voltage};
use soc_traits::{Node, Variables};

// Voltages sweeping the labeled range, with a tiny PRNG for jitter
fn voltage_sweep(n: usize, seed: u32) -> Vec<f64> {
    let mut state = seed.max(1);
    let mut jitter = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / f64::from(u32::MAX) * 0.01
    };
    (0..n)
        .map(|i| 3.4 + 0.9 * (i as f64 / n as f64) + jitter())
        .collect()
}

fn synthetic_battery(cycles: usize, samples: usize) -> Variables {
    let cycle = |i: usize| {
        let v: Vec<f64> = (0..samples)
            .map(|k| 4.2 - 0.7 * k as f64 / samples as f64 - i as f64 * 1e-4)
            .collect();
        let mut data = BTreeMap::new();
        data.insert("Voltage_measured".to_string(), Node::Array(v));
        data.insert(
            "Current_measured".to_string(),
            Node::Array(vec![-2.0; samples]),
        );
        data.insert(
            "Temperature_measured".to_string(),
            Node::Array(vec![24.0; samples]),
        );
        data.insert(
            "Time".to_string(),
            Node::Array((0..samples).map(|k| k as f64).collect()),
        );
        let mut rec = BTreeMap::new();
        rec.insert(
            "type".to_string(),
            Node::List(vec![Node::Text("discharge".into())]),
        );
        rec.insert("data".to_string(), Node::List(vec![Node::Record(data)]));
        Node::Record(rec)
    };
    let mut battery = BTreeMap::new();
    battery.insert(
        "cycle".to_string(),
        Node::List((0..cycles).map(cycle).collect()),
    );
    let mut vars = Variables::new();
    vars.insert("B0005".to_string(), Node::List(vec![Node::Record(battery)]));
    vars
}

fn bench_labeler(c: &mut Criterion) {
    let mut g = c.benchmark_group("labeler");
    let volts = voltage_sweep(10_000, 0xBA77);
    g.bench_function("soc_for_voltage_10k", |b| {
        b.iter(|| {
            let total: f64 = volts.iter().map(|&v| soc_for_voltage(black_box(v))).sum();
            black_box(total);
        })
    });
    g.finish();
}

fn bench_extract(c: &mut Criterion) {
    let mut g = c.benchmark_group("extract");
    let vars = synthetic_battery(168, 400);
    g.bench_function("extract_168_cycles", |b| {
        b.iter_batched(
            || ExtractOptions::default(),
            |opts| {
                let out = extract_cycles(black_box(&vars), "B0005", &opts);
                black_box(out.map(|e| e.records.len()).unwrap_or(0));
            },
            BatchSize::SmallInput,
        )
    });
    g.finish();
}

criterion_group!(benches, bench_labeler, bench_extract);
criterion_main!(benches);
