//! Simulation benchmarks for skirmish_core.
//!
//! Run with: `cargo bench -p skirmish_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skirmish_core::config::SimConfig;
use skirmish_core::simulation::Simulation;

fn populated(wave_size: u32) -> Simulation {
    let config = SimConfig {
        wave_size,
        ..Default::default()
    };
    let mut sim = Simulation::new(config).expect("default config is valid");
    // First tick spawns the wave
    sim.tick().expect("tick");
    sim
}

/// Per-tick cost as the wave grows.
pub fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for wave_size in [6_u32, 24, 96] {
        group.bench_with_input(BenchmarkId::from_parameter(wave_size), &wave_size, |b, &size| {
            let mut sim = populated(size);
            b.iter(|| black_box(sim.tick().expect("tick")));
        });
    }
    group.finish();
}

/// Full engagement from spawn to the second wave.
pub fn skirmish_benchmark(c: &mut Criterion) {
    c.bench_function("skirmish_100_ticks", |b| {
        b.iter(|| {
            let mut sim = Simulation::new(SimConfig::default()).expect("default config is valid");
            for _ in 0..100 {
                sim.tick().expect("tick");
            }
            black_box(sim.state_hash())
        });
    });
}

criterion_group!(benches, tick_benchmark, skirmish_benchmark);
criterion_main!(benches);
