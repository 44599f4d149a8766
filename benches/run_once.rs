//! Time of a single region step for hardcoded and parameterized regions, serial and parallel.
//!
//! Run with: `cargo bench --bench run_once`

use cla_region::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn sequence_inputs(size: usize, patterns: usize) -> Vec<Vec<bool>> {
    let width = size / patterns;
    (0..patterns)
        .map(|p| (0..size).map(|i| i / width == p).collect())
        .collect()
}

/// Warms up a region so that segments exist before measuring.
fn trained(params: RegionParams, inputs: &[Vec<bool>]) -> Region {
    let mut region = Region::new(params).expect("valid params");
    for _ in 0..5 {
        for input in inputs {
            region.update_input(input).expect("input size");
            region.run_once();
        }
    }
    region
}

fn bench_hardcoded(c: &mut Criterion) {
    let mut group = c.benchmark_group("hardcoded_run_once");
    let inputs = sequence_inputs(1000, 10);

    for scheduler in [Scheduler::Serial, Scheduler::Parallel] {
        let params = RegionParams::hardcoded(1000, 1, 4, 3, 5).with_scheduler(scheduler);
        let mut region = trained(params, &inputs);
        let mut step = 0;

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{scheduler:?}")),
            &scheduler,
            |b, _| {
                b.iter(|| {
                    region.update_input(&inputs[step % inputs.len()]).expect("input size");
                    region.run_once();
                    step += 1;
                    black_box(region.last_accuracy())
                })
            },
        );
    }

    group.finish();
}

fn bench_parameterized(c: &mut Criterion) {
    let mut group = c.benchmark_group("parameterized_run_once");
    group.sample_size(20);
    let inputs = sequence_inputs(32 * 32, 8);

    for scheduler in [Scheduler::Serial, Scheduler::Parallel] {
        let params = RegionParams::parameterized(32, 32, 16, 16, 0.5, 0.1, 0, 0.05, 4, 3, 5)
            .with_spatial_learning(true)
            .with_scheduler(scheduler);
        let mut region = trained(params, &inputs);
        let mut step = 0;

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{scheduler:?}")),
            &scheduler,
            |b, _| {
                b.iter(|| {
                    region.update_input(&inputs[step % inputs.len()]).expect("input size");
                    region.run_once();
                    step += 1;
                    black_box(region.num_active_columns())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_hardcoded, bench_parameterized);
criterion_main!(benches);
