//! Throughput of a hardcoded region fed a long random sequence.
//!
//! A fixed set of random sparse patterns is presented in a fixed random order. The demo reports
//! steps per second for the chosen scheduler and the accuracy reached at the end.
//!
//! Run with: `cargo run --release --example random_sequence -- [serial|parallel]`

use std::time::Instant;

use anyhow::{bail, Result};
use cla_region::prelude::*;
use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

const COLUMNS: usize = 2048;
const ACTIVE_BITS: usize = 40;
const PATTERNS: usize = 50;
const SEQUENCE_LEN: usize = 20;
const STEPS: usize = 2000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let scheduler = match std::env::args().nth(1).as_deref() {
        None | Some("parallel") => Scheduler::Parallel,
        Some("serial") => Scheduler::Serial,
        Some(other) => bail!("unknown scheduler '{other}', expected serial or parallel"),
    };

    let mut rng = StdRng::seed_from_u64(2024);
    let bit_positions: Vec<usize> = (0..COLUMNS).collect();
    let patterns: Vec<Vec<bool>> = (0..PATTERNS)
        .map(|_| {
            let mut input = vec![false; COLUMNS];
            for &i in bit_positions.choose_multiple(&mut rng, ACTIVE_BITS) {
                input[i] = true;
            }
            input
        })
        .collect();
    let sequence: Vec<usize> = (0..SEQUENCE_LEN).map(|_| rng.random_range(0..PATTERNS)).collect();

    let params = RegionParams::hardcoded(COLUMNS, 1, 8, 10, 15).with_scheduler(scheduler);
    let mut region = Region::with_rng(params, &mut rng)?;

    let start = Instant::now();
    for step in 0..STEPS {
        region.update_input(&patterns[sequence[step % SEQUENCE_LEN]])?;
        region.run_once();
    }
    let elapsed = start.elapsed();

    let accuracy = region.last_accuracy();
    let stats = region.stats();
    info!(
        ?scheduler,
        segments = stats.all.segments_per_cell.total,
        synapses = stats.all.synapses_per_segment.total,
        "done"
    );

    println!(
        "{STEPS} steps in {:.2?} ({:.0} steps/s), activation {:.2}, prediction {:.2}",
        elapsed,
        STEPS as f64 / elapsed.as_secs_f64(),
        accuracy.activation,
        accuracy.prediction
    );

    Ok(())
}
