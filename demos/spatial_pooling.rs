//! A parameterized region pools moving bars on a 32x32 input into a 16x16 column grid.
//!
//! Spatial learning is switched on, so proximal permanences and boosts adapt while the bars sweep
//! across the input. The demo prints how sparse the column activity is and how much of each
//! column's proximal segment ends up connected.
//!
//! Run with: `RUST_LOG=cla_region=debug cargo run --release --example spatial_pooling`

use anyhow::Result;
use cla_region::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SIZE: usize = 32;
const STEPS: usize = 400;

/// A vertical or horizontal bar, four bits thick, at `offset`.
fn bar(offset: usize, vertical: bool) -> Vec<bool> {
    (0..SIZE * SIZE)
        .map(|i| {
            let (x, y) = (i % SIZE, i / SIZE);
            let pos = if vertical { x } else { y };
            (offset..offset + 4).contains(&pos)
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RegionConfig {
        report_interval: 100,
        ..RegionConfig::default()
    };
    let params = RegionParams::parameterized(SIZE, SIZE, 16, 16, 0.5, 0.1, 0, 0.05, 4, 3, 5)
        .with_spatial_learning(true)
        .with_scheduler(Scheduler::Parallel)
        .with_config(config);
    let mut region = Region::new(params)?;

    info!(
        inhibition_radius = region.inhibition_radius,
        desired_local_activity = region.desired_local_activity,
        synapses_per_segment = region.synapses_per_segment,
        "region ready"
    );

    let bars: Vec<Vec<bool>> = (0..SIZE - 4)
        .step_by(4)
        .flat_map(|offset| [bar(offset, true), bar(offset, false)])
        .collect();

    for step in 0..STEPS {
        region.update_input(&bars[step % bars.len()])?;
        region.run_once();

        if (step + 1) % 50 == 0 {
            let accuracy = region.last_accuracy();
            info!(
                step = step + 1,
                active_columns = region.num_active_columns(),
                inhibition_radius = region.inhibition_radius,
                activation = accuracy.activation,
                prediction = accuracy.prediction,
                "progress"
            );
        }
    }

    let connected = region.params.config.permanence.connected;
    let connected_fraction: f32 = region
        .columns
        .iter()
        .map(|column| {
            let total = column.proximal.synapses.len().max(1);
            column.proximal.num_connected(connected) as f32 / total as f32
        })
        .sum::<f32>()
        / region.columns.len() as f32;

    let mean_boost: f32 =
        region.columns.iter().map(|column| column.boost).sum::<f32>() / region.columns.len() as f32;

    println!(
        "active columns: {} of {}, connected proximal synapses: {:.1}%, mean boost: {:.3}",
        region.num_active_columns(),
        region.columns.len(),
        100.0 * connected_fraction,
        mean_boost
    );

    Ok(())
}
