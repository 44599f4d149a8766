//! A hardcoded region learns a repeating sequence of ten non-overlapping patterns.
//!
//! Each pattern activates 25 of 250 columns. After two passes the region predicts every next
//! pattern and both accuracies reach 100%.
//!
//! Run with: `RUST_LOG=cla_region=debug cargo run --release --example sequence_learning`

use anyhow::Result;
use cla_region::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

const COLUMNS: usize = 250;
const PATTERNS: usize = 10;
const CYCLES: usize = 5;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RegionConfig {
        report_interval: PATTERNS as u64,
        ..RegionConfig::default()
    };
    let params = RegionParams::hardcoded(COLUMNS, 1, 1, 3, 4)
        .with_config(config)
        .with_scheduler(Scheduler::Parallel);
    let mut region = Region::new(params)?;

    let width = COLUMNS / PATTERNS;
    let patterns: Vec<Vec<bool>> = (0..PATTERNS)
        .map(|p| (0..COLUMNS).map(|i| i / width == p).collect())
        .collect();

    for cycle in 0..CYCLES {
        for (i, pattern) in patterns.iter().enumerate() {
            region.update_input(pattern)?;
            region.run_once();

            let accuracy = region.last_accuracy();
            info!(
                cycle,
                pattern = i,
                activation = accuracy.activation,
                prediction = accuracy.prediction,
                "step"
            );
        }
    }

    let predicted: Vec<usize> = region
        .column_predictions()
        .iter()
        .enumerate()
        .filter(|&(_, &steps)| steps > 0)
        .map(|(col, _)| col)
        .collect();
    info!(?predicted, "columns expected next");

    let stats = region.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
