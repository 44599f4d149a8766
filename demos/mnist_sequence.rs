//! Sequence learning on handwritten digits.
//!
//! The region sees the digits 0, 1, ..., 9 over and over, each time drawn from a different MNIST
//! image of that digit. Spatial pooling maps the varying handwriting onto a column grid and
//! temporal pooling learns which digit follows which. Accuracy is reported per pass over the
//! sequence.
//!
//! Run with: `cargo run --release --example mnist_sequence`

use anyhow::{bail, Result};
use cla_region::prelude::*;
use mnist::{Mnist, MnistBuilder};
use tracing::info;
use tracing_subscriber::EnvFilter;

const IMAGE_SIDE: usize = 28;
const PASSES: usize = 30;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("loading MNIST dataset");

    let Mnist { trn_img, trn_lbl, .. } = MnistBuilder::new()
        .label_format_digit()
        .training_set_length(10_000)
        .finalize();

    let image_size = IMAGE_SIDE * IMAGE_SIDE;

    // Binarized images grouped by digit.
    let mut by_digit: Vec<Vec<Vec<bool>>> = vec![Vec::new(); 10];
    for (i, &label) in trn_lbl.iter().enumerate() {
        let image = &trn_img[i * image_size..(i + 1) * image_size];
        by_digit[label as usize].push(image.iter().map(|&px| px > 127).collect());
    }
    if by_digit.iter().any(Vec::is_empty) {
        bail!("training set does not contain every digit");
    }

    let params = RegionParams::parameterized(IMAGE_SIDE, IMAGE_SIDE, 24, 24, 0.3, 0.1, 0, 0.04, 4, 3, 6)
        .with_spatial_learning(true)
        .with_scheduler(Scheduler::Parallel);
    let mut region = Region::new(params)?;

    info!(
        columns = region.columns.len(),
        cells = region.num_cells(),
        desired_local_activity = region.desired_local_activity,
        "region ready"
    );

    for pass in 0..PASSES {
        let mut activation = 0.0;
        let mut prediction = 0.0;

        for (digit, images) in by_digit.iter().enumerate() {
            region.update_input(&images[pass % images.len()])?;
            region.run_once();

            let accuracy = region.last_accuracy();
            activation += accuracy.activation;
            prediction += accuracy.prediction;

            if pass + 1 == PASSES {
                let predicted = region.column_predictions().iter().filter(|&&steps| steps == 1).count();
                info!(digit, predicted_columns = predicted, "last pass");
            }
        }

        println!(
            "pass {:>2}: activation accuracy {:.2}%, prediction accuracy {:.2}%, segments {}",
            pass,
            10.0 * activation,
            10.0 * prediction,
            region.num_region_segments(0)
        );
    }

    Ok(())
}
