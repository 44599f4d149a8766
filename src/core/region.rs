//! The `Region` owns the column grid, the hyperparameters and the input buffer, and runs spatial and
//! temporal pooling once per time step.
//!
//! A region is built in one of two ways:
//! - Hardcoded: one column per input bit and no proximal synapses. A column is active iff its input
//!   bit is set. This isolates temporal pooling from spatial pooling.
//! - Parameterized: an arbitrary column grid laid over the input grid. Each column is wired to a
//!   random subset of input bits around its center, and the inhibition parameters are derived from
//!   the resulting receptive fields.
//!
//! The caller writes the input, calls `run_once`, and may then query accuracy, predictions and
//! per-cell output until the next call. `run_once` takes `&mut self`, so a step can never be
//! re-entered or run concurrently with a query.

use super::{
    activity::Activity,
    cell::{Cell, CellAddress},
    column::Column,
    config::RegionParams,
    topology::Topology,
};
use crate::error::{HtmError, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Accuracy of the predictions made at the previous step, measured against the current step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    /// Fraction of active columns that were correctly predicted.
    pub activation: f32,

    /// Fraction of predicted columns that became active.
    pub prediction: f32,
}

#[derive(Debug, Clone)]
pub struct Region {
    pub params: RegionParams,

    /// Shape of the column grid.
    pub topology: Topology,

    /// Shape of the input grid.
    pub input_topology: Topology,

    pub columns: Vec<Column>,

    /// Input for the next step. Latched by `run_once`.
    pub input: Vec<bool>,

    pub(crate) activity: Activity,

    /// Connected active proximal synapses a column needs before it can compete.
    pub min_overlap: f32,

    /// Radius (in column grid units) of local inhibition.
    pub inhibition_radius: f32,

    /// Number of columns allowed to win within one inhibition neighborhood.
    pub desired_local_activity: usize,

    /// Distance between two neighboring columns measured in input bits.
    pub x_space: f32,
    pub y_space: f32,

    /// Locality radius measured in input bits.
    pub input_radius: f32,

    pub synapses_per_segment: usize,

    iterations: u64,
}

impl Region {
    /// Creates a region with a random source seeded from `params.seed`.
    pub fn new(params: RegionParams) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(params.seed);
        Self::with_rng(params, &mut rng)
    }

    /// Creates a region drawing wiring and per-column generators from `rng`.
    pub fn with_rng<R: Rng>(mut params: RegionParams, rng: &mut R) -> Result<Self> {
        params.validate()?;

        let (width, height) = params.column_dimensions();
        let topology = Topology::new(width, height);
        let input_topology = Topology::new(params.input_width, params.input_height);

        if params.is_hardcoded() {
            params.spatial_learning = false;
        }
        let (x_space, y_space) = params.input_spacing();

        let columns = (0..topology.len())
            .map(|index| {
                let (cx, cy) = topology.coordinates(index);
                let ix = (cx as f32 * x_space).round() as usize;
                let iy = (cy as f32 * y_space).round() as usize;
                Column::new(index, cx, cy, ix, iy, params.cells_per_column, StdRng::from_rng(&mut *rng))
            })
            .collect();

        let mut region = Self {
            activity: Activity::new(topology, params.cells_per_column, input_topology.len()),
            input: vec![false; input_topology.len()],
            topology,
            input_topology,
            columns,
            min_overlap: 1.0,
            inhibition_radius: 0.0,
            desired_local_activity: 1,
            x_space,
            y_space,
            input_radius: 0.0,
            synapses_per_segment: 0,
            iterations: 0,
            params,
        };

        if !region.params.is_hardcoded() {
            region.wire_proximal_synapses(rng);
        }

        debug!(
            columns = ?(width, height),
            input = ?(region.params.input_width, region.params.input_height),
            cells_per_column = region.params.cells_per_column,
            x_space = region.x_space,
            y_space = region.y_space,
            input_radius = region.input_radius,
            desired_local_activity = region.desired_local_activity,
            synapses_per_segment = region.synapses_per_segment,
            min_overlap = region.min_overlap,
            "region created"
        );

        Ok(region)
    }

    /// Replaces the input for the next step.
    pub fn update_input(&mut self, input: &[bool]) -> Result<()> {
        if input.len() != self.input.len() {
            return Err(HtmError::InputSizeMismatch {
                expected: self.input.len(),
                actual: input.len(),
            });
        }

        self.input.copy_from_slice(input);
        Ok(())
    }

    /// Direct access to the input buffer of the next step.
    #[inline]
    pub fn input_mut(&mut self) -> &mut [bool] {
        &mut self.input
    }

    /// Performs one full time step: advance, spatial pooling, temporal pooling.
    pub fn run_once(&mut self) {
        self.next_time_step();
        self.perform_spatial_pooling();
        self.perform_temporal_pooling();

        self.iterations += 1;

        let interval = self.params.config.report_interval;
        if interval > 0 && self.iterations % interval == 0 {
            let accuracy = self.last_accuracy();
            debug!(
                iteration = self.iterations,
                active_columns = self.num_active_columns(),
                segments = self.num_region_segments(0),
                sequence_segments = self.num_region_segments(1),
                activation_accuracy = accuracy.activation,
                prediction_accuracy = accuracy.prediction,
                "region report"
            );
        }
    }

    /// Latches the input and moves every column, cell and segment to the next time step.
    pub fn next_time_step(&mut self) {
        self.activity.latch_input(&self.input);
        self.for_each_column(|column| column.next_time_step());
        self.activity.capture(&self.columns);
    }

    /// Activation and prediction accuracy of the last step.
    ///
    /// A column counts as predicted if one of its cells was predicting at `t-1` through a sequence
    /// segment. Both values are 0 when their denominator is 0.
    pub fn last_accuracy(&self) -> Accuracy {
        let mut active = 0;
        let mut predicted = 0;
        let mut active_and_predicted = 0;

        for column in &self.columns {
            if column.is_active {
                active += 1;
            }

            let was_predicted = column.cells.iter().any(|cell| {
                cell.was_predicted
                    && cell
                        .segments
                        .iter()
                        .any(|seg| seg.was_active && seg.is_sequence)
            });

            if was_predicted {
                predicted += 1;
                if column.is_active {
                    active_and_predicted += 1;
                }
            }
        }

        let ratio = |n: usize, d: usize| if d > 0 { n as f32 / d as f32 } else { 0.0 };

        Accuracy {
            activation: ratio(active_and_predicted, active),
            prediction: ratio(active_and_predicted, predicted),
        }
    }

    /// For every column the fewest steps ahead any of its cells predicts, 0 if none is predicting.
    pub fn column_predictions(&self) -> Vec<usize> {
        self.columns.iter().map(Column::prediction_steps).collect()
    }

    /// Per-cell output (active or predicting), indexed by `col * cells_per_column + cell`.
    pub fn cell_output(&self) -> Vec<bool> {
        self.columns
            .iter()
            .flat_map(|column| column.cells.iter().map(Cell::output))
            .collect()
    }

    /// Number of distal segments predicting exactly `prediction_steps` ahead, or all if 0.
    pub fn num_region_segments(&self, prediction_steps: usize) -> usize {
        self.cells()
            .map(|cell| cell.num_segments_with_steps(prediction_steps))
            .sum()
    }

    pub fn num_active_columns(&self) -> usize {
        self.columns.iter().filter(|column| column.is_active).count()
    }

    #[inline]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.columns.len() * self.params.cells_per_column
    }

    /// Iterates over every cell in column order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.columns.iter().flat_map(|column| column.cells.iter())
    }

    pub fn cell(&self, address: CellAddress) -> Option<&Cell> {
        self.columns.get(address.col)?.cells.get(address.cell)
    }

    pub fn set_spatial_learning(&mut self, enabled: bool) {
        self.params.spatial_learning = enabled && !self.params.is_hardcoded();
    }

    pub fn set_temporal_learning(&mut self, enabled: bool) {
        self.params.temporal_learning = enabled;
    }
}
