//! Hyperparameters and tuning constants for a `Region`.
//!
//! `RegionParams` describes the shape of a region (input grid, column grid, cells per column)
//! and the learning hyperparameters. The tuning constants that are shared by every region
//! (permanence steps, duty cycle smoothing, boosting) live in `RegionConfig`, which is passed
//! down by reference to columns, cells and segments.
//!
//! Every value is validated before a single column is built. Invalid values fail fast with
//! `HtmError::InvalidParameter`.

use crate::error::{HtmError, Result};
use serde::{Deserialize, Serialize};

/// Options governing how synapse permanence is adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynapsePermanenceOptions {
    /// A synapse is connected iff its permanence is at least this value.
    pub connected: f32,

    /// Permanence given to synapses grown during temporal learning.
    pub initial: f32,

    /// Default amount added on reinforcement.
    pub increment: f32,

    /// Default amount subtracted on decay.
    pub decrement: f32,

    /// Lower bound of every permanence.
    pub min: f32,

    /// Upper bound of every permanence.
    pub max: f32,
}

impl Default for SynapsePermanenceOptions {
    fn default() -> Self {
        Self {
            connected: 0.2,
            initial: 0.3,
            increment: 0.015,
            decrement: 0.010,
            min: 0.0,
            max: 1.0,
        }
    }
}

/// Tuning constants shared by all parts of a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Thresholds and step sizes for proximal and distal permanences.
    pub permanence: SynapsePermanenceOptions,

    /// Smoothing factor of the active and overlap duty cycle moving averages.
    pub ema_alpha: f32,

    /// Factor applied to the boost of a column that has never been active.
    pub boost_growth: f32,

    /// Fraction of the neighborhood's highest active duty cycle below which a column is boosted.
    pub min_duty_cycle_fraction: f32,

    /// Upper bound for the number of steps a distal segment may predict ahead.
    pub max_prediction_steps: usize,

    /// A best matching segment must have more active synapses than this.
    pub min_synapses_per_segment_threshold: usize,

    /// Peak of the radial bias applied to initial proximal permanences.
    pub rad_bias_peak: f32,

    /// Standard deviation (as a fraction of the longer input side) of the radial bias.
    pub rad_bias_std_dev: f32,

    /// If true, every proximal synapse starts with permanence 1.0 instead of a biased gaussian.
    pub full_default_spatial_permanence: bool,

    /// Maximum number of distal segments per cell. `None` means unbounded.
    pub max_segments_per_cell: Option<usize>,

    /// Maximum number of synapses per distal segment. `None` means unbounded.
    pub max_synapses_per_segment: Option<usize>,

    /// Emit a debug report every this many iterations. 0 disables the report.
    pub report_interval: u64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            permanence: SynapsePermanenceOptions::default(),
            ema_alpha: 0.005,
            boost_growth: 1.05,
            min_duty_cycle_fraction: 0.01,
            max_prediction_steps: 10,
            min_synapses_per_segment_threshold: 1,
            rad_bias_peak: 0.8,
            rad_bias_std_dev: 0.25,
            full_default_spatial_permanence: false,
            max_segments_per_cell: None,
            max_synapses_per_segment: None,
            report_interval: 1000,
        }
    }
}

/// How the column grid relates to the input grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpatialTopology {
    /// One column per input bit with no proximal synapses. A column is active iff its bit is set.
    Hardcoded,

    /// An arbitrary column grid whose columns are wired to random subsets of the input.
    Parameterized {
        column_width: usize,
        column_height: usize,
    },
}

/// How the temporal pooling phases are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scheduler {
    #[default]
    Serial,

    /// Fan every phase out across columns. Falls back to serial without the `parallel` feature.
    Parallel,
}

/// Shape and learning hyperparameters of a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionParams {
    /// Width of the input grid in bits.
    pub input_width: usize,

    /// Height of the input grid in bits.
    pub input_height: usize,

    /// Hardcoded or parameterized column grid.
    pub topology: SpatialTopology,

    /// Number of cells in every column.
    pub cells_per_column: usize,

    /// Number of connected active synapses that make a distal segment active.
    pub seg_active_threshold: usize,

    /// Number of synapses a learning update tries to grow onto a segment.
    pub new_synapse_count: usize,

    /// Column-grid radius for distal synapse growth and proximal wiring. 0 means unrestricted.
    pub locality_radius: usize,

    /// Fraction of the candidate inputs each proximal segment samples.
    pub pct_input_per_column: f32,

    /// Fraction of the proximal synapses that must be connected and active for a column to compete.
    pub pct_min_overlap: f32,

    /// Fraction of the inhibition neighborhood allowed to be active.
    pub pct_local_activity: f32,

    /// Adapt proximal permanences and boosts. Always off for a hardcoded region.
    pub spatial_learning: bool,

    /// Grow and adapt distal segments.
    pub temporal_learning: bool,

    /// Seed of the random source used for wiring and candidate sampling.
    pub seed: u64,

    /// Serial or parallel execution of the per-column work.
    pub scheduler: Scheduler,

    /// Tuning constants.
    pub config: RegionConfig,
}

impl Default for RegionParams {
    fn default() -> Self {
        Self {
            input_width: 32,
            input_height: 32,
            topology: SpatialTopology::Parameterized {
                column_width: 16,
                column_height: 16,
            },
            cells_per_column: 4,
            seg_active_threshold: 3,
            new_synapse_count: 5,
            locality_radius: 0,
            pct_input_per_column: 0.05,
            pct_min_overlap: 0.1,
            pct_local_activity: 0.5,
            spatial_learning: false,
            temporal_learning: true,
            seed: 42,
            scheduler: Scheduler::Serial,
            config: RegionConfig::default(),
        }
    }
}

impl RegionParams {
    /// Parameters for a region whose columns mirror the input bits one to one.
    pub fn hardcoded(
        input_width: usize,
        input_height: usize,
        cells_per_column: usize,
        seg_active_threshold: usize,
        new_synapse_count: usize,
    ) -> Self {
        Self {
            input_width,
            input_height,
            topology: SpatialTopology::Hardcoded,
            cells_per_column,
            seg_active_threshold,
            new_synapse_count,
            ..Self::default()
        }
    }

    /// Parameters for a region with its own column grid over the input.
    #[allow(clippy::too_many_arguments)]
    pub fn parameterized(
        input_width: usize,
        input_height: usize,
        column_width: usize,
        column_height: usize,
        pct_input_per_column: f32,
        pct_min_overlap: f32,
        locality_radius: usize,
        pct_local_activity: f32,
        cells_per_column: usize,
        seg_active_threshold: usize,
        new_synapse_count: usize,
    ) -> Self {
        Self {
            input_width,
            input_height,
            topology: SpatialTopology::Parameterized {
                column_width,
                column_height,
            },
            cells_per_column,
            seg_active_threshold,
            new_synapse_count,
            locality_radius,
            pct_input_per_column,
            pct_min_overlap,
            pct_local_activity,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_spatial_learning(mut self, enabled: bool) -> Self {
        self.spatial_learning = enabled;
        self
    }

    pub fn with_temporal_learning(mut self, enabled: bool) -> Self {
        self.temporal_learning = enabled;
        self
    }

    pub fn with_config(mut self, config: RegionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn is_hardcoded(&self) -> bool {
        matches!(self.topology, SpatialTopology::Hardcoded)
    }

    /// Dimensions of the column grid as `(width, height)`.
    pub fn column_dimensions(&self) -> (usize, usize) {
        match self.topology {
            SpatialTopology::Hardcoded => (self.input_width, self.input_height),
            SpatialTopology::Parameterized {
                column_width,
                column_height,
            } => (column_width, column_height),
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.input_width * self.input_height
    }

    /// Distance between two neighboring columns measured in input bits, as `(x, y)`.
    /// `(1, 1)` for a hardcoded region.
    pub fn input_spacing(&self) -> (f32, f32) {
        if self.is_hardcoded() {
            return (1.0, 1.0);
        }

        let (width, height) = self.column_dimensions();
        (
            self.input_width.saturating_sub(1) as f32 / width.saturating_sub(1).max(1) as f32,
            self.input_height.saturating_sub(1) as f32 / height.saturating_sub(1).max(1) as f32,
        )
    }

    /// Locality radius measured in input bits.
    pub fn input_radius(&self) -> f32 {
        self.locality_radius as f32 * self.input_spacing().0
    }

    /// Number of input bits each proximal segment samples. 0 for a hardcoded region.
    pub fn proximal_synapses_per_segment(&self) -> usize {
        if self.is_hardcoded() {
            return 0;
        }

        if self.locality_radius == 0 {
            (self.num_inputs() as f32 * self.pct_input_per_column).round() as usize
        } else {
            let radius = self.input_radius();
            (radius * radius * self.pct_input_per_column).round() as usize
        }
    }

    /// Checks every hyperparameter and tuning constant.
    pub fn validate(&self) -> Result<()> {
        positive("input_width", self.input_width)?;
        positive("input_height", self.input_height)?;

        let (width, height) = self.column_dimensions();
        positive("column_width", width)?;
        positive("column_height", height)?;

        positive("cells_per_column", self.cells_per_column)?;
        positive("seg_active_threshold", self.seg_active_threshold)?;
        positive("new_synapse_count", self.new_synapse_count)?;

        if !self.is_hardcoded() {
            fraction("pct_input_per_column", self.pct_input_per_column)?;
            fraction("pct_min_overlap", self.pct_min_overlap)?;
            fraction("pct_local_activity", self.pct_local_activity)?;

            if self.proximal_synapses_per_segment() == 0 {
                return Err(invalid(
                    "pct_input_per_column",
                    format!(
                        "{} leaves no proximal synapse per column",
                        self.pct_input_per_column
                    ),
                ));
            }
        }

        self.config.validate()
    }
}

impl RegionConfig {
    pub fn validate(&self) -> Result<()> {
        let p = &self.permanence;

        if !(p.min >= 0.0 && p.min < p.max && p.max <= 1.0) {
            return Err(invalid(
                "permanence",
                format!("bounds must satisfy 0 <= min < max <= 1, got [{}, {}]", p.min, p.max),
            ));
        }
        for (name, value) in [("connected", p.connected), ("initial", p.initial)] {
            if !(p.min..=p.max).contains(&value) {
                return Err(invalid(name, format!("{value} lies outside [{}, {}]", p.min, p.max)));
            }
        }
        for (name, value) in [("increment", p.increment), ("decrement", p.decrement)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(name, format!("{value} must lie in (0, 1]")));
            }
        }

        fraction("ema_alpha", self.ema_alpha)?;
        fraction("min_duty_cycle_fraction", self.min_duty_cycle_fraction)?;
        if self.boost_growth < 1.0 {
            return Err(invalid("boost_growth", format!("{} must be at least 1", self.boost_growth)));
        }

        positive("max_prediction_steps", self.max_prediction_steps)?;
        if let Some(cap) = self.max_segments_per_cell {
            positive("max_segments_per_cell", cap)?;
        }
        if let Some(cap) = self.max_synapses_per_segment {
            positive("max_synapses_per_segment", cap)?;
        }

        Ok(())
    }
}

fn invalid(name: &'static str, message: String) -> HtmError {
    HtmError::InvalidParameter { name, message }
}

fn positive(name: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(invalid(name, "must be greater than 0".to_string()));
    }
    Ok(())
}

fn fraction(name: &'static str, value: f32) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid(name, format!("{value} must lie in (0, 1]")));
    }
    Ok(())
}
