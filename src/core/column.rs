//! A `Column` in HTM represents one feature detector or receptive field in the region.
//!
//! Biological inspiration:
//! Columns in HTM are inspired by cortical mini-columns found in the brain.
//! They consist of a group of neurons, which in HTM are modeled as "cells".
//!
//! Meaning in HTM:
//! Each column receives input from a random subset of the input space through the synapses of its
//! single proximal segment, computes its overlap score with the current input, and competes with
//! its neighbors (inhibition within a radius) to become active. Active columns then hand over to
//! their cells, which decide in which temporal context the input occurred.
//!
//! What are duty cycles?
//! - They are exponential moving averages of how often a column meets certain criteria.
//! - The active duty cycle tracks how often the column wins the inhibition.
//! - The overlap duty cycle tracks how often its overlap exceeds the minimum overlap.
//! - A column whose active duty cycle falls behind its neighbors gets its overlap boosted, and a
//!   column whose overlap duty cycle falls behind gets all of its proximal permanences raised.
//!
//! A column only ever mutates its own cells, segments and synapses. Everything it needs to know
//! about other columns is read from the region's `Activity` snapshot, which makes columns
//! independent within a temporal pooling phase. Each column owns its random generator so that
//! sampling does not depend on the order in which columns are processed.

use super::{
    activity::Activity,
    cell::Cell,
    config::RegionConfig,
    segment::Segment,
    segment_update::TimeRef,
};
use rand::rngs::StdRng;

#[derive(Debug, Clone)]
pub struct Column {
    /// The index of the column in the column grid.
    pub index: usize,

    /// Position in the column grid.
    pub cx: usize,
    pub cy: usize,

    /// Position in the input grid this column is centered on.
    pub ix: usize,
    pub iy: usize,

    pub cells: Vec<Cell>,

    /// Feed-forward segment wired to input bits.
    pub proximal: Segment,

    /// Boosted overlap of the current step.
    pub overlap: usize,

    pub boost: f32,
    pub active_duty_cycle: f32,
    pub overlap_duty_cycle: f32,

    pub is_active: bool,

    /// Random generator for candidate sampling of this column's cells.
    pub rng: StdRng,
}

impl Column {
    /// Creates a new column with `cells_per_column` cells and an empty proximal segment.
    pub fn new(
        index: usize,
        cx: usize,
        cy: usize,
        ix: usize,
        iy: usize,
        cells_per_column: usize,
        rng: StdRng,
    ) -> Self {
        Self {
            index,
            cx,
            cy,
            ix,
            iy,
            cells: (0..cells_per_column).map(Cell::new).collect(),
            proximal: Segment::new(1),
            overlap: 0,
            boost: 1.0,
            active_duty_cycle: 1.0,
            overlap_duty_cycle: 1.0,
            is_active: false,
            rng,
        }
    }

    pub fn next_time_step(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.next_time_step();
        }
        self.proximal.next_time_step();
    }

    /// Counts the connected active proximal synapses. Counts below `min_overlap` are zeroed,
    /// others are multiplied by the boost and truncated.
    pub fn compute_overlap(&mut self, activity: &Activity, min_overlap: f32, connected: f32) {
        self.proximal.process(activity, connected);

        let overlap = self.proximal.active_connected;
        self.overlap = if (overlap as f32) < min_overlap {
            0
        } else {
            (overlap as f32 * self.boost) as usize
        };
    }

    /// Reinforces the proximal synapses of a winning column.
    #[inline]
    pub fn update_permanences(&mut self, activity: &Activity, config: &RegionConfig) {
        self.proximal.adapt_permanences(activity, &config.permanence);
    }

    /// Updates both duty cycles and the boost.
    ///
    /// `max_neighbor_duty` is the highest active duty cycle among the columns within the inhibition
    /// radius. A column falling below a fraction of it gets boosted, and if its overlap duty cycle
    /// falls below the same threshold all its proximal permanences are raised.
    pub fn perform_boosting(&mut self, max_neighbor_duty: f32, min_overlap: f32, config: &RegionConfig) {
        let min_duty_cycle = config.min_duty_cycle_fraction * max_neighbor_duty;
        let alpha = config.ema_alpha;

        self.active_duty_cycle = (1.0 - alpha) * self.active_duty_cycle;
        if self.is_active {
            self.active_duty_cycle += alpha;
        }

        self.boost = if self.active_duty_cycle > min_duty_cycle {
            1.0
        } else if self.active_duty_cycle == 0.0 {
            self.boost * config.boost_growth
        } else {
            min_duty_cycle / self.active_duty_cycle
        };

        self.overlap_duty_cycle = (1.0 - alpha) * self.overlap_duty_cycle;
        if self.overlap as f32 > min_overlap {
            self.overlap_duty_cycle += alpha;
        }

        if self.overlap_duty_cycle < min_duty_cycle {
            self.proximal.increase_all_permanences(&config.permanence);
        }
    }

    /// The cell whose best matching segment has the most active synapses at `time`, together with
    /// that segment. Without any match, the cell with the fewest segments (the first on ties).
    pub fn best_matching_cell(
        &self,
        prediction_steps: usize,
        time: TimeRef,
        min_count: usize,
    ) -> (usize, Option<usize>) {
        let mut best: Option<(usize, usize)> = None;
        let mut best_count = 0;

        for (i, cell) in self.cells.iter().enumerate() {
            if let Some((segment, count)) = cell.best_matching_segment(prediction_steps, time, min_count) {
                if count > best_count {
                    best_count = count;
                    best = Some((i, segment));
                }
            }
        }

        match best {
            Some((cell, segment)) => (cell, Some(segment)),
            None => {
                let fewest = self
                    .cells
                    .iter()
                    .enumerate()
                    .min_by_key(|(i, cell)| (cell.segments.len(), *i))
                    .map_or(0, |(i, _)| i);
                (fewest, None)
            }
        }
    }

    /// Overlap as a fraction of the number of proximal synapses.
    #[inline]
    pub fn overlap_percentage(&self) -> f32 {
        self.overlap as f32 / self.proximal.synapses.len().max(1) as f32
    }

    /// Fewest prediction steps among the predicting cells, 0 if no cell is predicting.
    pub fn prediction_steps(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.is_predicting)
            .map(|cell| cell.prediction_steps)
            .min()
            .unwrap_or(0)
    }
}
