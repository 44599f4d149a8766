//! A `Cell` is one processing unit within a column. Cells of the same column share the column's
//! feed-forward input but represent that input in different temporal contexts.
//!
//! Each cell owns a list of distal segments and a queue of pending segment updates. Its state is
//! double buffered: `is_*` describes the current step and `was_*` the previous one.
//!
//! State transitions per step:
//! - `next_time_step` rotates current into previous and clears current.
//! - Temporal pooling phase 1 may set `is_active` and `is_learning`.
//! - Phase 2 sets `is_predicting` (and `prediction_steps`) if any segment is active.
//! - Phase 3 applies or discards the pending updates.

use super::{
    config::RegionConfig,
    segment::Segment,
    segment_update::{SegmentUpdateInfo, TimeRef},
};
use serde::{Deserialize, Serialize};

/// Represents an address that uniquely identifies a cell by its column and cell indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    pub col: usize,
    pub cell: usize,
}

#[derive(Debug, Clone)]
pub struct Cell {
    /// Position of the cell within its column.
    pub index: usize,

    pub is_active: bool,
    pub was_active: bool,
    pub is_predicting: bool,
    pub was_predicted: bool,
    pub is_learning: bool,
    pub was_learning: bool,

    /// Fewest steps ahead any active segment predicts. Only meaningful while predicting.
    pub prediction_steps: usize,

    pub segments: Vec<Segment>,
    pub pending: Vec<SegmentUpdateInfo>,
}

impl Cell {
    #[inline]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            is_active: false,
            was_active: false,
            is_predicting: false,
            was_predicted: false,
            is_learning: false,
            was_learning: false,
            prediction_steps: 0,
            segments: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn next_time_step(&mut self) {
        self.was_active = self.is_active;
        self.was_predicted = self.is_predicting;
        self.was_learning = self.is_learning;
        self.is_active = false;
        self.is_predicting = false;
        self.is_learning = false;

        for segment in self.segments.iter_mut() {
            segment.next_time_step();
        }
    }

    /// Enters or leaves the predicting state. On entering, caches the fewest prediction steps among
    /// the active segments and returns the index of the segment that supplied it.
    pub fn set_predicting(&mut self, predicting: bool, max_steps: usize) -> Option<usize> {
        self.is_predicting = predicting;
        if !predicting {
            return None;
        }

        let best = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, seg)| seg.is_active)
            .min_by_key(|(i, seg)| (seg.prediction_steps, *i));

        self.prediction_steps = best.map_or(max_steps, |(_, seg)| seg.prediction_steps);
        best.map(|(i, _)| i)
    }

    /// A segment that was active at `t-1`. Sequence segments are preferred, then the segment with
    /// the most connected active synapses. The first one wins ties.
    pub fn previous_active_segment(&self) -> Option<usize> {
        let mut best: Option<(usize, bool, usize)> = None;

        for (i, seg) in self.segments.iter().enumerate() {
            if !seg.was_active {
                continue;
            }

            let better = match best {
                None => true,
                Some((_, best_sequence, best_count)) => {
                    (seg.is_sequence && !best_sequence)
                        || (seg.is_sequence == best_sequence && seg.prev_active_connected > best_count)
                }
            };

            if better {
                best = Some((i, seg.is_sequence, seg.prev_active_connected));
            }
        }

        best.map(|(i, _, _)| i)
    }

    /// Among the segments predicting exactly `prediction_steps` ahead, the one with the most active
    /// synapses at `time`, counting unconnected synapses too. The count has to exceed `min_count`.
    /// Returns the segment index and its count.
    pub fn best_matching_segment(
        &self,
        prediction_steps: usize,
        time: TimeRef,
        min_count: usize,
    ) -> Option<(usize, usize)> {
        let mut best = None;
        let mut best_count = min_count;

        for (i, seg) in self.segments.iter().enumerate() {
            if seg.prediction_steps != prediction_steps {
                continue;
            }

            let count = match time {
                TimeRef::Now => seg.active_synapse_count(false),
                TimeRef::Previous => seg.prev_active_synapse_count(false),
            };

            if count > best_count {
                best_count = count;
                best = Some((i, count));
            }
        }

        best
    }

    /// Appends a segment and returns its index.
    #[inline]
    pub fn create_segment(&mut self, segment: Segment) -> usize {
        self.segments.push(segment);
        self.segments.len() - 1
    }

    /// Number of segments predicting exactly `prediction_steps` ahead, or all of them if 0.
    pub fn num_segments_with_steps(&self, prediction_steps: usize) -> usize {
        self.segments
            .iter()
            .filter(|seg| prediction_steps == 0 || seg.prediction_steps == prediction_steps)
            .count()
    }

    /// Applies every pending update, positively or negatively, and empties the queue.
    pub fn apply_segment_updates(&mut self, positive: bool, threshold: usize, config: &RegionConfig) {
        for info in std::mem::take(&mut self.pending) {
            info.apply(&mut self.segments, positive, threshold, config);
        }
    }

    /// Active or predicting.
    #[inline]
    pub fn output(&self) -> bool {
        self.is_active || self.is_predicting
    }
}
