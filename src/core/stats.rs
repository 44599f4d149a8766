//! Structural statistics of a region: how many distal segments and synapses it has grown, split by
//! sequence and non-sequence segments, and how many updates are waiting in the cells' queues.

use super::{
    region::{Accuracy, Region},
    segment::Segment,
};
use serde::{Deserialize, Serialize};

/// Total, mean, median and maximum of a list of counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CountSummary {
    pub total: usize,
    pub mean: f32,
    pub median: f32,
    pub max: usize,
}

impl CountSummary {
    pub fn from_counts(mut counts: Vec<usize>) -> Self {
        if counts.is_empty() {
            return Self::default();
        }

        counts.sort_unstable();
        let n = counts.len();
        let total: usize = counts.iter().sum();
        let median = if n % 2 == 0 {
            (counts[n / 2 - 1] + counts[n / 2]) as f32 / 2.0
        } else {
            counts[n / 2] as f32
        };

        Self {
            total,
            mean: total as f32 / n as f32,
            median,
            max: counts[n - 1],
        }
    }
}

/// Segments per cell and synapses per segment for one class of distal segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentStats {
    pub segments_per_cell: CountSummary,
    pub synapses_per_segment: CountSummary,
}

impl SegmentStats {
    fn collect<F>(region: &Region, keep: F) -> Self
    where
        F: Fn(&Segment) -> bool,
    {
        let segments_per_cell = region
            .cells()
            .map(|cell| cell.segments.iter().filter(|seg| keep(*seg)).count())
            .collect();

        let synapses_per_segment = region
            .cells()
            .flat_map(|cell| cell.segments.iter())
            .filter(|seg| keep(*seg))
            .map(|seg| seg.synapses.len())
            .collect();

        Self {
            segments_per_cell: CountSummary::from_counts(segments_per_cell),
            synapses_per_segment: CountSummary::from_counts(synapses_per_segment),
        }
    }
}

/// A snapshot of a region's learned structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub iterations: u64,
    pub all: SegmentStats,
    pub sequence: SegmentStats,
    pub non_sequence: SegmentStats,
    pub pending_updates: usize,
    pub active_columns: usize,
    pub accuracy: Accuracy,
}

impl Region {
    pub fn stats(&self) -> RegionStats {
        RegionStats {
            iterations: self.iterations(),
            all: SegmentStats::collect(self, |_| true),
            sequence: SegmentStats::collect(self, |seg| seg.is_sequence),
            non_sequence: SegmentStats::collect(self, |seg| !seg.is_sequence),
            pending_updates: self.cells().map(|cell| cell.pending.len()).sum(),
            active_columns: self.num_active_columns(),
            accuracy: self.last_accuracy(),
        }
    }
}
