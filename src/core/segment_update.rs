//! Deferred segment changes.
//!
//! Temporal pooling decides which segments to reinforce in phases 1 and 2 but only applies those
//! decisions in phase 3, once it knows whether the owning cell is learning. A `SegmentUpdateInfo`
//! records such a decision:
//! - the segment to change (or none, meaning "grow a new one"),
//! - a snapshot of the segment's active synapses at the time the decision was made,
//! - a random sample of cells that were learning at `t-1`, to grow new synapses towards.
//!
//! The sample is drawn from cells in other columns that lie within the locality radius and that
//! the segment is not yet connected to, so a segment never holds two synapses from one source.

use super::{
    activity::Activity,
    cell::CellAddress,
    config::RegionConfig,
    segment::Segment,
    synapses::SynapseSource,
};
use rand::{seq::IndexedRandom, Rng};
use tracing::trace;

/// Which time step a segment's activity is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRef {
    Now,
    Previous,
}

/// Read-only context needed to build an update for a cell in column `column`.
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext<'a> {
    pub activity: &'a Activity,
    pub column: usize,
    pub locality_radius: usize,
    pub new_synapse_count: usize,
}

/// A pending change to one of a cell's distal segments.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentUpdateInfo {
    /// Index of the target segment on the owning cell, `None` for a new segment.
    pub segment: Option<usize>,

    /// Connected synapses of the target segment that were active when the update was made.
    pub active_synapses: Vec<usize>,

    /// Cells to grow new synapses towards.
    pub learning_cells: Vec<CellAddress>,

    pub add_new_synapses: bool,

    /// Prediction horizon given to the segment if this update creates it.
    pub prediction_steps: usize,
}

impl SegmentUpdateInfo {
    /// Snapshots the target segment and samples the learning cells to connect to.
    pub fn new<R: Rng>(
        segments: &[Segment],
        segment: Option<usize>,
        time: TimeRef,
        add_new_synapses: bool,
        prediction_steps: usize,
        ctx: &UpdateContext,
        rng: &mut R,
    ) -> Self {
        let target = segment.and_then(|i| segments.get(i));

        let active_synapses: Vec<usize> = match (target, time) {
            (Some(seg), TimeRef::Now) => seg.active_synapses(ctx.activity, true).collect(),
            (Some(seg), TimeRef::Previous) => seg.prev_active_synapses(ctx.activity, true).collect(),
            (None, _) => Vec::new(),
        };

        let learning_cells = if add_new_synapses {
            let existing = target.map(Segment::sources).unwrap_or_default();

            let pool: Vec<CellAddress> = ctx
                .activity
                .learning_candidates(ctx.column, ctx.locality_radius)
                .filter(|&cell| !existing.contains(&SynapseSource::Cell(cell)))
                .collect();

            let wanted = match target {
                Some(_) => ctx.new_synapse_count.saturating_sub(active_synapses.len()),
                None => ctx.new_synapse_count,
            };
            let count = wanted.min(pool.len());

            if count > 0 {
                pool.choose_multiple(rng, count).copied().collect()
            } else {
                Vec::new()
            }
        } else {
            Vec::new()
        };

        Self {
            segment: target.and(segment),
            active_synapses,
            learning_cells,
            add_new_synapses,
            prediction_steps,
        }
    }

    /// Applies this update to the owning cell's segments.
    ///
    /// With positive reinforcement the snapshotted synapses are increased and all others decreased,
    /// otherwise only the snapshotted synapses are decreased. New synapses (and a new segment if
    /// there is no target) are only grown with positive reinforcement.
    pub fn apply(
        &self,
        segments: &mut Vec<Segment>,
        positive: bool,
        threshold: usize,
        config: &RegionConfig,
    ) {
        let options = &config.permanence;
        let grow = self.add_new_synapses && positive && !self.learning_cells.is_empty();

        if let Some(segment) = self.segment.and_then(|i| segments.get_mut(i)) {
            if positive {
                segment.update_permanences(&self.active_synapses, options);
            } else {
                segment.decrease_permanences(&self.active_synapses, options);
            }

            if grow {
                segment.create_synapses_to_learning_cells(
                    &self.learning_cells,
                    options.initial,
                    config.max_synapses_per_segment,
                );
            }
            return;
        }

        if !grow {
            return;
        }

        if let Some(cap) = config.max_segments_per_cell {
            if segments.len() >= cap {
                trace!(cap, "segment limit reached, not growing a new segment");
                return;
            }
        }

        let mut segment = Segment::distal(threshold, self.prediction_steps, config.max_prediction_steps);
        segment.create_synapses_to_learning_cells(
            &self.learning_cells,
            options.initial,
            config.max_synapses_per_segment,
        );
        trace!(
            steps = segment.prediction_steps,
            synapses = segment.synapses.len(),
            "new distal segment"
        );
        segments.push(segment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::topology::Topology;
    use rand::{rngs::StdRng, SeedableRng};

    /// Four columns in a row, one cell each, all of them learning at `t-1`.
    fn all_learning() -> Activity {
        Activity::from_flags(
            Topology::new(4, 1),
            1,
            &[false; 4],
            &[true; 4],
            &[true; 4],
            &[],
        )
    }

    fn ctx(activity: &Activity, column: usize, new_synapse_count: usize) -> UpdateContext<'_> {
        UpdateContext {
            activity,
            column,
            locality_radius: 0,
            new_synapse_count,
        }
    }

    #[test]
    fn sampling_skips_own_column() {
        let activity = all_learning();
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..20 {
            let info = SegmentUpdateInfo::new(
                &[],
                None,
                TimeRef::Previous,
                true,
                1,
                &ctx(&activity, 2, 10),
                &mut rng,
            );
            assert_eq!(info.learning_cells.len(), 3);
            assert!(info.learning_cells.iter().all(|cell| cell.col != 2));
        }
    }

    #[test]
    fn sampling_skips_existing_sources() {
        let activity = all_learning();
        let mut rng = StdRng::seed_from_u64(2);

        let mut seg = Segment::distal(1, 1, 10);
        seg.create_synapse(SynapseSource::Cell(CellAddress { col: 1, cell: 0 }), 0.1);

        let info = SegmentUpdateInfo::new(
            &[seg],
            Some(0),
            TimeRef::Previous,
            true,
            1,
            &ctx(&activity, 0, 10),
            &mut rng,
        );

        assert_eq!(info.segment, Some(0));
        let mut cols: Vec<usize> = info.learning_cells.iter().map(|cell| cell.col).collect();
        cols.sort_unstable();
        assert_eq!(cols, vec![2, 3]);
    }

    #[test]
    fn locality_restricts_candidates() {
        let activity = all_learning();
        let mut rng = StdRng::seed_from_u64(3);
        let context = UpdateContext {
            locality_radius: 1,
            ..ctx(&activity, 0, 10)
        };

        let info = SegmentUpdateInfo::new(&[], None, TimeRef::Previous, true, 1, &context, &mut rng);
        assert_eq!(info.learning_cells, vec![CellAddress { col: 1, cell: 0 }]);
    }

    #[test]
    fn active_synapses_reduce_sample_size() {
        let activity = all_learning();
        let mut rng = StdRng::seed_from_u64(4);

        // Connected at t-1 and its source was active, so it counts towards the new synapse count.
        let mut seg = Segment::distal(1, 1, 10);
        seg.create_synapse(SynapseSource::Cell(CellAddress { col: 1, cell: 0 }), 0.5);
        seg.synapses[0].was_connected = true;

        let info = SegmentUpdateInfo::new(
            &[seg],
            Some(0),
            TimeRef::Previous,
            true,
            1,
            &ctx(&activity, 0, 2),
            &mut rng,
        );

        assert_eq!(info.active_synapses, vec![0]);
        assert_eq!(info.learning_cells.len(), 1);
    }

    #[test]
    fn positive_apply_creates_a_segment() {
        let config = RegionConfig::default();
        let info = SegmentUpdateInfo {
            segment: None,
            active_synapses: Vec::new(),
            learning_cells: vec![CellAddress { col: 1, cell: 0 }, CellAddress { col: 2, cell: 0 }],
            add_new_synapses: true,
            prediction_steps: 3,
        };

        let mut segments = Vec::new();
        info.apply(&mut segments, false, 2, &config);
        assert!(segments.is_empty());

        info.apply(&mut segments, true, 2, &config);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].prediction_steps, 3);
        assert_eq!(segments[0].threshold, 2);
        assert!(segments[0]
            .synapses
            .iter()
            .all(|syn| syn.permanence == config.permanence.initial));
    }

    #[test]
    fn empty_sample_grows_nothing() {
        let config = RegionConfig::default();
        let info = SegmentUpdateInfo {
            segment: None,
            active_synapses: Vec::new(),
            learning_cells: Vec::new(),
            add_new_synapses: true,
            prediction_steps: 1,
        };

        let mut segments = Vec::new();
        info.apply(&mut segments, true, 1, &config);
        assert!(segments.is_empty());
    }

    #[test]
    fn segment_cap_refuses_growth() {
        let config = RegionConfig {
            max_segments_per_cell: Some(1),
            ..RegionConfig::default()
        };
        let info = SegmentUpdateInfo {
            segment: None,
            active_synapses: Vec::new(),
            learning_cells: vec![CellAddress { col: 1, cell: 0 }],
            add_new_synapses: true,
            prediction_steps: 1,
        };

        let mut segments = Vec::new();
        info.apply(&mut segments, true, 1, &config);
        info.apply(&mut segments, true, 1, &config);
        assert_eq!(segments.len(), 1);
    }
}
