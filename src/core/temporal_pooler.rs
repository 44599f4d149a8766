//! Temporal pooling learns transitions between the active column sets produced by spatial pooling.
//!
//! How it works:
//! - Phase 1 looks at active columns only. Cells that were predicted at `t-1` through a sequence
//!   segment become active ("bottom-up predicted"). If no cell was predicted the column bursts and
//!   every cell becomes active. If no cell became learning through a segment that was driven by
//!   learning cells, the best matching cell is chosen to learn, and it queues an update that grows
//!   or extends a sequence segment towards the cells that were learning at `t-1`.
//! - Phase 2 looks at every cell. Segments are evaluated against the new activity and a cell with
//!   an active segment enters the predicting state. With learning on, it queues reinforcement of the
//!   active segment that predicts soonest, and an update for a segment that could have predicted
//!   this one step earlier (one more prediction step).
//! - Phase 3 applies the queued updates: positively for learning cells, negatively for cells that
//!   stopped predicting without becoming active through learning. Every queue is emptied.
//!
//! Within a phase every column only mutates itself and reads other columns through the `Activity`
//! snapshot, so each phase may be fanned out across columns. The snapshot is refreshed between
//! phase 1 and phase 2, which is the only point where other columns' new state becomes visible.

use super::{
    activity::Activity,
    column::Column,
    config::{RegionParams, Scheduler},
    region::Region,
    segment_update::{SegmentUpdateInfo, TimeRef, UpdateContext},
};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::trace;

/// Runs `op` on every column, in parallel if the scheduler asks for it and the `parallel`
/// feature is enabled.
pub(crate) fn fan_out<F>(columns: &mut [Column], scheduler: Scheduler, op: F)
where
    F: Fn(&mut Column) + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        if scheduler == Scheduler::Parallel {
            columns.par_iter_mut().for_each(op);
            return;
        }
    }

    #[cfg(not(feature = "parallel"))]
    let _ = scheduler;

    columns.iter_mut().for_each(op);
}

impl Region {
    /// Runs `op` on every column using the configured scheduler.
    pub(crate) fn for_each_column<F>(&mut self, op: F)
    where
        F: Fn(&mut Column) + Send + Sync,
    {
        fan_out(&mut self.columns, self.params.scheduler, op);
    }

    /// Runs the three temporal pooling phases.
    pub fn perform_temporal_pooling(&mut self) {
        let params = &self.params;
        let activity = &self.activity;
        fan_out(&mut self.columns, params.scheduler, |column| {
            activate_cells(column, params, activity)
        });

        self.activity.capture(&self.columns);

        let params = &self.params;
        let activity = &self.activity;
        fan_out(&mut self.columns, params.scheduler, |column| {
            predict_cells(column, params, activity)
        });

        if params.temporal_learning {
            fan_out(&mut self.columns, params.scheduler, |column| {
                apply_updates(column, params)
            });
        }
    }
}

/// Phase 1: decide the active and learning cells of an active column.
fn activate_cells(column: &mut Column, params: &RegionParams, activity: &Activity) {
    if !column.is_active {
        return;
    }

    let learning = params.temporal_learning;
    let mut bottom_up_predicted = false;
    let mut learning_chosen = false;

    for cell in column.cells.iter_mut().filter(|cell| cell.was_predicted) {
        let Some(s) = cell.previous_active_segment() else {
            continue;
        };

        let segment = &cell.segments[s];
        if !segment.is_sequence {
            continue;
        }

        let from_learning = learning && segment.was_active_from_learning(activity);

        bottom_up_predicted = true;
        cell.is_active = true;

        if from_learning {
            learning_chosen = true;
            cell.is_learning = true;
        }
    }

    if !bottom_up_predicted {
        trace!(column = column.index, "bursting");
        for cell in column.cells.iter_mut() {
            cell.is_active = true;
        }
    }

    if learning && !learning_chosen {
        let min_count = params.config.min_synapses_per_segment_threshold;
        let (best, segment) = column.best_matching_cell(1, TimeRef::Previous, min_count);

        let ctx = UpdateContext {
            activity,
            column: column.index,
            locality_radius: params.locality_radius,
            new_synapse_count: params.new_synapse_count,
        };

        let Column { cells, rng, .. } = column;
        let cell = &mut cells[best];
        cell.is_learning = true;

        let info = SegmentUpdateInfo::new(&cell.segments, segment, TimeRef::Previous, true, 1, &ctx, rng);
        cell.pending.push(info);
    }
}

/// Phase 2: evaluate distal segments and queue the reinforcement of predicting cells.
fn predict_cells(column: &mut Column, params: &RegionParams, activity: &Activity) {
    let config = &params.config;
    let ctx = UpdateContext {
        activity,
        column: column.index,
        locality_radius: params.locality_radius,
        new_synapse_count: params.new_synapse_count,
    };

    let Column { cells, rng, .. } = column;

    for cell in cells.iter_mut() {
        for segment in cell.segments.iter_mut() {
            segment.process(activity, config.permanence.connected);
        }

        if !cell.segments.iter().any(|segment| segment.is_active) {
            continue;
        }

        let soonest = cell.set_predicting(true, config.max_prediction_steps);

        if !params.temporal_learning {
            continue;
        }

        if let Some(s) = soonest {
            let steps = cell.segments[s].prediction_steps;
            let info = SegmentUpdateInfo::new(&cell.segments, Some(s), TimeRef::Now, false, steps, &ctx, rng);
            cell.pending.push(info);
        }

        let steps = cell.prediction_steps + 1;
        let matching = cell
            .best_matching_segment(steps, TimeRef::Previous, config.min_synapses_per_segment_threshold)
            .map(|(s, _)| s);

        let info = SegmentUpdateInfo::new(&cell.segments, matching, TimeRef::Previous, true, steps, &ctx, rng);
        cell.pending.push(info);
    }
}

/// Phase 3: apply or discard every cell's queued updates.
fn apply_updates(column: &mut Column, params: &RegionParams) {
    for cell in column.cells.iter_mut() {
        if cell.is_learning {
            cell.apply_segment_updates(true, params.seg_active_threshold, &params.config);
        } else if !cell.is_predicting && cell.was_predicted {
            cell.apply_segment_updates(false, params.seg_active_threshold, &params.config);
        } else {
            cell.pending.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{config::RegionParams, region::Region};

    fn step(region: &mut Region, active: &[usize]) {
        let mut input = vec![false; region.input.len()];
        for &i in active {
            input[i] = true;
        }
        region.update_input(&input).unwrap();
        region.run_once();
    }

    #[test]
    fn unpredicted_column_bursts() {
        let mut region = Region::new(RegionParams::hardcoded(4, 1, 3, 1, 2)).unwrap();
        step(&mut region, &[1]);

        let column = &region.columns[1];
        assert!(column.cells.iter().all(|cell| cell.is_active));
        assert_eq!(column.cells.iter().filter(|cell| cell.is_learning).count(), 1);
        assert!(region.columns[0].cells.iter().all(|cell| !cell.is_active));
    }

    #[test]
    fn queues_are_empty_after_each_step() {
        let mut region = Region::new(RegionParams::hardcoded(6, 1, 2, 1, 2)).unwrap();
        for i in 0..12 {
            step(&mut region, &[i % 6, (i + 1) % 6]);
            assert!(region.cells().all(|cell| cell.pending.is_empty()));
        }
    }

    #[test]
    fn learned_transition_predicts_next_column() {
        let mut region = Region::new(RegionParams::hardcoded(4, 1, 1, 1, 1)).unwrap();
        for _ in 0..3 {
            step(&mut region, &[0]);
            step(&mut region, &[2]);
        }

        step(&mut region, &[0]);
        assert!(region.columns[2].cells[0].is_predicting);
        assert_eq!(region.column_predictions()[2], 1);
    }

    #[test]
    fn no_learning_grows_nothing() {
        let params = RegionParams::hardcoded(4, 1, 1, 1, 1).with_temporal_learning(false);
        let mut region = Region::new(params).unwrap();
        for i in 0..8 {
            step(&mut region, &[i % 4]);
        }

        assert_eq!(region.num_region_segments(0), 0);
        assert!(region.cells().all(|cell| !cell.is_learning));
    }
}
