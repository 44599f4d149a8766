//! End-to-end behaviour of hardcoded and parameterized regions.
//!
//! Run with: `cargo test --test region_behaviour`

use cla_region::prelude::*;
use cla_region::core::synapses::SynapseSource;

fn bits(size: usize, active: impl IntoIterator<Item = usize>) -> Vec<bool> {
    let mut input = vec![false; size];
    for i in active {
        input[i] = true;
    }
    input
}

#[test]
fn two_column_region_grows_one_synapse() {
    let mut region = Region::new(RegionParams::hardcoded(2, 1, 1, 1, 1)).unwrap();

    region.update_input(&[true, false]).unwrap();
    region.next_time_step();
    region.perform_spatial_pooling();

    assert!(region.columns[0].is_active);
    assert!(!region.columns[1].is_active);

    region.perform_temporal_pooling();

    let cell0 = &region.columns[0].cells[0];
    let cell1 = &region.columns[1].cells[0];
    assert!(cell0.is_active && cell0.is_learning);
    assert!(!cell1.is_active && !cell1.is_learning);

    region.update_input(&[false, true]).unwrap();
    region.run_once();

    let cell1 = &region.columns[1].cells[0];
    assert_eq!(cell1.segments.len(), 1);
    assert_eq!(cell1.segments[0].synapses.len(), 1);
    assert_eq!(
        cell1.segments[0].synapses[0].source,
        SynapseSource::Cell(CellAddress { col: 0, cell: 0 })
    );
    assert!(cell1.segments[0].is_sequence);
    assert!(region.columns[0].cells[0].segments.is_empty());
}

#[test]
fn repeating_sequence_reaches_full_accuracy() {
    let mut region = Region::new(RegionParams::hardcoded(250, 1, 1, 3, 4)).unwrap();
    let patterns: Vec<Vec<bool>> = (0..10).map(|i| bits(250, i * 25..(i + 1) * 25)).collect();

    for k in 0..5 {
        for (i, pattern) in patterns.iter().enumerate() {
            region.update_input(pattern).unwrap();
            region.run_once();

            let accuracy = region.last_accuracy();
            if k == 0 || (k == 1 && i == 0) {
                assert_eq!(accuracy, Accuracy::default(), "cycle {k} step {i}");
            } else {
                assert_eq!(accuracy.activation, 1.0, "cycle {k} step {i}");
                assert_eq!(accuracy.prediction, 1.0, "cycle {k} step {i}");
            }
        }
    }

    // Every column learned exactly one sequence segment towards the previous pattern.
    assert_eq!(region.num_region_segments(1), 250);
    assert_eq!(region.num_region_segments(0), 250);
    for column in &region.columns {
        let segment = &column.cells[0].segments[0];
        let previous_pattern = (column.index / 25 + 9) % 10;
        assert!(segment.synapses.iter().all(|syn| match syn.source {
            SynapseSource::Cell(address) => address.col / 25 == previous_pattern,
            SynapseSource::Input(_) => false,
        }));
    }

    let stats = region.stats();
    assert_eq!(stats.sequence.segments_per_cell.total, 250);
    assert_eq!(stats.non_sequence.segments_per_cell.total, 0);
    assert_eq!(stats.all.synapses_per_segment.max, 4);
    assert_eq!(stats.pending_updates, 0);
}

#[test]
fn predictions_point_at_next_pattern() {
    let mut region = Region::new(RegionParams::hardcoded(40, 1, 2, 2, 3)).unwrap();
    let patterns: Vec<Vec<bool>> = (0..4).map(|i| bits(40, i * 10..(i + 1) * 10)).collect();

    for _ in 0..6 {
        for pattern in &patterns {
            region.update_input(pattern).unwrap();
            region.run_once();
        }
    }

    // After the last pattern, the first one is expected next.
    let predictions = region.column_predictions();
    assert!(predictions[..10].iter().all(|&steps| steps == 1));
    assert!(predictions[10..].iter().all(|&steps| steps == 0));

    let output = region.cell_output();
    assert_eq!(output.len(), region.num_cells());
    assert!(output[60..80].iter().any(|&on| on));
}

#[test]
fn quiet_input_reports_zero_accuracy() {
    let mut region = Region::new(RegionParams::hardcoded(16, 1, 2, 1, 2)).unwrap();
    for _ in 0..3 {
        region.run_once();
        assert_eq!(region.last_accuracy(), Accuracy::default());
    }
}

#[test]
fn distal_segments_never_duplicate_or_self_connect() {
    let params = RegionParams::hardcoded(12, 1, 3, 1, 3);
    let mut region = Region::new(params).unwrap();

    for step in 0..60usize {
        let input = bits(12, [(step * 7) % 12, (step * 5 + 3) % 12, (step * 3 + 1) % 12]);
        region.update_input(&input).unwrap();
        region.run_once();
    }

    assert!(region.num_region_segments(0) > 0);
    for column in &region.columns {
        for cell in &column.cells {
            for segment in &cell.segments {
                assert_eq!(segment.sources().len(), segment.synapses.len());
                assert!(segment.synapses.iter().all(|syn| match syn.source {
                    SynapseSource::Cell(address) => address.col != column.index,
                    SynapseSource::Input(_) => false,
                }));
            }
        }
    }
}

#[test]
fn zero_overlap_columns_only_decay() {
    let params = RegionParams::parameterized(16, 16, 8, 8, 1.0, 0.1, 1, 0.5, 1, 1, 2)
        .with_spatial_learning(true);
    let mut region = Region::new(params).unwrap();
    let alpha = region.params.config.ema_alpha;

    let input = bits(256, (0..4).flat_map(|y| (0..4).map(move |x| y * 16 + x)));
    for _ in 0..50 {
        region.update_input(&input).unwrap();
        region.run_once();
    }

    let far = region.columns.len() - 1;
    assert_eq!(region.columns[far].overlap, 0);
    let (active_duty, overlap_duty, boost) = (
        region.columns[far].active_duty_cycle,
        region.columns[far].overlap_duty_cycle,
        region.columns[far].boost,
    );

    region.run_once();

    let column = &region.columns[far];
    assert_eq!(column.overlap, 0);
    assert!(!column.is_active);
    assert!((column.active_duty_cycle - active_duty * (1.0 - alpha)).abs() < 1e-6);
    assert!((column.overlap_duty_cycle - overlap_duty * (1.0 - alpha)).abs() < 1e-6);
    assert_eq!(column.boost, boost);
}

#[test]
fn overlapping_window_grows_two_step_predictions() {
    // Two neighboring bits slide over eight columns, so every active cell is also predicted by
    // the bit it shares with the previous step.
    let mut region = Region::new(RegionParams::hardcoded(8, 1, 1, 1, 2)).unwrap();

    // Stops on the window {6, 7}: column 1 is then two steps away.
    for t in 0..199usize {
        region.update_input(&bits(8, [t % 8, (t + 1) % 8])).unwrap();
        region.run_once();
    }

    assert!(region.num_region_segments(2) > 0);
    assert!(region.stats().non_sequence.segments_per_cell.total > 0);

    let predictions = region.column_predictions();
    assert!(predictions.contains(&2), "{predictions:?}");
    assert!(predictions.iter().all(|&steps| steps <= region.params.config.max_prediction_steps));

    for column in &region.columns {
        for segment in column.cells.iter().flat_map(|cell| cell.segments.iter()) {
            assert_eq!(segment.is_sequence, segment.prediction_steps == 1);
        }
    }
}

#[test]
fn segment_cap_limits_growth() {
    let config = RegionConfig {
        max_segments_per_cell: Some(1),
        ..RegionConfig::default()
    };
    let params = RegionParams::hardcoded(6, 1, 1, 1, 1).with_config(config);
    let mut region = Region::new(params).unwrap();

    for step in 0..40usize {
        region.update_input(&bits(6, [step % 6, (step * 5) % 6])).unwrap();
        region.run_once();
    }

    assert!(region.cells().all(|cell| cell.segments.len() <= 1));
}
