//! Property-based checks of the permanence bounds and growth invariants.
//!
//! Run with: `cargo test --test permanence_properties`

use cla_region::core::{
    cell::CellAddress,
    config::SynapsePermanenceOptions,
    segment::Segment,
    synapses::{Synapse, SynapseSource},
};
use cla_region::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn synapse_permanence_stays_in_unit_interval(
        start in 0.0f32..=1.0,
        ops in prop::collection::vec((any::<bool>(), 0.0f32..2.0), 0..64),
    ) {
        let options = SynapsePermanenceOptions::default();
        let mut syn = Synapse::new(SynapseSource::Input(0), start);

        for (increase, amount) in ops {
            if increase {
                syn.increase_permanence(amount, &options);
            } else {
                syn.decrease_permanence(amount, &options);
            }
            prop_assert!((0.0..=1.0).contains(&syn.permanence));
        }
    }

    #[test]
    fn segment_updates_keep_permanences_bounded(
        perms in prop::collection::vec(0.0f32..=1.0, 1..32),
        rounds in prop::collection::vec((any::<bool>(), prop::collection::vec(any::<bool>(), 32)), 1..40),
    ) {
        let options = SynapsePermanenceOptions::default();
        let mut segment = Segment::new(1);
        for (i, &p) in perms.iter().enumerate() {
            segment.create_synapse(SynapseSource::Cell(CellAddress { col: i, cell: 0 }), p);
        }

        for (positive, mask) in rounds {
            let active: Vec<usize> = (0..perms.len()).filter(|&i| mask[i]).collect();
            if positive {
                segment.update_permanences(&active, &options);
            } else {
                segment.decrease_permanences(&active, &options);
            }
        }

        prop_assert!(segment.synapses.iter().all(|syn| (0.0..=1.0).contains(&syn.permanence)));
    }

    #[test]
    fn learning_never_creates_duplicate_or_own_column_sources(
        seed in any::<u64>(),
        steps in prop::collection::vec(prop::collection::vec(0usize..10, 1..4), 2..30),
    ) {
        let params = RegionParams::hardcoded(10, 1, 2, 1, 3).with_seed(seed);
        let mut region = Region::new(params).unwrap();

        for active in steps {
            let mut input = vec![false; 10];
            for i in active {
                input[i] = true;
            }
            region.update_input(&input).unwrap();
            region.run_once();
        }

        for column in &region.columns {
            for cell in &column.cells {
                for segment in &cell.segments {
                    prop_assert_eq!(segment.sources().len(), segment.synapses.len());
                    for syn in &segment.synapses {
                        prop_assert!((0.0..=1.0).contains(&syn.permanence));
                        match syn.source {
                            SynapseSource::Cell(address) => prop_assert_ne!(address.col, column.index),
                            SynapseSource::Input(_) => prop_assert!(false, "distal synapse on an input bit"),
                        }
                    }
                }
            }
        }
    }
}
