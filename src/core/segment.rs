//! A `Segment` is a dendrite: a list of synapses plus activation statistics cached once per step.
//!
//! Proximal segments (one per column) are wired to input bits, distal segments (many per cell) are
//! wired to other cells. Both use this same type.
//!
//! Every time step has two halves:
//! - `process` caches the connected flag of each synapse and counts the synapses whose source is
//!   currently active, split into connected and all. The segment is active iff the connected
//!   count reaches its threshold.
//! - `next_time_step` moves those counts (and the connected flags) into their "previous" slots and
//!   clears the current ones.
//!
//! A distal segment also knows how many steps ahead it predicts. A segment predicting exactly one
//! step ahead is a "sequence" segment.

use super::{
    activity::Activity,
    cell::CellAddress,
    config::SynapsePermanenceOptions,
    synapses::{Synapse, SynapseSource},
};
use fxhash::FxHashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub synapses: Vec<Synapse>,

    /// Number of steps ahead this segment predicts activation. 0 for proximal segments.
    pub prediction_steps: usize,

    pub is_sequence: bool,

    /// Connected active synapses needed to activate the segment.
    pub threshold: usize,

    pub is_active: bool,
    pub was_active: bool,

    pub active_connected: usize,
    pub active_all: usize,
    pub prev_active_connected: usize,
    pub prev_active_all: usize,
}

impl Segment {
    #[inline]
    pub fn new(threshold: usize) -> Self {
        Self {
            synapses: Vec::new(),
            prediction_steps: 0,
            is_sequence: false,
            threshold,
            is_active: false,
            was_active: false,
            active_connected: 0,
            active_all: 0,
            prev_active_connected: 0,
            prev_active_all: 0,
        }
    }

    /// Creates a distal segment predicting `steps` ahead.
    #[inline]
    pub fn distal(threshold: usize, steps: usize, max_steps: usize) -> Self {
        let mut segment = Self::new(threshold);
        segment.set_prediction_steps(steps, max_steps);
        segment
    }

    /// Sets the prediction horizon, clamped to `[1, max_steps]`.
    #[inline]
    pub fn set_prediction_steps(&mut self, steps: usize, max_steps: usize) {
        self.prediction_steps = steps.clamp(1, max_steps.max(1));
        self.is_sequence = self.prediction_steps == 1;
    }

    /// Caches connectivity and counts the currently active synapses.
    pub fn process(&mut self, activity: &Activity, connected: f32) {
        let mut num_connected = 0;
        let mut num_all = 0;

        for syn in self.synapses.iter_mut() {
            let is_connected = syn.refresh_connected(connected);

            if activity.is_active(syn.source) {
                num_all += 1;
                if is_connected {
                    num_connected += 1;
                }
            }
        }

        self.active_connected = num_connected;
        self.active_all = num_all;
        self.is_active = num_connected >= self.threshold;
    }

    /// Moves the current counts into the previous slots and clears the current state.
    pub fn next_time_step(&mut self) {
        self.was_active = self.is_active;
        self.is_active = false;
        self.prev_active_connected = self.active_connected;
        self.prev_active_all = self.active_all;
        self.active_connected = 0;
        self.active_all = 0;

        for syn in self.synapses.iter_mut() {
            syn.was_connected = syn.is_connected;
            syn.is_connected = false;
        }
    }

    #[inline]
    pub fn create_synapse(&mut self, source: SynapseSource, permanence: f32) {
        self.synapses.push(Synapse::new(source, permanence));
    }

    /// Adds one synapse per learning cell, skipping cells the segment is already connected to and
    /// stopping once `capacity` synapses are reached. Returns the number of synapses added.
    pub fn create_synapses_to_learning_cells(
        &mut self,
        cells: &[CellAddress],
        permanence: f32,
        capacity: Option<usize>,
    ) -> usize {
        let mut existing = self.sources();
        let room = capacity.map_or(usize::MAX, |cap| cap.saturating_sub(self.synapses.len()));
        let mut added = 0;

        for &cell in cells {
            if added == room {
                break;
            }

            let source = SynapseSource::Cell(cell);
            if existing.insert(source) {
                self.create_synapse(source, permanence);
                added += 1;
            }
        }

        added
    }

    /// The set of sources this segment is already connected to.
    #[inline]
    pub fn sources(&self) -> FxHashSet<SynapseSource> {
        self.synapses.iter().map(|syn| syn.source).collect()
    }

    /// Indices of the synapses active at the current step.
    pub fn active_synapses<'a>(
        &'a self,
        activity: &'a Activity,
        connected_only: bool,
    ) -> impl Iterator<Item = usize> + 'a {
        self.synapses
            .iter()
            .enumerate()
            .filter(move |(_, syn)| syn.is_active(activity, connected_only))
            .map(|(i, _)| i)
    }

    /// Indices of the synapses that were active at the previous step.
    pub fn prev_active_synapses<'a>(
        &'a self,
        activity: &'a Activity,
        connected_only: bool,
    ) -> impl Iterator<Item = usize> + 'a {
        self.synapses
            .iter()
            .enumerate()
            .filter(move |(_, syn)| syn.was_active(activity, connected_only))
            .map(|(i, _)| i)
    }

    /// Cached count of active synapses at the current step.
    #[inline]
    pub fn active_synapse_count(&self, connected_only: bool) -> usize {
        if connected_only {
            self.active_connected
        } else {
            self.active_all
        }
    }

    /// Cached count of active synapses at the previous step.
    #[inline]
    pub fn prev_active_synapse_count(&self, connected_only: bool) -> usize {
        if connected_only {
            self.prev_active_connected
        } else {
            self.prev_active_all
        }
    }

    /// Increases every currently active connected synapse, decreases every other one.
    pub fn adapt_permanences(&mut self, activity: &Activity, options: &SynapsePermanenceOptions) {
        for syn in self.synapses.iter_mut() {
            if syn.is_active(activity, true) {
                syn.increase_permanence(options.increment, options);
            } else {
                syn.decrease_permanence(options.decrement, options);
            }
        }
    }

    /// Increases the synapses listed in `active`, decreases every other one.
    pub fn update_permanences(&mut self, active: &[usize], options: &SynapsePermanenceOptions) {
        let active: FxHashSet<usize> = active.iter().copied().collect();

        for (i, syn) in self.synapses.iter_mut().enumerate() {
            if active.contains(&i) {
                syn.increase_permanence(options.increment, options);
            } else {
                syn.decrease_permanence(options.decrement, options);
            }
        }
    }

    /// Decreases only the synapses listed in `active`.
    pub fn decrease_permanences(&mut self, active: &[usize], options: &SynapsePermanenceOptions) {
        for &i in active {
            if let Some(syn) = self.synapses.get_mut(i) {
                syn.decrease_permanence(options.decrement, options);
            }
        }
    }

    pub fn increase_all_permanences(&mut self, options: &SynapsePermanenceOptions) {
        for syn in self.synapses.iter_mut() {
            syn.increase_permanence(options.increment, options);
        }
    }

    /// True if enough synapses were active through connections from cells that were learning.
    pub fn was_active_from_learning(&self, activity: &Activity) -> bool {
        let count = self
            .synapses
            .iter()
            .filter(|syn| syn.was_active_from_learning(activity))
            .count();

        count >= self.threshold
    }

    /// Number of synapses whose permanence currently reaches `connected`.
    #[inline]
    pub fn num_connected(&self, connected: f32) -> usize {
        self.synapses
            .iter()
            .filter(|syn| syn.permanence >= connected)
            .count()
    }
}
