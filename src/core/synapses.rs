//! A `Synapse` models a single weighted connection onto a segment.
//!
//! The source of a synapse is either another cell in the region (distal synapses, which carry
//! temporal context) or a raw input bit (proximal synapses, which carry the feed-forward signal).
//! Both kinds are evaluated the same way, by looking the source up in the region's `Activity`.
//!
//! If the permanence is at least the connected threshold the synapse is considered "connected".
//! During learning permanence is increased or decreased, always clamped to `[min, max]`.
//! The connected flag is cached once per time step by the owning segment, and the previous
//! step's flag is kept so that activity at `t-1` can be evaluated with the connectivity at `t-1`.

use super::{activity::Activity, cell::CellAddress, config::SynapsePermanenceOptions};
use serde::{Deserialize, Serialize};

/// Where a synapse takes its signal from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SynapseSource {
    /// A cell in the same region.
    Cell(CellAddress),

    /// An index into the region's input vector.
    Input(usize),
}

/// A synapse connecting a source with an associated permanence value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Synapse {
    pub source: SynapseSource,

    /// Represents the strength of the connection.
    pub permanence: f32,

    /// Connected flag cached at the current time step.
    pub is_connected: bool,

    /// Connected flag cached at the previous time step.
    pub was_connected: bool,
}

impl Synapse {
    #[inline]
    pub fn new(source: SynapseSource, permanence: f32) -> Self {
        Self {
            source,
            permanence,
            is_connected: false,
            was_connected: false,
        }
    }

    /// Recomputes the cached connected flag from the current permanence.
    #[inline]
    pub fn refresh_connected(&mut self, connected: f32) -> bool {
        self.is_connected = self.permanence >= connected;
        self.is_connected
    }

    #[inline]
    pub fn is_active(&self, activity: &Activity, connected_only: bool) -> bool {
        activity.is_active(self.source) && (self.is_connected || !connected_only)
    }

    #[inline]
    pub fn was_active(&self, activity: &Activity, connected_only: bool) -> bool {
        activity.was_active(self.source) && (self.was_connected || !connected_only)
    }

    /// True if the synapse was active through a connection and its source was learning at `t-1`.
    #[inline]
    pub fn was_active_from_learning(&self, activity: &Activity) -> bool {
        self.was_active(activity, true) && activity.was_learning(self.source)
    }

    #[inline]
    pub fn increase_permanence(&mut self, amount: f32, options: &SynapsePermanenceOptions) {
        self.permanence = (self.permanence + amount).clamp(options.min, options.max);
    }

    #[inline]
    pub fn decrease_permanence(&mut self, amount: f32, options: &SynapsePermanenceOptions) {
        self.permanence = (self.permanence - amount).clamp(options.min, options.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanence_is_clamped() {
        let options = SynapsePermanenceOptions::default();
        let mut syn = Synapse::new(SynapseSource::Input(0), 0.99);

        syn.increase_permanence(0.5, &options);
        assert_eq!(syn.permanence, 1.0);

        syn.decrease_permanence(3.0, &options);
        assert_eq!(syn.permanence, 0.0);
    }

    #[test]
    fn connected_flag_follows_threshold() {
        let mut syn = Synapse::new(SynapseSource::Input(0), 0.2);
        assert!(syn.refresh_connected(0.2));

        syn.permanence = 0.19;
        assert!(!syn.refresh_connected(0.2));
    }
}
