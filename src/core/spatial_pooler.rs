//! Spatial pooling turns each input into a sparse set of active columns.
//!
//! - Phase 1 computes every column's overlap with the input (or copies the input bits directly in a
//!   hardcoded region).
//! - Phase 2 lets columns compete locally: a column with a positive overlap wins iff its overlap
//!   reaches the k-th highest overlap among its inhibition neighbors, k = `desired_local_activity`.
//! - Phase 3 (only with spatial learning) reinforces the proximal synapses of the winners, updates
//!   every column's duty cycles and boost, and recomputes the inhibition radius from the average
//!   receptive field size.
//!
//! Proximal wiring happens once, at construction. Each column samples unique input positions
//! around its center and gives them a gaussian permanence around the connected threshold, scaled
//! down with distance from the center.

use super::{region::Region, synapses::SynapseSource, temporal_pooler::fan_out};
use rand::{seq::IndexedRandom, Rng};

impl Region {
    /// Wires every column's proximal segment and derives the inhibition parameters.
    pub(crate) fn wire_proximal_synapses<R: Rng>(&mut self, rng: &mut R) {
        let params = &self.params;
        let config = &params.config;
        let num_inputs = self.input_topology.len();

        self.input_radius = params.input_radius();
        self.synapses_per_segment = params.proximal_synapses_per_segment();
        self.min_overlap = self.synapses_per_segment as f32 * params.pct_min_overlap;

        let input_radius = self.input_radius.round() as usize;
        let longer_side = params.input_width.max(params.input_height) as f32;
        let options = config.permanence;

        for column in self.columns.iter_mut() {
            let positions: Vec<usize> = if params.locality_radius > 0 {
                let (xs, ys) = self.input_topology.bounds(column.ix, column.iy, input_radius);
                ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
                    .map(|(x, y)| self.input_topology.index_from_coordinates(x, y))
                    .collect()
            } else {
                (0..num_inputs).collect()
            };

            let count = self.synapses_per_segment.min(positions.len());
            let chosen: Vec<usize> = positions.choose_multiple(rng, count).copied().collect();

            for input in chosen {
                let permanence = if config.full_default_spatial_permanence {
                    1.0
                } else {
                    let (x, y) = self.input_topology.coordinates(input);
                    let dx = column.ix as f32 - x as f32;
                    let dy = column.iy as f32 - y as f32;
                    let distance = (dx * dx + dy * dy).sqrt();
                    let ex = distance / (longer_side * config.rad_bias_std_dev);
                    let locality_bias = (config.rad_bias_peak / 0.4) * (-(ex * ex) / 2.0).exp();

                    let permanence = (options.connected + options.increment * gaussian(rng)).max(0.0);
                    (permanence * locality_bias).clamp(options.min, options.max)
                };

                column.proximal.create_synapse(SynapseSource::Input(input), permanence);
            }
        }

        self.inhibition_radius = self.average_receptive_field_size();

        let local_activity = if params.locality_radius == 0 {
            self.inhibition_radius * params.pct_local_activity
        } else {
            (params.locality_radius * params.locality_radius) as f32 * params.pct_local_activity
        };
        self.desired_local_activity = (local_activity.round() as usize).max(2);
    }

    /// Runs the three spatial pooling phases.
    pub fn perform_spatial_pooling(&mut self) {
        if self.params.is_hardcoded() {
            let input = self.activity.input();
            for column in self.columns.iter_mut() {
                column.is_active = input[column.index];
            }
            return;
        }

        let connected = self.params.config.permanence.connected;
        let min_overlap = self.min_overlap;
        let activity = &self.activity;
        fan_out(&mut self.columns, self.params.scheduler, |column| {
            column.compute_overlap(activity, min_overlap, connected)
        });

        let winners: Vec<bool> = (0..self.columns.len())
            .map(|i| {
                let overlap = self.columns[i].overlap;
                overlap > 0 && overlap >= self.kth_score(i, self.desired_local_activity)
            })
            .collect();

        for (column, winner) in self.columns.iter_mut().zip(winners) {
            column.is_active = winner;
        }

        if !self.params.spatial_learning {
            return;
        }

        let config = &self.params.config;
        let activity = &self.activity;
        for column in self.columns.iter_mut().filter(|column| column.is_active) {
            column.update_permanences(activity, config);
        }

        let radius = self.neighbor_radius();
        let max_duty: Vec<f32> = (0..self.columns.len())
            .map(|i| {
                self.topology
                    .neighborhood(i, radius)
                    .map(|j| self.columns[j].active_duty_cycle)
                    .fold(0.0, f32::max)
            })
            .collect();

        let min_overlap = self.min_overlap;
        for (column, max_duty) in self.columns.iter_mut().zip(max_duty) {
            column.perform_boosting(max_duty, min_overlap, config);
        }

        self.inhibition_radius = self.average_receptive_field_size();
    }

    /// The k-th highest overlap among the inhibition neighbors of column `index`.
    pub fn kth_score(&self, index: usize, k: usize) -> usize {
        let mut overlaps: Vec<usize> = self
            .topology
            .neighborhood(index, self.neighbor_radius())
            .map(|j| self.columns[j].overlap)
            .collect();
        overlaps.sort_unstable();

        let len = overlaps.len();
        overlaps[len.saturating_sub(k).min(len - 1)]
    }

    /// Mean distance, in column grid units, between each column's center and the input positions
    /// of its connected proximal synapses. 0 if no synapse is connected.
    pub fn average_receptive_field_size(&self) -> f32 {
        let connected = self.params.config.permanence.connected;
        let space = if self.x_space > 0.0 { self.x_space } else { 1.0 };

        let mut sum = 0.0f64;
        let mut n = 0usize;

        for column in &self.columns {
            for syn in &column.proximal.synapses {
                let SynapseSource::Input(input) = syn.source else {
                    continue;
                };
                if syn.permanence < connected {
                    continue;
                }

                let (x, y) = self.input_topology.coordinates(input);
                let dx = column.ix as f64 - x as f64;
                let dy = column.iy as f64 - y as f64;
                sum += (dx * dx + dy * dy).sqrt() / space as f64;
                n += 1;
            }
        }

        if n == 0 {
            0.0
        } else {
            (sum / n as f64) as f32
        }
    }

    /// Neighborhood radius used for inhibition and boosting. Always includes the direct neighbors.
    #[inline]
    fn neighbor_radius(&self) -> usize {
        (self.inhibition_radius.round() as usize).max(1)
    }
}

/// A standard normal sample using the Box-Muller transform.
fn gaussian<R: Rng>(rng: &mut R) -> f32 {
    let u1: f32 = rng.random::<f32>().max(f32::MIN_POSITIVE);
    let u2: f32 = rng.random();

    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}
