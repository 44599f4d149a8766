//! An immutable snapshot of region-wide activity.
//!
//! Synapses may point at cells in any column, so evaluating a segment needs to read state that
//! other columns own. During a step every column only ever mutates itself, and all reads of other
//! columns go through this snapshot. The region refreshes it at the phase barriers: after all
//! columns advanced to the next time step, and after temporal pooling decided the active cells.

use super::{
    cell::CellAddress,
    column::Column,
    synapses::SynapseSource,
    topology::Topology,
};

/// Flat per-cell and per-input flags, indexed by `col * cells_per_column + cell`.
#[derive(Debug, Clone)]
pub struct Activity {
    columns: Topology,
    cells_per_column: usize,
    active: Vec<bool>,
    was_active: Vec<bool>,
    was_learning: Vec<bool>,
    input: Vec<bool>,
    prev_input: Vec<bool>,

    /// Cells that were learning in the previous step, in column order.
    prev_learning: Vec<CellAddress>,
}

impl Activity {
    pub fn new(columns: Topology, cells_per_column: usize, num_inputs: usize) -> Self {
        let num_cells = columns.len() * cells_per_column;
        Self {
            columns,
            cells_per_column,
            active: vec![false; num_cells],
            was_active: vec![false; num_cells],
            was_learning: vec![false; num_cells],
            input: vec![false; num_inputs],
            prev_input: vec![false; num_inputs],
            prev_learning: Vec::new(),
        }
    }

    /// Latches a new input vector. The currently latched one becomes the previous input.
    pub fn latch_input(&mut self, input: &[bool]) {
        std::mem::swap(&mut self.input, &mut self.prev_input);
        self.input.copy_from_slice(input);
    }

    /// Re-reads every cell flag from the columns.
    pub fn capture(&mut self, columns: &[Column]) {
        self.prev_learning.clear();

        for column in columns {
            for cell in &column.cells {
                let i = column.index * self.cells_per_column + cell.index;
                self.active[i] = cell.is_active;
                self.was_active[i] = cell.was_active;
                self.was_learning[i] = cell.was_learning;

                if cell.was_learning {
                    self.prev_learning.push(CellAddress {
                        col: column.index,
                        cell: cell.index,
                    });
                }
            }
        }
    }

    /// Builds a snapshot from explicit per-cell flags.
    #[cfg(test)]
    pub(crate) fn from_flags(
        columns: Topology,
        cells_per_column: usize,
        active: &[bool],
        was_active: &[bool],
        was_learning: &[bool],
        input: &[bool],
    ) -> Self {
        let prev_learning = was_learning
            .iter()
            .enumerate()
            .filter(|&(_, &learning)| learning)
            .map(|(i, _)| CellAddress {
                col: i / cells_per_column,
                cell: i % cells_per_column,
            })
            .collect();

        Self {
            columns,
            cells_per_column,
            active: active.to_vec(),
            was_active: was_active.to_vec(),
            was_learning: was_learning.to_vec(),
            input: input.to_vec(),
            prev_input: vec![false; input.len()],
            prev_learning,
        }
    }

    #[inline]
    fn flat(&self, address: CellAddress) -> usize {
        address.col * self.cells_per_column + address.cell
    }

    #[inline]
    pub fn is_active(&self, source: SynapseSource) -> bool {
        match source {
            SynapseSource::Cell(address) => self.active[self.flat(address)],
            SynapseSource::Input(index) => self.input[index],
        }
    }

    #[inline]
    pub fn was_active(&self, source: SynapseSource) -> bool {
        match source {
            SynapseSource::Cell(address) => self.was_active[self.flat(address)],
            SynapseSource::Input(index) => self.prev_input[index],
        }
    }

    /// Input bits never learn.
    #[inline]
    pub fn was_learning(&self, source: SynapseSource) -> bool {
        match source {
            SynapseSource::Cell(address) => self.was_learning[self.flat(address)],
            SynapseSource::Input(_) => false,
        }
    }

    #[inline]
    pub fn input(&self) -> &[bool] {
        &self.input
    }

    /// Cells that were learning in the previous step, lie within `radius` of column `col`
    /// and belong to another column.
    pub fn learning_candidates(
        &self,
        col: usize,
        radius: usize,
    ) -> impl Iterator<Item = CellAddress> + '_ {
        self.prev_learning.iter().copied().filter(move |candidate| {
            candidate.col != col && self.columns.within(col, candidate.col, radius)
        })
    }
}
