//! Topology represents a two dimensional grid (the column grid or the input grid) stored in row-major
//! order. It converts between linear indices and `(x, y)` coordinates and iterates over square
//! neighborhoods clipped at the grid borders.
//!
//! Both local inhibition and distal synapse locality use the same square "box" notion of distance:
//! a position lies within radius `r` of a center iff `|dx| <= r` and `|dy| <= r`.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// The shape of a two dimensional grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub width: usize,
    pub height: usize,
}

impl Topology {
    #[inline]
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of positions in the grid.
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts a linear index into its `(x, y)` coordinates.
    #[inline]
    pub fn coordinates(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Converts `(x, y)` coordinates into a linear index.
    #[inline]
    pub fn index_from_coordinates(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Returns the x and y ranges of the square of the given `radius` around `(cx, cy)`,
    /// clipped at the grid borders.
    #[inline]
    pub fn bounds(&self, cx: usize, cy: usize, radius: usize) -> (Range<usize>, Range<usize>) {
        let x = cx.saturating_sub(radius)..(cx + radius + 1).min(self.width);
        let y = cy.saturating_sub(radius)..(cy + radius + 1).min(self.height);
        (x, y)
    }

    /// True if the two indices lie within `radius` of each other. A radius of 0 means unrestricted.
    #[inline]
    pub fn within(&self, a: usize, b: usize, radius: usize) -> bool {
        if radius == 0 {
            return true;
        }

        let (ax, ay) = self.coordinates(a);
        let (bx, by) = self.coordinates(b);

        ax.abs_diff(bx) <= radius && ay.abs_diff(by) <= radius
    }

    /// Returns an iterator over the indices within `radius` of the `center` index,
    /// clipped at the grid borders. The center itself is included.
    #[inline]
    pub fn neighborhood(&self, center: usize, radius: usize) -> NeighborhoodIter {
        let (cx, cy) = self.coordinates(center);
        let (xs, ys) = self.bounds(cx, cy, radius);

        NeighborhoodIter {
            topology: *self,
            x: xs.start,
            y: ys.start,
            xs,
            ys,
        }
    }
}

/// An iterator that yields all indices of a clipped square neighborhood, row by row.
pub struct NeighborhoodIter {
    topology: Topology,
    xs: Range<usize>,
    ys: Range<usize>,
    x: usize,
    y: usize,
}

impl Iterator for NeighborhoodIter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.xs.is_empty() || self.y >= self.ys.end {
            return None;
        }

        let result = self.topology.index_from_coordinates(self.x, self.y);

        self.x += 1;
        if self.x >= self.xs.end {
            self.x = self.xs.start;
            self.y += 1;
        }

        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rows_left = self.ys.end.saturating_sub(self.y);
        let count = if rows_left == 0 || self.xs.is_empty() {
            0
        } else {
            (rows_left - 1) * self.xs.len() + (self.xs.end - self.x)
        };

        (count, Some(count))
    }
}
