//! Rectangular cell ranges.

use std::fmt;

/// A rectangular block of cells, inclusive on both ends.
///
/// The constructors normalize the corners so `from_* <= to_*` always holds
/// for ranges built through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// First row.
    pub from_row: usize,
    /// First column.
    pub from_cell: usize,
    /// Last row.
    pub to_row: usize,
    /// Last column.
    pub to_cell: usize,
}

impl CellRange {
    /// Create a range from two corners in any order.
    pub fn new(from_row: usize, from_cell: usize, to_row: usize, to_cell: usize) -> Self {
        Self {
            from_row: from_row.min(to_row),
            from_cell: from_cell.min(to_cell),
            to_row: from_row.max(to_row),
            to_cell: from_cell.max(to_cell),
        }
    }

    /// A range covering a single cell.
    pub fn single(row: usize, cell: usize) -> Self {
        Self::new(row, cell, row, cell)
    }

    /// Returns `true` if the range spans exactly one row.
    pub fn is_single_row(&self) -> bool {
        self.from_row == self.to_row
    }

    /// Returns `true` if the range covers exactly one cell.
    pub fn is_single_cell(&self) -> bool {
        self.is_single_row() && self.from_cell == self.to_cell
    }

    /// Returns `true` if the cell lies inside the range.
    pub fn contains(&self, row: usize, cell: usize) -> bool {
        (self.from_row..=self.to_row).contains(&row) && (self.from_cell..=self.to_cell).contains(&cell)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "({}:{})", self.from_row, self.from_cell)
        } else {
            write!(
                f,
                "({}:{} - {}:{})",
                self.from_row, self.from_cell, self.to_row, self.to_cell
            )
        }
    }
}
