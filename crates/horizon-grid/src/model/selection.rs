//! Selection models for the grid.
//!
//! The grid itself only keeps selection bookkeeping (selected rows and the
//! selected-cell style layer); which ranges are selected is decided by a
//! pluggable [`SelectionModel`].
//!
//! # Example
//!
//! ```
//! use horizon_grid::model::{CellRange, RowSelectionModel, SelectionModel};
//!
//! let selection = RowSelectionModel::new();
//! selection.signals().ranges_changed.connect(|ranges| {
//!     println!("{} ranges selected", ranges.len());
//! });
//! selection.set_selected_ranges(vec![CellRange::new(0, 0, 2, 3)]);
//! assert_eq!(selection.selected_rows(), vec![0, 1, 2]);
//! ```

use std::collections::BTreeSet;

use horizon_grid_core::Signal;
use parking_lot::RwLock;

use super::range::CellRange;

/// Signals emitted by a [`SelectionModel`].
#[derive(Default)]
pub struct SelectionSignals {
    /// Emitted with the new ranges whenever the selection changes.
    pub ranges_changed: Signal<Vec<CellRange>>,
}

/// A source of selected cell ranges.
pub trait SelectionModel: Send + Sync {
    /// Replace the selection.
    fn set_selected_ranges(&self, ranges: Vec<CellRange>);

    /// The current selection.
    fn selected_ranges(&self) -> Vec<CellRange>;

    /// Change notifications.
    fn signals(&self) -> &SelectionSignals;
}

/// A selection model that stores whole-row ranges as given.
#[derive(Default)]
pub struct RowSelectionModel {
    ranges: RwLock<Vec<CellRange>>,
    signals: SelectionSignals,
}

impl RowSelectionModel {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row covered by the current ranges, ascending.
    pub fn selected_rows(&self) -> Vec<usize> {
        let rows: BTreeSet<usize> = self
            .ranges
            .read()
            .iter()
            .flat_map(|range| range.from_row..=range.to_row)
            .collect();
        rows.into_iter().collect()
    }
}

impl SelectionModel for RowSelectionModel {
    fn set_selected_ranges(&self, ranges: Vec<CellRange>) {
        *self.ranges.write() = ranges.clone();
        self.signals.ranges_changed.emit(ranges);
    }

    fn selected_ranges(&self) -> Vec<CellRange> {
        self.ranges.read().clone()
    }

    fn signals(&self) -> &SelectionSignals {
        &self.signals
    }
}
