//! The data source contract consumed by the grid.

use horizon_grid_core::Signal;

use super::{ItemMetadata, RowItem};

/// Row count change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCountChange {
    /// Row count before the change.
    pub previous: usize,
    /// Row count after the change.
    pub current: usize,
}

/// Signals emitted by a [`DataSource`].
///
/// The grid connects to all three when it is given a data source and
/// disconnects when it is dropped.
///
/// - **Structure changes**: Emit `row_count_changed` after rows were added or
///   removed
/// - **Value changes**: Emit `rows_changed` with the affected row indices
/// - **Wholesale replacement**: Emit `data_changed`
#[derive(Default)]
pub struct DataSignals {
    /// Emitted after the number of rows changed.
    pub row_count_changed: Signal<RowCountChange>,

    /// Emitted after the items at the given rows changed.
    pub rows_changed: Signal<Vec<usize>>,

    /// Emitted after the whole data set was replaced.
    pub data_changed: Signal<()>,
}

impl DataSignals {
    /// Create a new set of data source signals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `row_count_changed` if the count actually changed.
    pub fn emit_row_count_changed(&self, previous: usize, current: usize) {
        if previous != current {
            self.row_count_changed.emit(RowCountChange { previous, current });
        }
    }

    /// Emit `rows_changed`.
    pub fn emit_rows_changed(&self, rows: Vec<usize>) {
        if !rows.is_empty() {
            self.rows_changed.emit(rows);
        }
    }

    /// Emit `data_changed`.
    pub fn emit_data_changed(&self) {
        self.data_changed.emit(());
    }
}

/// An indexed sequence of row items.
///
/// The grid never caches items across a data change notification: after
/// `rows_changed`, `row_count_changed` or `data_changed` it re-reads the
/// affected rows through [`DataSource::item`].
pub trait DataSource: Send + Sync {
    /// Number of rows.
    fn len(&self) -> usize;

    /// Returns `true` if the source has no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `row`, or `None` if it is not available (yet).
    fn item(&self, row: usize) -> Option<RowItem>;

    /// Optional per-row overrides.
    fn item_metadata(&self, _row: usize) -> Option<ItemMetadata> {
        None
    }

    /// Change notifications.
    fn signals(&self) -> &DataSignals;
}
