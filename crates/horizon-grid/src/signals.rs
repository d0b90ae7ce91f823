//! Signals emitted by the grid.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use horizon_grid_core::Signal;

use crate::column::{Column, ColumnSort};
use crate::model::ItemHandle;
use crate::viewport::ViewRange;

/// A cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPosition {
    /// Data row index.
    pub row: usize,
    /// Column index in the view.
    pub cell: usize,
}

impl CellPosition {
    /// Create a cell address.
    pub const fn new(row: usize, cell: usize) -> Self {
        Self { row, cell }
    }
}

/// A flag slots can set to stop the grid from going ahead.
#[derive(Debug, Clone, Default)]
pub struct Veto(Arc<AtomicBool>);

impl Veto {
    /// Stop the operation.
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` if a slot stopped the operation.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Sent before an editor is created; setting `veto` keeps the cell normal.
#[derive(Debug, Clone)]
pub struct BeforeEditCell {
    /// Data row index.
    pub row: usize,
    /// Column index.
    pub cell: usize,
    /// The column to edit.
    pub column: Arc<Column>,
    /// Set to refuse the edit.
    pub veto: Veto,
}

/// Sent after an edit command applied a value.
#[derive(Clone)]
pub struct CellChange {
    /// Data row index.
    pub row: usize,
    /// Column index.
    pub cell: usize,
    /// The edited item.
    pub item: ItemHandle,
}

impl std::fmt::Debug for CellChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellChange")
            .field("row", &self.row)
            .field("cell", &self.cell)
            .finish_non_exhaustive()
    }
}

/// Sent when a commit was refused by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Data row index.
    pub row: usize,
    /// Column index.
    pub cell: usize,
    /// Id of the edited column.
    pub column_id: String,
    /// Reason given by the validator.
    pub msg: Option<String>,
}

/// A click or double click on a cell; setting `handled` skips the grid's
/// default handling.
#[derive(Debug, Clone)]
pub struct CellClick {
    /// Data row index.
    pub row: usize,
    /// Column index.
    pub cell: usize,
    /// Set to skip default handling.
    pub handled: Veto,
}

/// Scroll offsets after a scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEvent {
    /// Vertical offset.
    pub scroll_top: f32,
    /// Horizontal offset.
    pub scroll_left: f32,
}

/// New sort state after a header click or programmatic sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortEvent {
    /// Whether multi-column sorting is enabled.
    pub multi_column_sort: bool,
    /// The sort columns in priority order.
    pub sort_columns: Vec<ColumnSort>,
}

/// Selected rows before and after a selection change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRowsChanged {
    /// Selected rows now.
    pub rows: Vec<usize>,
    /// Selected rows before.
    pub previous: Vec<usize>,
}

/// All signals of a grid.
///
/// Obtain them with [`Grid::signals`](crate::Grid::signals) and connect
/// before driving the grid.
#[derive(Default)]
pub struct GridSignals {
    /// Active cell changed (`None` when reset).
    pub active_cell_changed: Signal<Option<CellPosition>>,
    /// An editor is about to be created.
    pub before_edit_cell: Signal<BeforeEditCell>,
    /// The editor of a cell is about to be destroyed.
    pub before_cell_editor_destroy: Signal<CellPosition>,
    /// An edit command changed a cell.
    pub cell_change: Signal<CellChange>,
    /// Validation refused a commit.
    pub validation_error: Signal<ValidationError>,
    /// A cell was clicked.
    pub click: Signal<CellClick>,
    /// A cell was double-clicked.
    pub dbl_click: Signal<CellClick>,
    /// The scroll position changed.
    pub scroll: Signal<ScrollEvent>,
    /// The visible range changed.
    pub viewport_changed: Signal<()>,
    /// A render pass completed with the given rendered range.
    pub rendered: Signal<ViewRange>,
    /// The sort columns changed.
    pub sort: Signal<SortEvent>,
    /// The selected rows changed.
    pub selected_rows_changed: Signal<SelectedRowsChanged>,
    /// Column widths changed.
    pub columns_resized: Signal<()>,
    /// A cell css style layer changed; carries the layer key.
    pub cell_css_styles_changed: Signal<String>,
}

impl GridSignals {
    /// Create a new set of grid signals.
    pub fn new() -> Self {
        Self::default()
    }
}

static_assertions::assert_impl_all!(GridSignals: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_veto_is_shared() {
        let veto = Veto::default();
        let copy = veto.clone();
        assert!(!veto.is_set());
        copy.set();
        assert!(veto.is_set());
    }
}
