//! Cell css style layers and the selection bookkeeping built on them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use horizon_grid_core::logging::targets;

use super::{Grid, GridMessage};
use crate::error::{GridError, Result};
use crate::model::{CellRange, SelectionModel};
use crate::render::RenderBackend;
use crate::signals::SelectedRowsChanged;

/// Css classes per row and column id, as one named layer of
/// [`Grid::set_cell_css_styles`]. Values hold space-separated classes.
pub type CellStyles = BTreeMap<usize, BTreeMap<String, String>>;

impl<B: RenderBackend> Grid<B> {
    /// Add a style layer. Returns `false` if `key` is already in use.
    pub fn add_cell_css_styles(&mut self, key: &str, styles: CellStyles) -> bool {
        if self.cell_css_classes.contains_key(key) {
            return false;
        }
        self.cell_css_classes.insert(key.to_string(), styles);
        self.update_rendered_cell_styles(None);
        self.signals.cell_css_styles_changed.emit(key.to_string());
        true
    }

    /// Replace (or add) a style layer.
    pub fn set_cell_css_styles(&mut self, key: &str, styles: CellStyles) {
        let previous = self.cell_css_classes.insert(key.to_string(), styles);
        self.update_rendered_cell_styles(previous.as_ref());
        self.signals.cell_css_styles_changed.emit(key.to_string());
    }

    /// Remove a style layer. Returns `false` if there was none.
    pub fn remove_cell_css_styles(&mut self, key: &str) -> bool {
        let Some(previous) = self.cell_css_classes.remove(key) else {
            return false;
        };
        self.update_rendered_cell_styles(Some(&previous));
        self.signals.cell_css_styles_changed.emit(key.to_string());
        true
    }

    /// A style layer.
    pub fn cell_css_styles(&self, key: &str) -> Option<&CellStyles> {
        self.cell_css_classes.get(key)
    }

    /// Apply a layer change to the cells already rendered; cells rendered
    /// later pick the layers up on creation. Classes of `removed` are taken
    /// off first, then every remaining layer is applied again, so a class
    /// shared with another layer stays.
    fn update_rendered_cell_styles(&mut self, removed: Option<&CellStyles>) {
        for row in self.rows.rows() {
            let cells: Vec<(usize, crate::render::NodeId)> = match self.rows.get(row) {
                Some(entry) => entry.cells.iter().map(|(start, cell)| (*start, cell.node)).collect(),
                None => continue,
            };
            for (start, node) in cells {
                let Some(column) = self.columns.get(start) else {
                    continue;
                };
                let lookup = |styles: &CellStyles| styles.get(&row).and_then(|r| r.get(&column.id)).cloned();
                let stale = removed.and_then(lookup);
                let current: Vec<String> = self.cell_css_classes.values().filter_map(lookup).collect();
                for class in stale.iter().flat_map(|classes| classes.split_whitespace()) {
                    self.backend.set_class(node, class, false);
                }
                for class in current.iter().flat_map(|classes| classes.split_whitespace()) {
                    self.backend.set_class(node, class, true);
                }
            }
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Attach a selection model, replacing the previous one.
    pub fn set_selection_model(&mut self, model: Arc<dyn SelectionModel>) {
        if let Some((previous, connection)) = self.selection_model.take() {
            previous.signals().ranges_changed.disconnect(connection);
        }
        let tx = self.sender.clone();
        let connection = model.signals().ranges_changed.connect(move |ranges| {
            let _ = tx.send(GridMessage::SelectedRangesChanged(ranges.clone()));
        });
        self.selection_model = Some((model, connection));
    }

    /// The attached selection model.
    pub fn selection_model(&self) -> Option<&Arc<dyn SelectionModel>> {
        self.selection_model.as_ref().map(|(model, _)| model)
    }

    /// Rows covered by the current selection, in range order.
    pub fn selected_rows(&self) -> &[usize] {
        &self.selected_rows
    }

    /// Select whole rows through the selection model. Without
    /// [`multi_select`](crate::GridOptions::multi_select) only the first row
    /// is kept.
    ///
    /// # Errors
    ///
    /// [`GridError::SelectionModelMissing`].
    pub fn set_selected_rows(&mut self, rows: &[usize]) -> Result<()> {
        let Some(model) = self.selection_model().cloned() else {
            return Err(GridError::SelectionModelMissing);
        };
        let rows = if self.options.multi_select {
            rows
        } else {
            &rows[..rows.len().min(1)]
        };
        let last_cell = self.columns.len().saturating_sub(1);
        model.set_selected_ranges(
            rows.iter()
                .map(|row| CellRange::new(*row, 0, *row, last_cell))
                .collect(),
        );
        self.process_events();
        Ok(())
    }

    pub(super) fn handle_selected_ranges_changed(&mut self, ranges: Vec<CellRange>) {
        let previous = std::mem::take(&mut self.selected_rows);
        let class = self.options.selected_cell_css_class.clone();
        let count = self.columns.len();
        let mut seen = BTreeSet::new();
        let mut styles = CellStyles::new();

        for range in &ranges {
            for row in range.from_row..=range.to_row {
                if seen.insert(row) {
                    self.selected_rows.push(row);
                }
                if count == 0 {
                    continue;
                }
                for cell in range.from_cell..=range.to_cell.min(count - 1) {
                    if self.can_cell_be_selected(row, cell) {
                        styles
                            .entry(row)
                            .or_default()
                            .insert(self.columns[cell].id.clone(), class.clone());
                    }
                }
            }
        }

        self.set_cell_css_styles(&class, styles);
        tracing::debug!(target: targets::GRID, rows = self.selected_rows.len(), "selection changed");
        self.signals.selected_rows_changed.emit(SelectedRowsChanged {
            rows: self.selected_rows.clone(),
            previous,
        });
    }
}
