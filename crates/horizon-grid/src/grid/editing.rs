//! Opening editors and applying the results of commits.

use std::sync::Arc;

use horizon_grid_core::logging::targets;
use parking_lot::Mutex;

use super::{Direction, Grid};
use crate::edit::session::ActiveEdit;
use crate::edit::{CellBox, EditController, EditorArgs, EditorFactory};
use crate::error::Result;
use crate::format::CellContent;
use crate::render::RenderBackend;
use crate::signals::{BeforeEditCell, CellPosition, Veto};

impl<B: RenderBackend> Grid<B> {
    /// Open an editor on the active cell.
    ///
    /// `editor` overrides the factory resolved from metadata, the column and
    /// the options. Returns `Ok(false)` when nothing opened: no active cell,
    /// the grid is not editable, the cell has no editor, a
    /// `before_edit_cell` slot vetoed, another controller holds the editor
    /// lock, or this grid's open edit refused to commit.
    ///
    /// # Errors
    ///
    /// [`GridError::EditorLockHeld`](crate::GridError::EditorLockHeld) if
    /// another controller took the editor lock while the edit was opening.
    pub fn edit_active_cell(&mut self, editor: Option<Arc<dyn EditorFactory>>) -> Result<bool> {
        self.make_active_cell_editable(editor)
    }

    pub(super) fn make_active_cell_editable(&mut self, editor: Option<Arc<dyn EditorFactory>>) -> Result<bool> {
        let Some(position) = self.active else {
            return Ok(false);
        };
        if !self.options.editable {
            tracing::warn!(target: targets::EDIT, "edit requested on a grid that is not editable");
            return Ok(false);
        }
        if self.session.position() == Some(position) {
            return Ok(true);
        }
        let (row, cell) = (position.row, position.cell);
        let Some(item) = self.data.item(row).filter(|item| !item.is_non_data()) else {
            return Ok(false);
        };
        let Some(item) = item.as_data().cloned() else {
            return Ok(false);
        };
        let explicit = editor.is_some();
        let Some(factory) = editor.or_else(|| self.editor_for(row, cell)) else {
            return Ok(false);
        };
        let column = self.columns[cell].clone();

        let veto = Veto::default();
        self.signals.before_edit_cell.emit(BeforeEditCell {
            row,
            cell,
            column: column.clone(),
            veto: veto.clone(),
        });
        if veto.is_set() {
            tracing::debug!(target: targets::EDIT, row, cell, "edit vetoed");
            return Ok(false);
        }

        let lock = self.session.editor_lock();
        if lock.is_active() && !lock.is_active_controller(self.session.as_ref()) {
            tracing::debug!(target: targets::EDIT, row, cell, "editor lock held by another controller");
            return Ok(false);
        }
        if !lock.commit_current_edit() {
            return Ok(false);
        }
        lock.activate(self.session.clone())?;

        let container = self.rows.cell_node(row, cell);
        let mut instance = factory.create(EditorArgs {
            row,
            cell,
            column: column.clone(),
            item: item.clone(),
            container,
            position: self.cell_box(row, cell),
            host: self.editor_host.clone(),
        });
        if let Some(node) = container {
            self.backend.set_class(node, "editable", true);
            if !explicit && !instance.suppress_clear_on_edit() {
                self.backend.set_content(node, &CellContent::empty());
            }
        }
        {
            let record = item.read();
            instance.load_value(&*record);
        }
        let serialized_value = instance.serialize_value();
        self.session.begin(ActiveEdit {
            position,
            column,
            item,
            editor: Arc::new(Mutex::new(instance)),
            serialized_value,
        });
        self.update_editor_position();
        Ok(true)
    }

    /// Commit this grid's open edit. Returns `false` if validation refused
    /// it; the editor then stays open and the cell is marked invalid.
    pub fn commit_current_edit(&mut self) -> bool {
        let committed = self.session.commit_current_edit();
        self.apply_edit_effects();
        self.render();
        committed
    }

    /// Close this grid's open edit without applying it.
    pub fn cancel_current_edit(&mut self) -> bool {
        let cancelled = self.session.cancel_current_edit();
        self.apply_edit_effects();
        self.render();
        cancelled
    }

    /// Commit through the editor lock and, with auto edit, move down.
    pub(super) fn commit_edit_and_set_focus(&mut self) {
        if self.session.editor_lock().commit_current_edit() && self.options.auto_edit {
            self.navigate(Direction::Down);
        }
        self.apply_edit_effects();
        self.render();
    }

    /// Cancel through the editor lock.
    pub(super) fn cancel_edit_and_set_focus(&mut self) {
        self.session.editor_lock().cancel_current_edit();
        self.apply_edit_effects();
        self.render();
    }

    /// Apply the node changes edits queued. Returns `true` if there were any.
    pub(super) fn apply_edit_effects(&mut self) -> bool {
        let effects = self.session.effects().take();
        if effects.is_empty() {
            return false;
        }
        if let Some(position) = effects.finished {
            if let Some(node) = self.rows.cell_node(position.row, position.cell) {
                self.backend.set_class(node, "editable", false);
                self.backend.set_class(node, "invalid", false);
            }
        }
        if let Some(position) = effects.invalid {
            if let Some(node) = self.rows.cell_node(position.row, position.cell) {
                self.backend.set_class(node, "invalid", true);
            }
        }
        self.invalidate_rows(effects.refresh_rows);
        true
    }

    /// Where a cell is relative to the grid viewport.
    pub fn cell_box(&self, row: usize, cell: usize) -> CellBox {
        let row_height = self.options.row_height;
        let metrics = self.layout.column_metrics();
        let frozen_cols = self.layout.frozen_cols();
        let colspan = self
            .rows
            .get(row)
            .and_then(|entry| entry.cells.get(&cell))
            .map_or_else(|| self.colspan(row, cell), |cached| cached.colspan);

        let frozen_col = cell < frozen_cols;
        let frozen_row = self.layout.is_frozen_row(row);
        let mut left = metrics.left(cell);
        if !frozen_col {
            left += metrics.frozen_width() - self.scroll_left;
        }
        let mut top = self.layout.row_top(row, row_height);
        if !frozen_row {
            top -= self.scroll_top;
        }
        let width = metrics.span_width(cell, colspan);

        let visible_v = frozen_row || (top + row_height > 0.0 && top < self.viewport.pane_height);
        let pane_left = metrics.frozen_width();
        let visible_h = frozen_col || (left + width > pane_left && left < pane_left + self.viewport.pane_width);

        CellBox {
            top,
            left,
            bottom: top + row_height,
            right: left + width,
            width,
            height: row_height,
            visible: visible_v && visible_h,
        }
    }

    /// Box of the active cell.
    pub fn active_cell_box(&self) -> Option<CellBox> {
        self.active.map(|a| self.cell_box(a.row, a.cell))
    }

    /// Tell an open editor where its cell went.
    pub(super) fn update_editor_position(&mut self) {
        let Some(CellPosition { row, cell }) = self.session.position() else {
            return;
        };
        let cell_box = self.cell_box(row, cell);
        self.session.with_editor(|editor| {
            if cell_box.visible {
                editor.show();
            } else {
                editor.hide();
            }
            editor.position(cell_box);
        });
    }
}
