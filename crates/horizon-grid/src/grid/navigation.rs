//! Active cell and keyboard-style navigation.

use std::sync::Arc;

use horizon_grid_core::logging::targets;

use super::Grid;
use crate::edit::{EditController, EditorFactory};
use crate::render::RenderBackend;
use crate::signals::CellPosition;

/// A navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Same column, previous focusable row.
    Up,
    /// Same column, next focusable row.
    Down,
    /// Previous focusable cell in the row.
    Left,
    /// Next focusable cell in the row.
    Right,
    /// Next focusable cell, wrapping to the next row.
    Next,
    /// Previous focusable cell, wrapping to the previous row.
    Prev,
    /// First focusable cell of the row.
    Home,
    /// Last focusable cell of the row.
    End,
    /// One page up.
    PageUp,
    /// One page down.
    PageDown,
    /// First row.
    Top,
    /// Last row.
    Bottom,
}

/// Target of a step. `pos_x` is the column the step aimed for, remembered
/// so that vertical moves through spanned cells return to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    row: usize,
    cell: usize,
    pos_x: usize,
}

impl Step {
    fn at(row: usize, cell: usize) -> Self {
        Self { row, cell, pos_x: cell }
    }
}

impl<B: RenderBackend> Grid<B> {
    // =========================================================================
    // Cell predicates
    // =========================================================================

    /// Returns `true` if the cell can become the active cell.
    ///
    /// Row metadata decides first, then column metadata, then the column.
    pub fn can_cell_be_active(&self, row: usize, cell: usize) -> bool {
        if !self.options.enable_cell_navigation || row >= self.data.len() || cell >= self.columns.len() {
            return false;
        }
        let column = &self.columns[cell];
        if let Some(metadata) = self.item_metadata(row) {
            if let Some(focusable) = metadata.focusable {
                return focusable;
            }
            if let Some(focusable) = metadata.column(&column.id, cell).and_then(|c| c.focusable) {
                return focusable;
            }
        }
        column.focusable
    }

    /// Returns `true` if the cell can be part of a selection.
    pub fn can_cell_be_selected(&self, row: usize, cell: usize) -> bool {
        if row >= self.data.len() || cell >= self.columns.len() {
            return false;
        }
        let column = &self.columns[cell];
        if let Some(metadata) = self.item_metadata(row) {
            if let Some(selectable) = metadata.selectable {
                return selectable;
            }
            if let Some(selectable) = metadata.column(&column.id, cell).and_then(|c| c.selectable) {
                return selectable;
            }
        }
        column.selectable
    }

    /// Columns covered by the cell starting at `cell`.
    pub fn colspan(&self, row: usize, cell: usize) -> usize {
        let metadata = self.item_metadata(row);
        self.colspan_in(metadata.as_ref(), cell)
    }

    /// Editor factory for a cell: column metadata, the column, then the
    /// grid-wide factory.
    pub(super) fn editor_for(&self, row: usize, cell: usize) -> Option<Arc<dyn EditorFactory>> {
        let column = self.columns.get(cell)?;
        self.item_metadata(row)
            .and_then(|m| m.column(&column.id, cell).and_then(|c| c.editor.clone()))
            .or_else(|| column.editor.clone())
            .or_else(|| self.options.editor_factory.clone())
    }

    /// Returns `true` if the cell holds a loaded data row and has an editor.
    pub(super) fn is_cell_potentially_editable(&self, row: usize, cell: usize) -> bool {
        match self.data.item(row) {
            Some(item) if !item.is_non_data() => self.editor_for(row, cell).is_some(),
            _ => false,
        }
    }

    // =========================================================================
    // Active cell
    // =========================================================================

    /// The active cell.
    pub fn active_cell(&self) -> Option<CellPosition> {
        self.active
    }

    /// Make a cell active, scrolling it into view.
    ///
    /// Returns `false` if the cell is out of range, navigation is disabled,
    /// or an open edit refused to commit.
    pub fn set_active_cell(&mut self, row: usize, cell: usize) -> bool {
        if !self.initialized
            || !self.options.enable_cell_navigation
            || row >= self.data.len()
            || cell >= self.columns.len()
        {
            return false;
        }
        if !self.session.editor_lock().commit_current_edit() {
            tracing::debug!(target: targets::EDIT, row, cell, "activation refused: the open edit did not commit");
            self.apply_edit_effects();
            return false;
        }
        self.scroll_cell_into_view(row, cell, false);
        self.set_active_cell_internal(Some(CellPosition::new(row, cell)), None);
        true
    }

    /// Clear the active cell. An open editor is discarded.
    pub fn reset_active_cell(&mut self) {
        self.set_active_cell_internal(None, Some(false));
    }

    /// Activate a cell, opening its editor if `force_edit` or
    /// [`auto_edit`](crate::GridOptions::auto_edit) is set.
    pub fn goto_cell(&mut self, row: usize, cell: usize, force_edit: bool) -> bool {
        if !self.initialized || !self.can_cell_be_active(row, cell) {
            return false;
        }
        if !self.session.editor_lock().commit_current_edit() {
            self.apply_edit_effects();
            return false;
        }
        self.scroll_cell_into_view(row, cell, false);
        let edit = force_edit || self.options.auto_edit;
        self.set_active_cell_internal(Some(CellPosition::new(row, cell)), Some(edit));
        true
    }

    pub(super) fn set_active_cell_internal(&mut self, position: Option<CellPosition>, edit_mode: Option<bool>) {
        let previous = self.active;
        if let Some(old) = previous {
            if self.session.is_editing() {
                self.session.cancel_current_edit();
                self.apply_edit_effects();
            }
            self.set_active_classes(old, false);
        }

        self.active = position;
        if let Some(position) = position {
            self.active_pos_x = position.cell;
            self.set_active_classes(position, true);
            let edit = edit_mode.unwrap_or(self.options.auto_edit);
            if self.options.editable && edit && self.is_cell_potentially_editable(position.row, position.cell) {
                if let Err(err) = self.make_active_cell_editable(None) {
                    tracing::warn!(target: targets::EDIT, %err, "editor not opened");
                }
            }
        }

        if previous != position {
            tracing::trace!(target: targets::GRID, ?position, "active cell changed");
            self.signals.active_cell_changed.emit(position);
        }
    }

    fn set_active_classes(&mut self, position: CellPosition, active: bool) {
        if let Some(nodes) = self.rows.get(position.row).map(|entry| entry.row_nodes.clone()) {
            for node in nodes {
                self.backend.set_class(node, "active", active);
            }
        }
        if let Some(node) = self.rows.cell_node(position.row, position.cell) {
            self.backend.set_class(node, "active", active);
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Move the active cell.
    ///
    /// Any open edit is committed first; if that fails nothing moves. With no
    /// active cell only [`Direction::Next`] and [`Direction::Prev`] move.
    /// Returns `true` if the active cell moved (page moves always succeed).
    pub fn navigate(&mut self, direction: Direction) -> bool {
        if !self.initialized || !self.options.enable_cell_navigation {
            return false;
        }
        if self.active.is_none() && !matches!(direction, Direction::Next | Direction::Prev) {
            return false;
        }
        if !self.session.editor_lock().commit_current_edit() {
            tracing::debug!(target: targets::EDIT, ?direction, "navigation refused: the open edit did not commit");
            self.apply_edit_effects();
            return false;
        }
        self.apply_edit_effects();

        match direction {
            Direction::PageUp => {
                self.scroll_page(-1);
                return true;
            }
            Direction::PageDown => {
                self.scroll_page(1);
                return true;
            }
            Direction::Top => return self.navigate_to_row(0),
            Direction::Bottom => {
                let len = self.data.len();
                return len > 0 && self.navigate_to_row(len - 1);
            }
            _ => {}
        }

        let pos_x = self.active_pos_x;
        let step = match (direction, self.active) {
            (Direction::Next, active) => self.goto_next(active),
            (Direction::Prev, active) => self.goto_prev(active),
            (_, None) => None,
            (Direction::Up, Some(a)) => self.goto_up(a.row, pos_x),
            (Direction::Down, Some(a)) => self.goto_down(a.row, pos_x),
            (Direction::Left, Some(a)) => self.goto_left(a.row, a.cell),
            (Direction::Right, Some(a)) => self.goto_right(a.row, a.cell),
            (Direction::Home, Some(a)) => self.goto_row_start(a.row),
            (Direction::End, Some(a)) => self.goto_row_end(a.row),
            (Direction::PageUp | Direction::PageDown | Direction::Top | Direction::Bottom, Some(_)) => None,
        };

        match step {
            Some(step) => {
                if !self.layout.is_frozen_row(step.row) {
                    self.scroll_cell_into_view(step.row, step.cell, false);
                }
                self.set_active_cell_internal(Some(CellPosition::new(step.row, step.cell)), None);
                self.active_pos_x = step.pos_x;
                true
            }
            None => {
                // Stay put, reopening the editor the commit closed.
                let active = self.active;
                self.set_active_cell_internal(active, None);
                false
            }
        }
    }

    /// Move up.
    pub fn navigate_up(&mut self) -> bool {
        self.navigate(Direction::Up)
    }

    /// Move down.
    pub fn navigate_down(&mut self) -> bool {
        self.navigate(Direction::Down)
    }

    /// Move left.
    pub fn navigate_left(&mut self) -> bool {
        self.navigate(Direction::Left)
    }

    /// Move right.
    pub fn navigate_right(&mut self) -> bool {
        self.navigate(Direction::Right)
    }

    /// Move to the next cell in tab order.
    pub fn navigate_next(&mut self) -> bool {
        self.navigate(Direction::Next)
    }

    /// Move to the previous cell in tab order.
    pub fn navigate_prev(&mut self) -> bool {
        self.navigate(Direction::Prev)
    }

    /// Move to the first focusable cell of the row.
    pub fn navigate_row_start(&mut self) -> bool {
        self.navigate(Direction::Home)
    }

    /// Move to the last focusable cell of the row.
    pub fn navigate_row_end(&mut self) -> bool {
        self.navigate(Direction::End)
    }

    /// Scroll a page up, moving the active cell along.
    pub fn navigate_page_up(&mut self) -> bool {
        self.navigate(Direction::PageUp)
    }

    /// Scroll a page down, moving the active cell along.
    pub fn navigate_page_down(&mut self) -> bool {
        self.navigate(Direction::PageDown)
    }

    /// Move to the first row.
    pub fn navigate_top(&mut self) -> bool {
        self.navigate(Direction::Top)
    }

    /// Move to the last row.
    pub fn navigate_bottom(&mut self) -> bool {
        self.navigate(Direction::Bottom)
    }

    /// Scroll `row` into view and activate its focusable cell nearest to the
    /// remembered column.
    pub fn navigate_to_row(&mut self, row: usize) -> bool {
        let len = self.data.len();
        if row >= len {
            return false;
        }
        self.scroll_cell_into_view(row, 0, true);
        if self.options.enable_cell_navigation && self.active.is_some() {
            let pos_x = self.active_pos_x;
            match self.focusable_cell_at(row, pos_x) {
                Some(cell) => {
                    self.set_active_cell_internal(Some(CellPosition::new(row, cell)), None);
                    self.active_pos_x = pos_x;
                }
                None => self.reset_active_cell(),
            }
        }
        true
    }

    fn scroll_page(&mut self, direction: isize) {
        let row_height = self.options.row_height;
        let page = self.viewport.num_visible_rows as isize;
        let delta = direction * page;
        let top_row = ((self.scroll_top + row_height - 1.0) / row_height).floor() as isize;
        let target = (top_row + delta).max(0) as f32 * row_height;
        self.scroll_to(target);
        self.render();

        let Some(active) = self.active else {
            return;
        };
        if !self.options.enable_cell_navigation || self.data.is_empty() {
            return;
        }
        let last = self.data.len() as isize - 1;
        let row = (active.row as isize + delta).clamp(0, last) as usize;
        let pos_x = self.active_pos_x;
        match self.focusable_cell_at(row, pos_x) {
            Some(cell) => {
                self.set_active_cell_internal(Some(CellPosition::new(row, cell)), None);
                self.active_pos_x = pos_x;
            }
            None => self.reset_active_cell(),
        }
    }

    /// The last focusable cell of `row` starting at or before `pos_x`.
    fn focusable_cell_at(&self, row: usize, pos_x: usize) -> Option<usize> {
        let mut found = None;
        let mut cell = 0;
        while cell <= pos_x && cell < self.columns.len() {
            if self.can_cell_be_active(row, cell) {
                found = Some(cell);
            }
            cell += self.colspan(row, cell);
        }
        found
    }

    fn first_focusable_cell(&self, row: usize) -> Option<usize> {
        let mut cell = 0;
        while cell < self.columns.len() {
            if self.can_cell_be_active(row, cell) {
                return Some(cell);
            }
            cell += self.colspan(row, cell);
        }
        None
    }

    fn last_focusable_cell(&self, row: usize) -> Option<usize> {
        let mut found = None;
        let mut cell = 0;
        while cell < self.columns.len() {
            if self.can_cell_be_active(row, cell) {
                found = Some(cell);
            }
            cell += self.colspan(row, cell);
        }
        found
    }

    fn goto_right(&self, row: usize, cell: usize) -> Option<Step> {
        let count = self.columns.len();
        if cell >= count {
            return None;
        }
        let mut cell = cell;
        loop {
            cell += self.colspan(row, cell);
            if cell >= count {
                return None;
            }
            if self.can_cell_be_active(row, cell) {
                return Some(Step::at(row, cell));
            }
        }
    }

    fn goto_left(&self, row: usize, cell: usize) -> Option<Step> {
        if cell == 0 {
            return None;
        }
        let first = self.first_focusable_cell(row)?;
        if first >= cell {
            return None;
        }
        let mut previous = Step::at(row, first);
        loop {
            let Some(step) = self.goto_right(previous.row, previous.cell) else {
                return Some(previous);
            };
            if step.cell >= cell {
                return Some(previous);
            }
            previous = step;
        }
    }

    /// The cell covering `pos_x` in `row`, if it can be active.
    fn cell_covering_pos(&self, row: usize, pos_x: usize) -> Option<Step> {
        let mut start = 0;
        let mut cell = 0;
        while cell <= pos_x {
            start = cell;
            cell += self.colspan(row, cell);
        }
        self.can_cell_be_active(row, start).then_some(Step {
            row,
            cell: start,
            pos_x,
        })
    }

    fn goto_down(&self, row: usize, pos_x: usize) -> Option<Step> {
        ((row + 1)..self.data.len()).find_map(|row| self.cell_covering_pos(row, pos_x))
    }

    fn goto_up(&self, row: usize, pos_x: usize) -> Option<Step> {
        (0..row).rev().find_map(|row| self.cell_covering_pos(row, pos_x))
    }

    fn goto_row_start(&self, row: usize) -> Option<Step> {
        self.first_focusable_cell(row).map(|cell| Step::at(row, cell))
    }

    fn goto_row_end(&self, row: usize) -> Option<Step> {
        self.last_focusable_cell(row).map(|cell| Step::at(row, cell))
    }

    fn goto_next(&self, from: Option<CellPosition>) -> Option<Step> {
        let len = self.data.len();
        if len == 0 || self.columns.is_empty() {
            return None;
        }
        let from = match from {
            Some(position) => position,
            None if self.can_cell_be_active(0, 0) => return Some(Step::at(0, 0)),
            None => CellPosition::new(0, 0),
        };
        if let Some(step) = self.goto_right(from.row, from.cell) {
            return Some(step);
        }
        // On the last row, cycle through its cells instead of getting stuck.
        let start = (from.row + 1).min(len - 1);
        (start..len).find_map(|row| self.goto_row_start(row))
    }

    fn goto_prev(&self, from: Option<CellPosition>) -> Option<Step> {
        let len = self.data.len();
        let count = self.columns.len();
        if len == 0 || count == 0 {
            return None;
        }
        let from = match from {
            Some(position) => position,
            None if self.can_cell_be_active(len - 1, count - 1) => return Some(Step::at(len - 1, count - 1)),
            None => CellPosition::new(len - 1, count - 1),
        };
        let mut row = from.row;
        let mut cell = from.cell;
        loop {
            if let Some(step) = self.goto_left(row, cell) {
                return Some(step);
            }
            if row == 0 {
                return None;
            }
            row -= 1;
            cell = 0;
            if let Some(step) = self.goto_row_end(row) {
                return Some(step);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::column::Column;
    use crate::model::{Colspan, ColumnMetadata, ItemMetadata, RowItem, Value, VecDataSource, record};
    use crate::options::GridOptions;
    use crate::render::MemoryBackend;

    fn rows(count: usize) -> Vec<RowItem> {
        (0..count)
            .map(|i| RowItem::Data(record([("a", Value::from(i))])))
            .collect()
    }

    fn setup(data: Arc<VecDataSource>, columns: usize) -> Grid<MemoryBackend> {
        Grid::in_memory()
            .data(data)
            .columns((0..columns).map(|i| Column::new(format!("c{i}"), "a")))
            .options(GridOptions::new().with_column_header(false))
            .container_size(800.0, 250.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_navigation_boundaries() {
        let mut grid = setup(Arc::new(VecDataSource::from_rows(rows(5))), 3);
        assert!(!grid.navigate_down());
        assert!(grid.set_active_cell(4, 1));
        assert!(!grid.navigate_down());
        assert_eq!(grid.active_cell(), Some(CellPosition::new(4, 1)));
        assert!(grid.navigate_up());
        assert_eq!(grid.active_cell(), Some(CellPosition::new(3, 1)));

        assert!(grid.set_active_cell(0, 0));
        assert!(!grid.navigate_left());
        assert!(!grid.navigate_up());
        assert!(grid.navigate_row_end());
        assert_eq!(grid.active_cell(), Some(CellPosition::new(0, 2)));
        assert!(!grid.navigate_right());
    }

    #[test]
    fn test_tab_wraps_rows() {
        let mut grid = setup(Arc::new(VecDataSource::from_rows(rows(3))), 2);
        assert!(grid.navigate_next());
        assert_eq!(grid.active_cell(), Some(CellPosition::new(0, 0)));
        grid.navigate_next();
        grid.navigate_next();
        assert_eq!(grid.active_cell(), Some(CellPosition::new(1, 0)));
        assert!(grid.navigate_prev());
        assert_eq!(grid.active_cell(), Some(CellPosition::new(0, 1)));
    }

    #[test]
    fn test_unfocusable_rows_are_skipped() {
        let data = Arc::new(
            VecDataSource::from_rows(rows(4))
                .with_metadata(|row, _| (row == 1).then(|| ItemMetadata::new().with_focusable(false))),
        );
        let mut grid = setup(data, 2);
        assert!(grid.set_active_cell(0, 1));
        assert!(grid.navigate_down());
        assert_eq!(grid.active_cell(), Some(CellPosition::new(2, 1)));
        assert!(!grid.can_cell_be_active(1, 0));
    }

    #[test]
    fn test_vertical_moves_remember_column_through_spans() {
        let data = Arc::new(VecDataSource::from_rows(rows(3)).with_metadata(|row, _| {
            (row == 1).then(|| ItemMetadata::new().with_column_index(0, ColumnMetadata::new().with_colspan(Colspan::Rest)))
        }));
        let mut grid = setup(data, 3);
        assert!(grid.set_active_cell(0, 2));
        assert!(grid.navigate_down());
        assert_eq!(grid.active_cell(), Some(CellPosition::new(1, 0)));
        assert!(grid.navigate_down());
        assert_eq!(grid.active_cell(), Some(CellPosition::new(2, 2)));
    }

    #[test]
    fn test_active_cell_changed_emitted_once_per_change() {
        let mut grid = setup(Arc::new(VecDataSource::from_rows(rows(3))), 2);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        grid.signals().active_cell_changed.connect(move |pos| sink.lock().push(*pos));

        grid.set_active_cell(1, 1);
        grid.set_active_cell(1, 1);
        grid.reset_active_cell();
        assert_eq!(*seen.lock(), vec![Some(CellPosition::new(1, 1)), None]);
    }

    #[test]
    fn test_active_classes_follow_active_cell() {
        let mut grid = setup(Arc::new(VecDataSource::from_rows(rows(3))), 2);
        grid.set_active_cell(1, 0);
        let node = grid.cell_node(1, 0).unwrap();
        assert!(grid.backend().has_class(node, "active"));

        grid.set_active_cell(2, 1);
        assert!(!grid.backend().has_class(node, "active"));
        let row = grid.row_nodes(2).unwrap()[0];
        assert!(grid.backend().has_class(row, "active"));
    }

    #[test]
    fn test_page_down_moves_active_row() {
        let mut grid = setup(Arc::new(VecDataSource::from_rows(rows(100))), 1);
        grid.set_active_cell(0, 0);
        assert!(grid.navigate_page_down());
        assert_eq!(grid.active_cell(), Some(CellPosition::new(10, 0)));
        assert_eq!(grid.scroll_position().0, 250.0);
        assert!(grid.navigate_bottom());
        assert_eq!(grid.active_cell(), Some(CellPosition::new(99, 0)));
    }
}
