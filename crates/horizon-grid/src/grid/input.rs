//! Pointer and keyboard input, and header sorting.

use horizon_grid_core::logging::targets;

use super::{Direction, Grid};
use crate::column::ColumnSort;
use crate::error::{GridError, Result};
use crate::render::RenderBackend;
use crate::signals::{CellClick, CellPosition, SortEvent, Veto};

/// Keyboard modifiers held during input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held.
    pub alt: bool,
    /// The Meta key is held.
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Alt modifier only.
    pub const ALT: Self = Self {
        shift: false,
        control: false,
        alt: true,
        meta: false,
    };

    /// Meta modifier only.
    pub const META: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: true,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// Keys the grid reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Tab,
    Escape,
    F2,
    /// Any key the grid ignores.
    Unknown,
}

/// How a header click changes the sort columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SortModifier {
    /// Sort by this column only.
    #[default]
    Replace,
    /// Add the column to the sort, or flip its direction.
    Add,
    /// Drop the column from a multi-column sort.
    Remove,
}

impl<B: RenderBackend> Grid<B> {
    /// A click on a cell.
    ///
    /// Clicks on the edited cell go to the editor. Otherwise `click` is
    /// emitted and, unless a slot marked it handled, the cell becomes active
    /// once the open edit commits. Returns `true` if the active cell moved.
    pub fn handle_click(&mut self, row: usize, cell: usize) -> bool {
        let cell = self.span_start(row, cell);
        if self.is_editing_cell(row, cell) {
            self.session.with_editor(|editor| editor.pre_click());
            return false;
        }

        let handled = Veto::default();
        self.signals.click.emit(CellClick {
            row,
            cell,
            handled: handled.clone(),
        });
        if handled.is_set() {
            return false;
        }
        let position = CellPosition::new(row, cell);
        if self.active == Some(position) || !self.can_cell_be_active(row, cell) {
            return false;
        }

        let lock = self.session.editor_lock();
        if lock.is_active() && !lock.commit_current_edit() {
            tracing::debug!(target: targets::EDIT, row, cell, "click refused: the open edit did not commit");
            self.apply_edit_effects();
            return false;
        }
        self.apply_edit_effects();
        self.scroll_row_into_view(row, false);
        self.set_active_cell_internal(Some(position), None);
        true
    }

    /// A double click on a cell: emits `dbl_click` and, on an editable grid,
    /// opens the cell's editor.
    pub fn handle_dbl_click(&mut self, row: usize, cell: usize) -> bool {
        let cell = self.span_start(row, cell);
        if self.is_editing_cell(row, cell) {
            return false;
        }
        let handled = Veto::default();
        self.signals.dbl_click.emit(CellClick {
            row,
            cell,
            handled: handled.clone(),
        });
        if handled.is_set() || !self.options.editable {
            return false;
        }
        self.goto_cell(row, cell, true)
    }

    /// A key press. Returns `true` if the grid handled it.
    ///
    /// Arrows, Home/End, PageUp/PageDown, Tab and Shift+Tab navigate,
    /// Ctrl+Home/Ctrl+End go to the first and last row, Enter commits or
    /// opens the editor, F2 opens it and Escape cancels.
    pub fn handle_key_down(&mut self, key: Key, modifiers: KeyboardModifiers) -> bool {
        if modifiers == KeyboardModifiers::CTRL {
            return match key {
                Key::Home => self.navigate(Direction::Top),
                Key::End => self.navigate(Direction::Bottom),
                _ => false,
            };
        }
        if modifiers == KeyboardModifiers::SHIFT {
            return key == Key::Tab && self.options.enable_tab_key_navigation && self.navigate(Direction::Prev);
        }
        if modifiers.any() {
            return false;
        }

        match key {
            Key::Escape => {
                if !self.session.editor_lock().is_active() {
                    return false;
                }
                self.cancel_edit_and_set_focus();
                true
            }
            Key::PageDown => self.navigate(Direction::PageDown),
            Key::PageUp => self.navigate(Direction::PageUp),
            Key::ArrowLeft => self.navigate(Direction::Left),
            Key::ArrowRight => self.navigate(Direction::Right),
            Key::ArrowUp => self.navigate(Direction::Up),
            Key::ArrowDown => self.navigate(Direction::Down),
            Key::Home => self.navigate(Direction::Home),
            Key::End => self.navigate(Direction::End),
            Key::Tab => self.options.enable_tab_key_navigation && self.navigate(Direction::Next),
            Key::Enter => {
                if self.options.editable && self.session.is_editing() {
                    self.commit_edit_and_set_focus();
                } else if self.session.editor_lock().commit_current_edit() {
                    self.apply_edit_effects();
                    self.open_editor_from_key();
                }
                true
            }
            Key::F2 => {
                if self.session.editor_lock().commit_current_edit() {
                    self.apply_edit_effects();
                    self.open_editor_from_key();
                }
                true
            }
            Key::Unknown => false,
        }
    }

    fn open_editor_from_key(&mut self) {
        if let Err(err) = self.make_active_cell_editable(None) {
            tracing::warn!(target: targets::EDIT, %err, "editor not opened");
        }
    }

    /// Start column of the rendered cell covering `cell`.
    fn span_start(&self, row: usize, cell: usize) -> usize {
        self.rows
            .get(row)
            .and_then(|entry| entry.cell_covering(cell))
            .map_or(cell, |(start, _)| start)
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// The sort columns in priority order.
    pub fn sort_columns(&self) -> &[ColumnSort] {
        &self.sort_columns
    }

    /// Replace the sort indicators. Entries naming unknown columns are
    /// dropped. No signal is emitted; sorting the data is up to the caller.
    pub fn set_sort_columns(&mut self, sorts: impl IntoIterator<Item = ColumnSort>) {
        self.sort_columns = sorts
            .into_iter()
            .filter(|sort| self.initial_columns.iter().any(|c| c.id == sort.column_id))
            .collect();
        tracing::debug!(target: targets::GRID, sorts = self.sort_columns.len(), "sort columns set");
    }

    /// Sort by one column.
    pub fn set_sort_column(&mut self, column_id: &str, ascending: bool) {
        self.set_sort_columns([ColumnSort::new(column_id, ascending)]);
    }

    /// A click on a sortable header.
    ///
    /// Without multi-column sorting every modifier behaves like
    /// [`SortModifier::Replace`]. Emits `sort` with the new sort columns and
    /// returns `Ok(true)`; returns `Ok(false)` for columns that are not
    /// sortable or when the open edit refused to commit.
    ///
    /// # Errors
    ///
    /// [`GridError::UnknownColumn`].
    pub fn toggle_sort(&mut self, column_id: &str, modifier: SortModifier) -> Result<bool> {
        let Some(column) = self.columns.iter().find(|c| c.id == column_id).cloned() else {
            return Err(GridError::UnknownColumn(column_id.to_string()));
        };
        if !column.sortable {
            return Ok(false);
        }
        if !self.session.editor_lock().commit_current_edit() {
            self.apply_edit_effects();
            return Ok(false);
        }

        let multi = self.options.multi_column_sort;
        let mut sorts = std::mem::take(&mut self.sort_columns);
        let existing = sorts.iter().position(|s| s.column_id == column.id);
        if let Some(index) = existing {
            sorts[index].sort_asc = !sorts[index].sort_asc;
        }

        if modifier == SortModifier::Remove && multi {
            if let Some(index) = existing {
                sorts.remove(index);
            }
        } else {
            let sort = existing
                .map(|index| sorts[index].clone())
                .unwrap_or_else(|| ColumnSort::new(column.id.clone(), column.default_sort_asc));
            if modifier == SortModifier::Replace || !multi {
                sorts.clear();
            }
            if existing.is_none() || sorts.is_empty() {
                sorts.push(sort);
            }
        }

        self.sort_columns = sorts.clone();
        tracing::debug!(target: targets::GRID, column = %column.id, ?modifier, sorts = sorts.len(), "sort toggled");
        self.signals.sort.emit(SortEvent {
            multi_column_sort: multi,
            sort_columns: sorts,
        });
        Ok(true)
    }
}
