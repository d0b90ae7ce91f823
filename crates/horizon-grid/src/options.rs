//! Grid configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::column::Column;
use crate::edit::{EditCommandHandler, EditorFactory, EditorLock};
use crate::format::{Formatter, FormatterFactory, default_formatter};
use crate::model::{RowItem, Value};

/// Extracts the value of a column from a row item, replacing
/// `item.value(&column.field)`.
pub type ValueExtractor = Arc<dyn Fn(&RowItem, &Column) -> Value + Send + Sync>;

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f32 = 25.0;

/// Options controlling grid behavior.
///
/// Change options on a live grid with [`Grid::set_options`](crate::Grid::set_options).
///
/// # Example
///
/// ```
/// use horizon_grid::GridOptions;
///
/// let options = GridOptions::default()
///     .with_row_height(30.0)
///     .with_editable(true)
///     .with_frozen_columns(1);
/// assert_eq!(options.min_buffer, 3);
/// ```
#[derive(Clone)]
pub struct GridOptions {
    // =========================================================================
    // Geometry
    // =========================================================================
    /// Height of every row in pixels.
    pub row_height: f32,
    /// Width given to columns that do not set one.
    pub default_column_width: f32,
    /// Horizontal padding and border of a cell, subtracted from its width.
    pub cell_width_diff: f32,
    /// Show the column header strip.
    pub show_column_header: bool,
    /// Height of the column header strip.
    pub header_height: f32,
    /// Show the header row below the column headers.
    pub show_header_row: bool,
    /// Height of the header row.
    pub header_row_height: f32,
    /// Show the footer row.
    pub show_footer_row: bool,
    /// Height of the footer row.
    pub footer_row_height: f32,

    // =========================================================================
    // Virtualization
    // =========================================================================
    /// Rows rendered beyond the visible ones on each side.
    pub min_buffer: usize,
    /// Render every column of rendered rows instead of the visible ones.
    pub render_all_cells: bool,
    /// Always render synchronously on scroll.
    pub force_sync_scrolling: bool,
    /// Run column async post-render callbacks.
    pub enable_async_post_render: bool,
    /// Run column async post-render cleanup callbacks.
    pub enable_async_post_render_cleanup: bool,
    /// Delay between async post-render ticks.
    pub async_post_render_delay: Duration,
    /// Delay between async cleanup ticks.
    pub async_post_cleanup_delay: Duration,

    // =========================================================================
    // Frozen panes
    // =========================================================================
    /// Number of leading columns pinned, when no column is flagged frozen.
    pub frozen_columns: Option<usize>,
    /// Number of rows pinned.
    pub frozen_rows: Option<usize>,
    /// Pin frozen rows to the bottom instead of the top.
    pub frozen_bottom: bool,

    // =========================================================================
    // Interaction
    // =========================================================================
    /// Allow editing.
    pub editable: bool,
    /// Start editing as soon as a cell becomes active.
    pub auto_edit: bool,
    /// Allow keyboard navigation and programmatic active cell changes.
    pub enable_cell_navigation: bool,
    /// Tab and Shift+Tab move between cells.
    pub enable_tab_key_navigation: bool,
    /// Allow sorting by several columns.
    pub multi_column_sort: bool,
    /// Allow several selected rows.
    pub multi_select: bool,
    /// Css class of selected cells.
    pub selected_cell_css_class: String,
    /// Skip `init()` during construction.
    pub explicit_initialization: bool,

    // =========================================================================
    // Collaborators
    // =========================================================================
    /// Editor lock to coordinate with; the global lock if `None`.
    pub editor_lock: Option<Arc<EditorLock>>,
    /// Receives edit commands instead of executing them directly.
    pub edit_command_handler: Option<EditCommandHandler>,
    /// Editor for columns without one.
    pub editor_factory: Option<Arc<dyn EditorFactory>>,
    /// Formatter for columns without one.
    pub formatter_factory: Option<Arc<dyn FormatterFactory>>,
    /// Formatter of last resort.
    pub default_formatter: Formatter,
    /// Replaces field lookup when extracting cell values.
    pub data_item_column_value_extractor: Option<ValueExtractor>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            default_column_width: crate::column::DEFAULT_COLUMN_WIDTH,
            cell_width_diff: 0.0,
            show_column_header: true,
            header_height: DEFAULT_ROW_HEIGHT,
            show_header_row: false,
            header_row_height: DEFAULT_ROW_HEIGHT,
            show_footer_row: false,
            footer_row_height: DEFAULT_ROW_HEIGHT,
            min_buffer: 3,
            render_all_cells: false,
            force_sync_scrolling: false,
            enable_async_post_render: false,
            enable_async_post_render_cleanup: false,
            async_post_render_delay: Duration::from_millis(25),
            async_post_cleanup_delay: Duration::from_millis(40),
            frozen_columns: None,
            frozen_rows: None,
            frozen_bottom: false,
            editable: false,
            auto_edit: true,
            enable_cell_navigation: true,
            enable_tab_key_navigation: true,
            multi_column_sort: false,
            multi_select: true,
            selected_cell_css_class: "selected".to_string(),
            explicit_initialization: false,
            editor_lock: None,
            edit_command_handler: None,
            editor_factory: None,
            formatter_factory: None,
            default_formatter: default_formatter(),
            data_item_column_value_extractor: None,
        }
    }
}

impl GridOptions {
    /// Create the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row height.
    pub fn with_row_height(mut self, height: f32) -> Self {
        self.row_height = height;
        self
    }

    /// Set the fixed buffer size.
    pub fn with_min_buffer(mut self, rows: usize) -> Self {
        self.min_buffer = rows;
        self
    }

    /// Show or hide the column header strip.
    pub fn with_column_header(mut self, show: bool) -> Self {
        self.show_column_header = show;
        self
    }

    /// Allow editing.
    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Start editing when a cell becomes active.
    pub fn with_auto_edit(mut self, auto_edit: bool) -> Self {
        self.auto_edit = auto_edit;
        self
    }

    /// Pin the leading `count` columns.
    pub fn with_frozen_columns(mut self, count: usize) -> Self {
        self.frozen_columns = Some(count);
        self
    }

    /// Pin `count` rows.
    pub fn with_frozen_rows(mut self, count: usize) -> Self {
        self.frozen_rows = Some(count);
        self
    }

    /// Pin frozen rows to the bottom.
    pub fn with_frozen_bottom(mut self, bottom: bool) -> Self {
        self.frozen_bottom = bottom;
        self
    }

    /// Enable async post-render and, optionally, its cleanup.
    pub fn with_async_post_render(mut self, enabled: bool, cleanup: bool) -> Self {
        self.enable_async_post_render = enabled;
        self.enable_async_post_render_cleanup = cleanup;
        self
    }

    /// Always render synchronously on scroll.
    pub fn with_force_sync_scrolling(mut self, force: bool) -> Self {
        self.force_sync_scrolling = force;
        self
    }

    /// Render all columns of rendered rows.
    pub fn with_render_all_cells(mut self, all: bool) -> Self {
        self.render_all_cells = all;
        self
    }

    /// Allow multi-column sorting.
    pub fn with_multi_column_sort(mut self, multi: bool) -> Self {
        self.multi_column_sort = multi;
        self
    }

    /// Skip initialization during construction.
    pub fn with_explicit_initialization(mut self, explicit: bool) -> Self {
        self.explicit_initialization = explicit;
        self
    }

    /// Coordinate edits through `lock`.
    pub fn with_editor_lock(mut self, lock: Arc<EditorLock>) -> Self {
        self.editor_lock = Some(lock);
        self
    }

    /// Route edit commands through `handler`.
    pub fn with_edit_command_handler(mut self, handler: EditCommandHandler) -> Self {
        self.edit_command_handler = Some(handler);
        self
    }

    /// Editor for columns without one.
    pub fn with_editor_factory(mut self, factory: Arc<dyn EditorFactory>) -> Self {
        self.editor_factory = Some(factory);
        self
    }

    /// Formatter for columns without one.
    pub fn with_formatter_factory(mut self, factory: Arc<dyn FormatterFactory>) -> Self {
        self.formatter_factory = Some(factory);
        self
    }

    /// Total height of header and footer strips.
    pub fn chrome_height(&self) -> f32 {
        let mut height = 0.0;
        if self.show_column_header {
            height += self.header_height;
        }
        if self.show_header_row {
            height += self.header_row_height;
        }
        if self.show_footer_row {
            height += self.footer_row_height;
        }
        height
    }

    /// Returns `true` if any option asks for frozen panes.
    pub fn wants_frozen_layout(&self) -> bool {
        self.frozen_columns.is_some_and(|n| n > 0) || self.frozen_rows.is_some_and(|n| n > 0)
    }
}

impl fmt::Debug for GridOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridOptions")
            .field("row_height", &self.row_height)
            .field("min_buffer", &self.min_buffer)
            .field("frozen_columns", &self.frozen_columns)
            .field("frozen_rows", &self.frozen_rows)
            .field("frozen_bottom", &self.frozen_bottom)
            .field("editable", &self.editable)
            .field("auto_edit", &self.auto_edit)
            .field("enable_async_post_render", &self.enable_async_post_render)
            .field("render_all_cells", &self.render_all_cells)
            .finish_non_exhaustive()
    }
}
