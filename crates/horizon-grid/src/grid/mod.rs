//! The grid engine.
//!
//! [`Grid`] owns the render backend, the layout engine, the row cache and the
//! active cell. All of its state is mutated on the thread that owns it:
//! data-source and selection notifications are queued and drained at the
//! start of each turn ([`Grid::render`], [`Grid::process_events`]), and
//! deferred work runs from [`Grid::process_timers`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_grid::{Column, Grid, GridOptions};
//! use horizon_grid::model::{record, RowItem, Value, VecDataSource};
//! use horizon_grid::render::MemoryBackend;
//!
//! let rows = (0..1000)
//!     .map(|i| RowItem::Data(record([("title", Value::from(format!("Task {i}")))])))
//!     .collect();
//! let data = Arc::new(VecDataSource::from_rows(rows));
//!
//! let mut grid = Grid::builder(MemoryBackend::new())
//!     .data(data.clone())
//!     .columns([Column::new("title", "title").with_width(200.0)])
//!     .options(GridOptions::new().with_row_height(25.0))
//!     .container_size(400.0, 500.0)
//!     .build()
//!     .unwrap();
//!
//! assert!(grid.rendered_range().contains(&grid.visible_range()));
//! grid.set_scroll_position(2500.0, 0.0);
//! assert_eq!(grid.visible_range().top, 100);
//! ```

/// The layout host view of a grid, borrowing only the fields it reads.
macro_rules! layout_host {
    ($grid:expr) => {
        $crate::grid::GridHost {
            columns: &$grid.columns,
            options: &$grid.options,
            data_length: $grid.data.len(),
            container: $grid.container,
            scroll_top: $grid.scroll_top,
            scroll_left: $grid.scroll_left,
        }
    };
}

mod editing;
mod input;
mod navigation;
mod render;
mod scroll;
mod styles;

pub use input::{Key, KeyboardModifiers, SortModifier};
pub use navigation::Direction;
pub use styles::CellStyles;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use horizon_grid_core::logging::targets;
use horizon_grid_core::{ConnectionId, TimerId, TimerManager};

use crate::column::{Column, ColumnSort};
use crate::edit::session::EditSession;
use crate::edit::{EditController, EditRequest, EditorHost, EditorLock};
use crate::error::{GridError, Result};
use crate::layout::{BasicLayout, FrozenLayout, LayoutEngine, LayoutHost, Size, ViewportInfo};
use crate::model::{CellRange, DataSource, ItemMetadata, RowCountChange, RowItem, SelectionModel};
use crate::options::GridOptions;
use crate::render::post_process::PostProcessor;
use crate::render::row_cache::RowCache;
use crate::render::{MemoryBackend, NodeId, RenderBackend};
use crate::signals::{CellPosition, GridSignals};
use crate::viewport::{ScrollTracker, ViewRange};

/// Container size used when the builder is not given one.
pub const DEFAULT_CONTAINER_SIZE: Size = Size::new(800.0, 600.0);

pub(crate) struct GridHost<'a> {
    pub columns: &'a [Arc<Column>],
    pub options: &'a GridOptions,
    pub data_length: usize,
    pub container: Size,
    pub scroll_top: f32,
    pub scroll_left: f32,
}

impl LayoutHost for GridHost<'_> {
    fn columns(&self) -> &[Arc<Column>] {
        self.columns
    }

    fn options(&self) -> &GridOptions {
        self.options
    }

    fn data_length(&self) -> usize {
        self.data_length
    }

    fn container_size(&self) -> Size {
        self.container
    }

    fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    fn scroll_left(&self) -> f32 {
        self.scroll_left
    }
}

/// Notifications forwarded from collaborator signals.
#[derive(Debug)]
pub(crate) enum GridMessage {
    RowCountChanged(RowCountChange),
    RowsChanged(Vec<usize>),
    DataChanged,
    SelectedRangesChanged(Vec<CellRange>),
}

struct DataConnections {
    row_count: ConnectionId,
    rows: ConnectionId,
    data: ConnectionId,
}

impl DataConnections {
    fn connect(data: &dyn DataSource, sender: &Sender<GridMessage>) -> Self {
        let signals = data.signals();
        let tx = sender.clone();
        let row_count = signals.row_count_changed.connect(move |change| {
            // The grid is gone when the receiver is.
            let _ = tx.send(GridMessage::RowCountChanged(*change));
        });
        let tx = sender.clone();
        let rows = signals.rows_changed.connect(move |rows| {
            let _ = tx.send(GridMessage::RowsChanged(rows.clone()));
        });
        let tx = sender.clone();
        let data = signals.data_changed.connect(move |_| {
            let _ = tx.send(GridMessage::DataChanged);
        });
        Self { row_count, rows, data }
    }

    fn disconnect(&self, data: &dyn DataSource) {
        let signals = data.signals();
        signals.row_count_changed.disconnect(self.row_count);
        signals.rows_changed.disconnect(self.rows);
        signals.data_changed.disconnect(self.data);
    }
}

#[derive(Debug, Default)]
struct Timers {
    manager: TimerManager,
    render: Option<TimerId>,
    post_render: Option<TimerId>,
    post_cleanup: Option<TimerId>,
}

impl Timers {
    fn restart(manager: &mut TimerManager, slot: &mut Option<TimerId>, delay: Duration) {
        if let Some(id) = slot.take() {
            // Already fired or stopped.
            let _ = manager.stop(id);
        }
        *slot = Some(manager.start_one_shot(Instant::now(), delay));
    }

    fn cancel(manager: &mut TimerManager, slot: &mut Option<TimerId>) {
        if let Some(id) = slot.take() {
            let _ = manager.stop(id);
        }
    }
}

/// Builder for [`Grid`].
pub struct GridBuilder<B: RenderBackend> {
    backend: B,
    data: Option<Arc<dyn DataSource>>,
    columns: Vec<Column>,
    options: GridOptions,
    container: Size,
    layout: Option<Box<dyn LayoutEngine>>,
    selection_model: Option<Arc<dyn SelectionModel>>,
}

impl<B: RenderBackend> GridBuilder<B> {
    fn new(backend: B) -> Self {
        Self {
            backend,
            data: None,
            columns: Vec::new(),
            options: GridOptions::default(),
            container: DEFAULT_CONTAINER_SIZE,
            layout: None,
            selection_model: None,
        }
    }

    /// Set the data source. Defaults to an empty one.
    pub fn data(mut self, data: Arc<dyn DataSource>) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the columns.
    pub fn columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns = columns.into_iter().collect();
        self
    }

    /// Set the options.
    pub fn options(mut self, options: GridOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the size of the container the grid lays itself out in.
    pub fn container_size(mut self, width: f32, height: f32) -> Self {
        self.container = Size::new(width, height);
        self
    }

    /// Use a specific layout engine instead of picking one from the options.
    pub fn layout(mut self, layout: Box<dyn LayoutEngine>) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Attach a selection model.
    pub fn selection_model(mut self, model: Arc<dyn SelectionModel>) -> Self {
        self.selection_model = Some(model);
        self
    }

    /// Build the grid, and initialize it unless the options ask for
    /// explicit initialization.
    ///
    /// # Errors
    ///
    /// [`GridError::DuplicateColumnId`] for repeated column ids, and the
    /// layout engine's configuration errors from [`Grid::init`].
    pub fn build(self) -> Result<Grid<B>> {
        check_unique_ids(&self.columns)?;

        let layout = self.layout.unwrap_or_else(|| {
            let frozen = self.options.wants_frozen_layout() || self.columns.iter().any(|c| c.frozen);
            if frozen {
                Box::new(FrozenLayout::new()) as Box<dyn LayoutEngine>
            } else {
                Box::new(BasicLayout::new())
            }
        });
        let data = self
            .data
            .unwrap_or_else(|| Arc::new(crate::model::VecDataSource::empty()));

        let signals = Arc::new(GridSignals::new());
        let lock = self.options.editor_lock.clone().unwrap_or_else(EditorLock::global);
        let session = Arc::new(EditSession::new(lock, signals.clone()));
        session.set_handler(self.options.edit_command_handler.clone());

        let (sender, receiver) = crossbeam_channel::unbounded();
        let connections = DataConnections::connect(data.as_ref(), &sender);

        tracing::debug!(
            target: targets::GRID,
            layout = layout.layout_name(),
            columns = self.columns.len(),
            rows = data.len(),
            "grid created"
        );

        let mut grid = Grid {
            backend: self.backend,
            layout,
            data,
            data_connections: connections,
            sender,
            receiver,
            initial_columns: self.columns.into_iter().map(Arc::new).collect(),
            columns: Vec::new(),
            column_index: HashMap::new(),
            options: self.options,
            container: self.container,
            viewport: ViewportInfo::default(),
            scroll_top: 0.0,
            scroll_left: 0.0,
            last_rendered_scroll_top: 0.0,
            last_rendered_scroll_left: 0.0,
            scroll_tracker: ScrollTracker::new(),
            rows: RowCache::new(),
            rendered_range: ViewRange::default(),
            columns_moved: false,
            post: PostProcessor::new(),
            timers: Timers::default(),
            active: None,
            active_pos_x: 0,
            session,
            editor_host: EditorHost::new(),
            signals,
            selection_model: None,
            selected_rows: Vec::new(),
            cell_css_classes: BTreeMap::new(),
            sort_columns: Vec::new(),
            initialized: false,
        };
        grid.update_view_columns();
        if let Some(model) = self.selection_model {
            grid.set_selection_model(model);
        }
        if !grid.options.explicit_initialization {
            grid.init()?;
        }
        Ok(grid)
    }
}

fn check_unique_ids<'a>(columns: impl IntoIterator<Item = &'a Column>) -> Result<()> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.id.as_str()) {
            return Err(GridError::DuplicateColumnId(column.id.clone()));
        }
    }
    Ok(())
}

/// A virtualized data grid.
///
/// Only the rows inside the viewport (plus a buffer) exist in the render
/// tree. Rows leaving the range are released, rows entering it are created,
/// and rows whose data changed are refreshed in place.
pub struct Grid<B: RenderBackend = MemoryBackend> {
    backend: B,
    layout: Box<dyn LayoutEngine>,
    data: Arc<dyn DataSource>,
    data_connections: DataConnections,
    sender: Sender<GridMessage>,
    receiver: Receiver<GridMessage>,

    initial_columns: Vec<Arc<Column>>,
    /// Visible columns in view order.
    columns: Vec<Arc<Column>>,
    column_index: HashMap<String, usize>,
    options: GridOptions,

    container: Size,
    viewport: ViewportInfo,
    scroll_top: f32,
    scroll_left: f32,
    last_rendered_scroll_top: f32,
    last_rendered_scroll_left: f32,
    scroll_tracker: ScrollTracker,

    rows: RowCache,
    rendered_range: ViewRange,
    /// Column offsets moved since the last render; every row needs a cell pass.
    columns_moved: bool,
    post: PostProcessor,
    timers: Timers,

    active: Option<CellPosition>,
    /// Column the active cell was reached from, kept across colspans.
    active_pos_x: usize,
    session: Arc<EditSession>,
    editor_host: EditorHost,
    signals: Arc<GridSignals>,

    selection_model: Option<(Arc<dyn SelectionModel>, ConnectionId)>,
    selected_rows: Vec<usize>,
    cell_css_classes: BTreeMap<String, CellStyles>,
    sort_columns: Vec<ColumnSort>,
    initialized: bool,
}

impl Grid<MemoryBackend> {
    /// Start building a grid rendering into an in-memory tree.
    pub fn in_memory() -> GridBuilder<MemoryBackend> {
        GridBuilder::new(MemoryBackend::new())
    }
}

impl<B: RenderBackend> Grid<B> {
    /// Start building a grid rendering into `backend`.
    pub fn builder(backend: B) -> GridBuilder<B> {
        GridBuilder::new(backend)
    }

    /// Create the panes, size the canvas and render the first rows.
    ///
    /// Called by [`GridBuilder::build`] unless
    /// [`GridOptions::explicit_initialization`] is set. Calling it again is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Frozen counts that exceed the columns or rows.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        {
            let host = layout_host!(self);
            self.layout.init(&host, &mut self.backend)?;
        }
        self.check_frozen_counts()?;
        self.update_view_columns();
        self.relayout();
        self.initialized = true;
        tracing::debug!(target: targets::GRID, layout = self.layout.layout_name(), "grid initialized");
        self.render();
        Ok(())
    }

    /// Returns `true` once [`init`](Self::init) ran.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The render backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The render backend, mutably. Changing nodes the grid owns is at the
    /// caller's risk.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The grid's signals.
    pub fn signals(&self) -> &Arc<GridSignals> {
        &self.signals
    }

    /// The layout engine.
    pub fn layout(&self) -> &dyn LayoutEngine {
        self.layout.as_ref()
    }

    /// Current options.
    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// Visible columns in view order.
    pub fn columns(&self) -> &[Arc<Column>] {
        &self.columns
    }

    /// Columns as given, including hidden ones.
    pub fn initial_columns(&self) -> &[Arc<Column>] {
        &self.initial_columns
    }

    /// View index of the column with `id`.
    pub fn column_index(&self, id: &str) -> Option<usize> {
        self.column_index.get(id).copied()
    }

    /// The data source.
    pub fn data(&self) -> &Arc<dyn DataSource> {
        &self.data
    }

    /// Number of rows.
    pub fn data_length(&self) -> usize {
        self.data.len()
    }

    /// The row at `row`.
    pub fn data_item(&self, row: usize) -> Option<RowItem> {
        self.data.item(row)
    }

    /// Container size.
    pub fn container_size(&self) -> Size {
        self.container
    }

    /// Geometry computed by the last resize.
    pub fn viewport_info(&self) -> ViewportInfo {
        self.viewport
    }

    /// The editor lock this grid registers its edits with.
    pub fn editor_lock(&self) -> Arc<EditorLock> {
        self.session.editor_lock()
    }

    /// Returns `true` while this grid has an editor open.
    pub fn is_editing(&self) -> bool {
        self.session.is_editing()
    }

    /// Handle editors use to request commit or cancel.
    pub fn editor_host(&self) -> EditorHost {
        self.editor_host.clone()
    }

    /// Rendered row indices, ascending.
    pub fn rendered_rows(&self) -> Vec<usize> {
        self.rows.rows()
    }

    /// Row nodes of a rendered row, one per pane column.
    pub fn row_nodes(&self, row: usize) -> Option<&[NodeId]> {
        self.rows.get(row).map(|entry| entry.row_nodes.as_slice())
    }

    /// Node of the rendered cell starting at `cell`.
    pub fn cell_node(&self, row: usize, cell: usize) -> Option<NodeId> {
        self.rows.cell_node(row, cell)
    }

    /// Column indices of the rendered cells of a row, ascending.
    pub fn rendered_cells(&self, row: usize) -> Vec<usize> {
        self.rows
            .get(row)
            .map(|entry| entry.cells.keys().copied().collect())
            .unwrap_or_default()
    }

    // =========================================================================
    // Options, columns and data
    // =========================================================================

    /// Change options at runtime.
    ///
    /// Any open edit is committed first; if that fails the change is refused
    /// and `Ok(false)` is returned. Frozen counts are validated again, and
    /// the previous options are restored on error.
    ///
    /// # Errors
    ///
    /// Frozen counts that exceed the columns or rows.
    pub fn set_options(&mut self, change: impl FnOnce(&mut GridOptions)) -> Result<bool> {
        if !self.session.editor_lock().commit_current_edit() {
            tracing::warn!(target: targets::GRID, "options change refused: the open edit did not commit");
            return Ok(false);
        }
        let previous = self.options.clone();
        change(&mut self.options);

        if let Err(err) = self.apply_layout_change() {
            self.options = previous;
            // The previous configuration was accepted before.
            let _ = self.apply_layout_change();
            tracing::warn!(target: targets::LAYOUT, %err, "options change rejected");
            return Err(err);
        }

        let lock = self.options.editor_lock.clone().unwrap_or_else(EditorLock::global);
        self.session.set_editor_lock(lock);
        self.session.set_handler(self.options.edit_command_handler.clone());
        if !self.options.enable_async_post_render {
            Timers::cancel(&mut self.timers.manager, &mut self.timers.post_render);
        }
        self.after_structure_change();
        Ok(true)
    }

    /// Replace the columns.
    ///
    /// # Errors
    ///
    /// [`GridError::DuplicateColumnId`], or frozen counts that no longer fit.
    /// The previous columns stay in place on error.
    pub fn set_columns(&mut self, columns: impl IntoIterator<Item = Column>) -> Result<()> {
        let columns: Vec<Column> = columns.into_iter().collect();
        check_unique_ids(&columns)?;
        let previous = std::mem::replace(
            &mut self.initial_columns,
            columns.into_iter().map(Arc::new).collect(),
        );
        self.update_view_columns();
        if let Err(err) = self.apply_layout_change() {
            self.initial_columns = previous;
            self.update_view_columns();
            let _ = self.apply_layout_change();
            return Err(err);
        }
        if let Some(active) = self.active {
            if active.cell >= self.columns.len() {
                self.reset_active_cell();
            }
        }
        self.after_structure_change();
        Ok(())
    }

    /// Set the width of a column, clamped to its limits.
    ///
    /// Rendered cells are repositioned; columns flagged
    /// [`rerender_on_resize`](Column::rerender_on_resize) re-render every row.
    ///
    /// # Errors
    ///
    /// [`GridError::UnknownColumn`].
    pub fn set_column_width(&mut self, id: &str, width: f32) -> Result<()> {
        let Some(position) = self.initial_columns.iter().position(|c| c.id == id) else {
            return Err(GridError::UnknownColumn(id.to_string()));
        };
        let mut column = (*self.initial_columns[position]).clone();
        column.width = column.clamp_width(width);
        let rerender = column.rerender_on_resize;
        let column = Arc::new(column);
        self.initial_columns[position] = column.clone();
        if let Some(index) = self.column_index(id) {
            self.columns[index] = column;
        }

        self.relayout();
        if rerender {
            self.invalidate_all_rows();
        } else {
            self.reposition_cells();
        }
        self.signals.columns_resized.emit(());
        self.render();
        Ok(())
    }

    /// Replace the data source.
    ///
    /// An edit open in this grid is cancelled: its item belongs to the old
    /// data.
    pub fn set_data(&mut self, data: Arc<dyn DataSource>, scroll_to_top: bool) {
        if self.session.is_editing() {
            self.session.cancel_current_edit();
        }
        self.data_connections.disconnect(self.data.as_ref());
        // Anything queued refers to the old data.
        while self.receiver.try_recv().is_ok() {}
        self.data = data;
        self.data_connections = DataConnections::connect(self.data.as_ref(), &self.sender);
        tracing::debug!(target: targets::GRID, rows = self.data.len(), "data source replaced");

        self.invalidate_all_rows();
        self.update_row_count();
        if scroll_to_top {
            self.scroll_to(0.0);
        }
        self.render();
    }

    /// Resize the container.
    pub fn set_container_size(&mut self, width: f32, height: f32) {
        self.container = Size::new(width, height);
        self.resize_canvas();
    }

    /// Recompute pane geometry from the container and re-render.
    pub fn resize_canvas(&mut self) {
        if !self.initialized {
            return;
        }
        let _span = horizon_grid_core::PerfSpan::new(horizon_grid_core::logging::span_names::RESIZE);
        self.relayout();
        self.clamp_scroll();
        self.render();
    }

    // =========================================================================
    // Event loop integration
    // =========================================================================

    /// Drain queued notifications and editor requests, then render if
    /// anything changed. Returns `true` if there was work.
    pub fn process_events(&mut self) -> bool {
        let mut changed = false;
        if let Some(request) = self.editor_host.take_request() {
            changed = true;
            match request {
                EditRequest::Commit => self.commit_edit_and_set_focus(),
                EditRequest::Cancel => self.cancel_edit_and_set_focus(),
            }
        }
        changed |= self.drain_messages();
        if changed {
            self.render();
        }
        changed
    }

    /// Run deferred renders and async post-processing whose time has come.
    pub fn process_timers(&mut self, now: Instant) {
        for id in self.timers.manager.process_expired(now) {
            if self.timers.render == Some(id) {
                self.timers.render = None;
                tracing::trace!(target: targets::SCROLL, "deferred render");
                self.render();
            } else if self.timers.post_render == Some(id) {
                self.timers.post_render = None;
                self.async_post_process_rows();
            } else if self.timers.post_cleanup == Some(id) {
                self.timers.post_cleanup = None;
                self.async_post_process_cleanup();
            }
        }
    }

    /// How long until the next timer is due, if any is running.
    pub fn next_timer_deadline(&mut self, now: Instant) -> Option<Duration> {
        self.timers.manager.time_until_next(now)
    }

    /// Returns `true` if deferred work is scheduled.
    pub fn has_pending_timers(&self) -> bool {
        self.timers.manager.active_count() > 0
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Rebuild the view column list from the initial columns.
    fn update_view_columns(&mut self) {
        let visible: Vec<Arc<Column>> = self.initial_columns.iter().filter(|c| c.visible).cloned().collect();
        self.columns = self.layout.reorder_view_columns(visible, &self.options);
        self.column_index = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| (column.id.clone(), index))
            .collect();
    }

    /// Re-run the layout engine's validation after options or columns
    /// changed.
    fn apply_layout_change(&mut self) -> Result<()> {
        self.update_view_columns();
        if self.initialized {
            let host = layout_host!(self);
            self.layout.after_set_options(&host, &mut self.backend)?;
            self.check_frozen_counts()?;
            // Flagged columns may have moved.
            self.update_view_columns();
        }
        Ok(())
    }

    fn after_structure_change(&mut self) {
        if !self.initialized {
            return;
        }
        self.relayout();
        self.clamp_scroll();
        self.invalidate_all_rows();
        self.render();
    }

    fn check_frozen_counts(&self) -> Result<()> {
        let frozen_cols = self.layout.frozen_cols();
        if frozen_cols > self.columns.len() {
            return Err(GridError::FrozenColumnsOutOfRange {
                frozen: frozen_cols,
                columns: self.columns.len(),
            });
        }
        let frozen_rows = self.layout.frozen_rows();
        if frozen_rows > self.data.len() {
            return Err(GridError::FrozenRowsOutOfRange {
                frozen: frozen_rows,
                rows: self.data.len(),
            });
        }
        Ok(())
    }

    /// Recompute column offsets, canvas width and pane geometry.
    fn relayout(&mut self) {
        let host = layout_host!(self);
        self.layout.apply_column_widths(&host);
        self.layout.update_canvas_width(&host, &mut self.backend);
        self.viewport = self.layout.resize_canvas(&host, &mut self.backend);
        tracing::trace!(
            target: targets::LAYOUT,
            pane_height = self.viewport.pane_height,
            pane_width = self.viewport.pane_width,
            virtual_height = self.viewport.virtual_height,
            "relayout"
        );
        self.columns_moved = true;
    }

    /// React to a new row count: grow or shrink the canvas and drop rows
    /// past the end.
    fn update_row_count(&mut self) {
        if !self.initialized {
            return;
        }
        let length = self.data.len();
        {
            let host = layout_host!(self);
            self.layout.update_row_count(&host, &mut self.backend);
        }
        self.relayout();
        for row in self.rows.rows_to_remove(&(0..length), length, |_| true) {
            self.remove_row_from_cache(row, true);
        }
        if let Some(active) = self.active {
            if active.row >= length {
                self.reset_active_cell();
            }
        }
        self.clamp_scroll();
    }

    /// Drain data and selection notifications. Returns `true` if any arrived.
    fn drain_messages(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.receiver.try_recv() {
            changed = true;
            match message {
                GridMessage::RowCountChanged(change) => {
                    tracing::trace!(target: targets::GRID, previous = change.previous, current = change.current, "row count changed");
                    let frozen_bottom_shift = self.layout.frozen_rows() > 0 && self.options.frozen_bottom;
                    self.update_row_count();
                    if frozen_bottom_shift {
                        self.invalidate_all_rows();
                    }
                }
                GridMessage::RowsChanged(rows) => self.invalidate_rows(rows),
                GridMessage::DataChanged => {
                    self.invalidate_all_rows();
                    self.update_row_count();
                }
                GridMessage::SelectedRangesChanged(ranges) => self.handle_selected_ranges_changed(ranges),
            }
        }
        changed |= self.apply_edit_effects();
        changed
    }

    fn item_metadata(&self, row: usize) -> Option<ItemMetadata> {
        self.data.item_metadata(row)
    }
}

impl<B: RenderBackend> Drop for Grid<B> {
    fn drop(&mut self) {
        if self.session.is_editing() {
            self.session.cancel_current_edit();
        }
        self.data_connections.disconnect(self.data.as_ref());
        if let Some((model, connection)) = self.selection_model.take() {
            model.signals().ranges_changed.disconnect(connection);
        }
        self.layout.destroy(&mut self.backend);
    }
}

impl<B: RenderBackend> std::fmt::Debug for Grid<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("layout", &self.layout.layout_name())
            .field("columns", &self.columns.len())
            .field("rows", &self.data.len())
            .field("rendered_range", &self.rendered_range)
            .field("active", &self.active)
            .field("editing", &self.session.is_editing())
            .finish_non_exhaustive()
    }
}
