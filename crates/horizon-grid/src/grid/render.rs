//! The render cycle: diffing the row cache against the viewport,
//! materializing cells, invalidation and async post-processing.

use std::ops::Range;

use horizon_grid_core::PerfSpan;
use horizon_grid_core::logging::{span_names, targets};

use super::{Grid, Timers};
use crate::column::{PostCleanupArgs, PostRenderArgs};
use crate::format::{CellContent, FormatArgs, Formatter};
use crate::model::{ItemMetadata, RowItem};
use crate::render::post_process::{CleanupAction, PostStatus};
use crate::render::row_cache::{CachedCell, RowCacheEntry};
use crate::render::{NodeId, NodeKind, RenderBackend};
use crate::viewport::ViewRange;

impl<B: RenderBackend> Grid<B> {
    /// Bring the render tree in line with the current viewport.
    ///
    /// Rows that left the buffered range are released, rows that entered it
    /// are created, and stale rows inside it are refreshed. Queued data
    /// notifications are applied first, so a render always sees the latest
    /// row count.
    pub fn render(&mut self) {
        if !self.initialized {
            return;
        }
        let _span = PerfSpan::new(span_names::RENDER);
        self.drain_messages();

        let visible = self.visible_range();
        let range = self.buffered_range(visible);

        self.cleanup_rows(&range);
        if self.columns_moved
            || range.left_px != self.rendered_range.left_px
            || range.right_px != self.rendered_range.right_px
        {
            self.cleanup_and_render_cells(&range);
            self.columns_moved = false;
        }
        self.render_rows(&range);

        let data_len = self.data.len();
        let mut post_rows: Vec<usize> = self.pinned_rows();
        post_rows.extend(visible.rows().filter(|row| *row < data_len));
        self.post.set_rows(post_rows);
        self.start_post_processing();

        self.last_rendered_scroll_top = self.scroll_top;
        self.last_rendered_scroll_left = self.scroll_left;
        self.rendered_range = range;
        self.update_editor_position();

        tracing::debug!(
            target: targets::RENDER,
            top = range.top,
            bottom = range.bottom,
            left_px = range.left_px,
            right_px = range.right_px,
            cached = self.rows.len(),
            "render"
        );
        self.signals.rendered.emit(range);
    }

    /// The range materialized by the last render.
    pub fn rendered_range(&self) -> ViewRange {
        self.rendered_range
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Re-read the row count, drop every rendered row and render again.
    pub fn invalidate(&mut self) {
        self.update_row_count();
        self.invalidate_all_rows();
        self.render();
    }

    /// Drop every rendered row; the next render rebuilds them.
    ///
    /// The row under an open editor is kept and only marked stale, so the
    /// edit survives.
    pub fn invalidate_all_rows(&mut self) {
        let editing_row = self.session.position().map(|p| p.row);
        for row in self.rows.rows() {
            if Some(row) == editing_row {
                self.rows.mark_dirty(row);
            } else {
                self.remove_row_from_cache(row, true);
            }
        }
        self.post.mark_all_parked_dirty();
        tracing::debug!(target: targets::RENDER, "all rows invalidated");
    }

    /// Mark rows stale. They are refreshed in place by the next render, or
    /// rebuilt if their cell structure changed.
    pub fn invalidate_rows(&mut self, rows: impl IntoIterator<Item = usize>) {
        let mut marked = 0usize;
        for row in rows {
            if self.rows.mark_dirty(row) || self.post.mark_parked_dirty(row) {
                marked += 1;
            }
        }
        tracing::debug!(target: targets::RENDER, rows = marked, "rows invalidated");
    }

    /// Mark one row stale.
    pub fn invalidate_row(&mut self, row: usize) {
        self.invalidate_rows([row]);
    }

    /// Re-render a rendered row right away.
    pub fn update_row(&mut self, row: usize) {
        if self.rows.contains(row) {
            let range = self.rendered_range;
            self.refresh_row(row, &range);
        }
    }

    /// Re-render one rendered cell right away. An open editor on the cell
    /// reloads its value instead.
    pub fn update_cell(&mut self, row: usize, cell: usize) {
        let Some((start, cached)) = self.rows.get(row).and_then(|entry| entry.cell_covering(cell)) else {
            return;
        };
        if self.is_editing_cell(row, start) {
            self.session.reload_value();
            return;
        }
        let item = self.data.item(row);
        let metadata = self.item_metadata(row);
        let content = match &item {
            Some(item) => self.format_cell(row, start, item, metadata.as_ref()),
            None => CellContent::empty(),
        };
        self.backend.set_content(cached.node, &content);
        self.post.forget_cell(row, start);
        self.start_post_processing();
    }

    // =========================================================================
    // Rows
    // =========================================================================

    /// Frozen rows, always rendered.
    fn pinned_rows(&self) -> Vec<usize> {
        let frozen = self.layout.frozen_rows();
        let len = self.data.len();
        if frozen == 0 {
            Vec::new()
        } else if self.options.frozen_bottom {
            (len.saturating_sub(frozen)..len).collect()
        } else {
            (0..frozen.min(len)).collect()
        }
    }

    fn cleanup_rows(&mut self, range: &ViewRange) {
        let editing_row = self.session.position().map(|p| p.row);
        let layout = &self.layout;
        let stale = self.rows.rows_to_remove(&range.rows(), self.data.len(), |row| {
            Some(row) == editing_row || layout.is_frozen_row(row)
        });
        for row in stale {
            self.remove_row_from_cache(row, false);
        }
    }

    fn render_rows(&mut self, range: &ViewRange) {
        let mut rows = self.pinned_rows();
        rows.extend(range.rows());
        let data_len = self.data.len();

        for row in self.rows.dirty_rows(rows.iter().copied()) {
            self.refresh_row(row, range);
        }
        // The editing row may sit outside the range.
        if let Some(position) = self.session.position() {
            if self.rows.get(position.row).is_some_and(|entry| entry.dirty) {
                self.refresh_row(position.row, range);
            }
        }
        let missing = self.rows.missing_rows(rows.into_iter().filter(|row| *row < data_len));
        let created = missing.len();
        for row in missing {
            self.ensure_row(row, range);
        }
        if created > 0 {
            tracing::trace!(target: targets::RENDER, rows = created, "rows materialized");
        }
    }

    /// Number of row nodes per row: one per pane column in use.
    fn row_node_count(&self) -> usize {
        let frozen = self.layout.frozen_cols();
        if frozen > 0 && frozen < self.columns.len() { 2 } else { 1 }
    }

    fn ensure_row(&mut self, row: usize, range: &ViewRange) {
        let Some(entry) = self.post.rescue(row) else {
            self.create_row(row, range);
            return;
        };
        tracing::trace!(target: targets::RENDER, row, "row rescued from cleanup");
        let frozen = self.layout.frozen_cols();
        for (side, node) in entry.row_nodes.iter().enumerate() {
            let cell = if side == 0 { 0 } else { frozen };
            if let Some(canvas) = self.layout.canvas_node_for(cell, row) {
                self.backend.append_child(canvas, *node);
            }
        }
        let dirty = entry.dirty;
        self.rows.insert(row, entry);
        if dirty {
            self.refresh_row(row, range);
        } else {
            let item = self.data.item(row);
            let metadata = self.item_metadata(row);
            self.sync_row_cells(row, range, item.as_ref(), metadata.as_ref());
        }
    }

    fn create_row(&mut self, row: usize, range: &ViewRange) {
        let item = self.data.item(row);
        let metadata = self.item_metadata(row);
        let non_data = item.as_ref().is_some_and(RowItem::is_non_data);

        let frozen = self.layout.frozen_cols();
        let row_nodes = (0..self.row_node_count())
            .map(|side| {
                let cell = if side == 0 { 0 } else { frozen };
                let canvas = self.layout.canvas_node_for(cell, row);
                self.backend.create_node(canvas, NodeKind::Row { row })
            })
            .collect();
        self.rows.insert(row, RowCacheEntry::new(row_nodes, non_data));

        self.apply_row_chrome(row, item.is_none(), metadata.as_ref());
        self.sync_row_cells(row, range, item.as_ref(), metadata.as_ref());
        tracing::trace!(target: targets::RENDER, row, non_data, "row created");
    }

    /// Refresh a stale row: rebuild it if its structure changed, otherwise
    /// re-format its cells in place.
    fn refresh_row(&mut self, row: usize, range: &ViewRange) {
        let item = self.data.item(row);
        let metadata = self.item_metadata(row);
        let non_data = item.as_ref().is_some_and(RowItem::is_non_data);
        let spans = self.cell_spans(metadata.as_ref());
        let editing = self.session.position().is_some_and(|p| p.row == row);

        let Some(entry) = self.rows.get(row) else {
            return;
        };
        let structural = entry.non_data != non_data
            || entry.layout_differs(&spans)
            || entry.row_nodes.len() != self.row_node_count();

        if structural && !editing {
            tracing::debug!(target: targets::RENDER, row, non_data, "row structure changed, rebuilding");
            if let Some(entry) = self.rows.remove(row) {
                self.destroy_entry(entry);
            }
            self.post.forget_row(row);
            self.create_row(row, range);
            return;
        }

        let cells: Vec<(usize, CachedCell)> = entry.cells.iter().map(|(start, cell)| (*start, *cell)).collect();
        self.apply_row_chrome(row, item.is_none(), metadata.as_ref());
        for (start, cached) in cells {
            if self.is_editing_cell(row, start) {
                self.session.reload_value();
                continue;
            }
            let content = match &item {
                Some(item) => self.format_cell(row, start, item, metadata.as_ref()),
                None => CellContent::empty(),
            };
            self.backend.set_content(cached.node, &content);
        }
        if let Some(entry) = self.rows.get_mut(row) {
            entry.dirty = false;
        }
        self.post
            .invalidate_row(row, self.options.enable_async_post_render_cleanup);
        self.sync_row_cells(row, range, item.as_ref(), metadata.as_ref());
        tracing::trace!(target: targets::RENDER, row, "row refreshed in place");
    }

    /// Release a row. Decorated rows are parked for deferred cleanup when
    /// cleanup is enabled, and destroyed right away otherwise.
    pub(super) fn remove_row_from_cache(&mut self, row: usize, invalidated: bool) {
        let Some(mut entry) = self.rows.remove(row) else {
            return;
        };
        if self.options.enable_async_post_render_cleanup && self.post.is_decorated(row) {
            for node in &entry.row_nodes {
                self.backend.detach(*node);
            }
            entry.dirty |= invalidated;
            self.post.park_row(row, entry, &self.columns);
            self.start_post_processing_cleanup();
            tracing::trace!(target: targets::RENDER, row, "row parked for cleanup");
        } else {
            self.destroy_entry(entry);
            self.post.forget_row(row);
            tracing::trace!(target: targets::RENDER, row, "row released");
        }
    }

    fn destroy_entry(&mut self, entry: RowCacheEntry) {
        for node in entry.row_nodes {
            self.backend.remove_node(node);
        }
    }

    /// Position, size and classes of the row nodes.
    fn apply_row_chrome(&mut self, row: usize, loading: bool, metadata: Option<&ItemMetadata>) {
        let Some(entry) = self.rows.get(row) else {
            return;
        };
        let nodes = entry.row_nodes.clone();
        let previous_classes = entry.row_classes.clone();
        let classes: Vec<String> = metadata
            .and_then(|m| m.css_classes.as_deref())
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let row_height = self.options.row_height;
        let top = self.layout.row_top(row, row_height);
        let frozen = self.layout.frozen_cols();
        let frozen_width = self.layout.column_metrics().frozen_width();
        let active = self.active.is_some_and(|a| a.row == row);
        let frozen_row = self.layout.is_frozen_row(row);

        for (side, node) in nodes.iter().enumerate() {
            let width = if side == 0 && frozen > 0 {
                frozen_width
            } else {
                self.layout.canvas_width()
            };
            self.backend.set_position(*node, 0.0, top);
            self.backend.set_size(*node, width, row_height);
            self.backend.set_class(*node, "slick-row", true);
            self.backend.set_class(*node, "even", row % 2 == 0);
            self.backend.set_class(*node, "odd", row % 2 == 1);
            self.backend.set_class(*node, "active", active);
            self.backend.set_class(*node, "loading", loading);
            self.backend.set_class(*node, "frozen", frozen_row);
            for class in previous_classes.iter().filter(|c| !classes.contains(c)) {
                self.backend.set_class(*node, class, false);
            }
            for class in &classes {
                self.backend.set_class(*node, class, true);
            }
        }
        if let Some(entry) = self.rows.get_mut(row) {
            entry.row_classes = classes;
        }
    }

    // =========================================================================
    // Cells
    // =========================================================================

    /// Colspan of the cell at `cell` under `metadata`.
    pub(super) fn colspan_in(&self, metadata: Option<&ItemMetadata>, cell: usize) -> usize {
        let Some(column) = self.columns.get(cell) else {
            return 1;
        };
        metadata
            .and_then(|m| m.column(&column.id, cell))
            .and_then(|c| c.colspan)
            .map_or(1, |span| span.resolve(cell, self.columns.len()))
    }

    /// The `(start, colspan)` cells of a row. A span crossing the frozen
    /// boundary is split into one cell per pane.
    fn cell_spans(&self, metadata: Option<&ItemMetadata>) -> Vec<(usize, usize)> {
        let count = self.columns.len();
        let frozen = self.layout.frozen_cols();
        let mut spans = Vec::with_capacity(count);
        let mut cell = 0;
        while cell < count {
            let end = cell + self.colspan_in(metadata, cell);
            if cell < frozen && end > frozen {
                spans.push((cell, frozen - cell));
                spans.push((frozen, end - frozen));
            } else {
                spans.push((cell, end - cell));
            }
            cell = end;
        }
        spans
    }

    /// Scrolling columns to materialize for `range`.
    fn columns_in(&self, range: &ViewRange) -> Range<usize> {
        if self.options.render_all_cells {
            return 0..self.columns.len();
        }
        self.layout
            .column_metrics()
            .scrolling_columns_in(range.left_px, range.right_px)
    }

    /// Add cells that entered the column range and drop those that left it.
    fn sync_row_cells(
        &mut self,
        row: usize,
        range: &ViewRange,
        item: Option<&RowItem>,
        metadata: Option<&ItemMetadata>,
    ) {
        let frozen = self.layout.frozen_cols();
        let columns = self.columns_in(range);
        let wanted: Vec<(usize, usize)> = self
            .cell_spans(metadata)
            .into_iter()
            .filter(|(start, colspan)| *start < frozen || (*start < columns.end && start + colspan > columns.start))
            .collect();

        let Some(entry) = self.rows.get(row) else {
            return;
        };
        let stale: Vec<(usize, CachedCell)> = entry
            .cells
            .iter()
            .filter(|(start, cell)| !wanted.contains(&(**start, cell.colspan)))
            .map(|(start, cell)| (*start, *cell))
            .collect();
        let missing: Vec<(usize, usize)> = wanted
            .iter()
            .filter(|(start, colspan)| !entry.cells.get(start).is_some_and(|cell| cell.colspan == *colspan))
            .copied()
            .collect();

        for (start, cell) in stale {
            if !self.is_editing_cell(row, start) {
                self.remove_cell(row, start, cell);
            }
        }
        for (start, colspan) in missing {
            self.create_cell(row, start, colspan, item, metadata);
        }
    }

    /// Incremental horizontal pass over every rendered row.
    fn cleanup_and_render_cells(&mut self, range: &ViewRange) {
        for row in self.rows.rows() {
            if self.rows.get(row).is_some_and(|entry| entry.dirty) {
                // Refreshed by the row pass.
                continue;
            }
            let item = self.data.item(row);
            let metadata = self.item_metadata(row);
            self.sync_row_cells(row, range, item.as_ref(), metadata.as_ref());
        }
    }

    fn remove_cell(&mut self, row: usize, start: usize, cell: CachedCell) {
        let column = self.columns.get(start).cloned();
        let deferred = self.options.enable_async_post_render_cleanup
            && self.post.status(row, start).is_some()
            && column.as_ref().is_some_and(|c| c.async_post_render_cleanup.is_some());
        match column {
            Some(column) if deferred => {
                self.backend.detach(cell.node);
                self.post.queue_cell(row, start, column, cell.node);
                self.start_post_processing_cleanup();
            }
            _ => {
                self.backend.remove_node(cell.node);
                self.post.forget_cell(row, start);
            }
        }
        if let Some(entry) = self.rows.get_mut(row) {
            entry.cells.remove(&start);
        }
    }

    fn create_cell(
        &mut self,
        row: usize,
        start: usize,
        colspan: usize,
        item: Option<&RowItem>,
        metadata: Option<&ItemMetadata>,
    ) {
        let frozen = self.layout.frozen_cols();
        let Some(entry) = self.rows.get(row) else {
            return;
        };
        let side = usize::from(frozen > 0 && start >= frozen);
        let Some(parent) = entry.row_nodes.get(side).or_else(|| entry.row_nodes.first()).copied() else {
            return;
        };
        let node = self.backend.create_node(Some(parent), NodeKind::Cell { row, cell: start });
        if let Some(entry) = self.rows.get_mut(row) {
            entry.cells.insert(start, CachedCell { node, colspan });
        }

        self.position_cell(node, start, colspan);
        self.apply_cell_classes(row, start, colspan, node);
        if !self.is_editing_cell(row, start) {
            if let Some(item) = item {
                let content = self.format_cell(row, start, item, metadata);
                self.backend.set_content(node, &content);
            }
        }
    }

    fn position_cell(&mut self, node: NodeId, start: usize, colspan: usize) {
        let metrics = self.layout.column_metrics();
        let left = metrics.left(start);
        let width = (metrics.span_width(start, colspan) - self.options.cell_width_diff).max(0.0);
        self.backend.set_position(node, left, 0.0);
        self.backend.set_size(node, width, self.options.row_height);
    }

    /// Move every rendered cell after column widths changed.
    pub(super) fn reposition_cells(&mut self) {
        for row in self.rows.rows() {
            let item_missing = self.data.item(row).is_none();
            let metadata = self.item_metadata(row);
            self.apply_row_chrome(row, item_missing, metadata.as_ref());
            let cells: Vec<(usize, CachedCell)> = self
                .rows
                .get(row)
                .map(|entry| entry.cells.iter().map(|(start, cell)| (*start, *cell)).collect())
                .unwrap_or_default();
            for (start, cell) in cells {
                self.position_cell(cell.node, start, cell.colspan);
            }
        }
    }

    fn apply_cell_classes(&mut self, row: usize, cell: usize, colspan: usize, node: NodeId) {
        let Some(column) = self.columns.get(cell).cloned() else {
            return;
        };
        let last = (cell + colspan.max(1) - 1).min(self.columns.len() - 1);
        self.backend.set_class(node, "slick-cell", true);
        self.backend.set_class(node, &format!("l{cell}"), true);
        self.backend.set_class(node, &format!("r{last}"), true);
        if let Some(classes) = &column.css_class {
            for class in classes.split_whitespace() {
                self.backend.set_class(node, class, true);
            }
        }
        if cell < self.layout.frozen_cols() {
            self.backend.set_class(node, "frozen", true);
        }
        if self.active.is_some_and(|a| a.row == row && a.cell == cell) {
            self.backend.set_class(node, "active", true);
        }
        if self.is_editing_cell(row, cell) {
            self.backend.set_class(node, "editable", true);
        }
        let layered: Vec<String> = self
            .cell_css_classes
            .values()
            .filter_map(|styles| styles.get(&row)?.get(&column.id))
            .flat_map(|classes| classes.split_whitespace().map(str::to_string))
            .collect();
        for class in layered {
            self.backend.set_class(node, &class, true);
        }
    }

    /// Resolve the formatter of a cell: column metadata, row metadata,
    /// column, formatter factory, then the grid default.
    fn resolve_formatter(&self, cell: usize, metadata: Option<&ItemMetadata>) -> Formatter {
        let column = &self.columns[cell];
        if let Some(metadata) = metadata {
            if let Some(formatter) = metadata.column(&column.id, cell).and_then(|c| c.formatter.clone()) {
                return formatter;
            }
            if let Some(formatter) = metadata.formatter.clone() {
                return formatter;
            }
        }
        if let Some(formatter) = column.formatter.clone() {
            return formatter;
        }
        if let Some(formatter) = self
            .options
            .formatter_factory
            .as_ref()
            .and_then(|factory| factory.formatter(column))
        {
            return formatter;
        }
        self.options.default_formatter.clone()
    }

    fn format_cell(&self, row: usize, cell: usize, item: &RowItem, metadata: Option<&ItemMetadata>) -> CellContent {
        let column = &self.columns[cell];
        let value = match &self.options.data_item_column_value_extractor {
            Some(extract) => extract(item, column.as_ref()),
            None => item.value(&column.field),
        };
        let formatter = self.resolve_formatter(cell, metadata);
        formatter(&FormatArgs {
            row,
            cell,
            value: &value,
            column: column.as_ref(),
            item,
        })
    }

    pub(super) fn is_editing_cell(&self, row: usize, cell: usize) -> bool {
        self.session
            .position()
            .is_some_and(|p| p.row == row && p.cell == cell)
    }

    // =========================================================================
    // Async post-processing
    // =========================================================================

    fn start_post_processing(&mut self) {
        if !self.options.enable_async_post_render
            || !self.post.has_pending_rows()
            || !self.columns.iter().any(|c| c.async_post_render.is_some())
        {
            return;
        }
        Timers::restart(
            &mut self.timers.manager,
            &mut self.timers.post_render,
            self.options.async_post_render_delay,
        );
    }

    fn start_post_processing_cleanup(&mut self) {
        if !self.options.enable_async_post_render_cleanup {
            return;
        }
        Timers::restart(
            &mut self.timers.manager,
            &mut self.timers.post_cleanup,
            self.options.async_post_cleanup_delay,
        );
    }

    /// Decorate the next row, then schedule the one after it.
    ///
    /// Rows that left the cache since the render are skipped.
    pub(super) fn async_post_process_rows(&mut self) {
        let _span = PerfSpan::new(span_names::POST_RENDER);
        let direction = self.scroll_tracker.direction();
        let data_len = self.data.len();

        while let Some(row) = self.post.next_row(direction) {
            if row >= data_len {
                continue;
            }
            let Some(entry) = self.rows.get(row) else {
                continue;
            };
            let cells: Vec<(usize, NodeId)> = entry.cells.iter().map(|(start, cell)| (*start, cell.node)).collect();
            let item = self.data.item(row);
            let mut decorated = 0usize;
            for (cell, node) in cells {
                let Some(column) = self.columns.get(cell).cloned() else {
                    continue;
                };
                let Some(callback) = column.async_post_render.clone() else {
                    continue;
                };
                let status = self.post.status(row, cell);
                if status == Some(PostStatus::Rendered) {
                    continue;
                }
                callback(PostRenderArgs {
                    backend: &mut self.backend,
                    node,
                    row,
                    item: item.as_ref(),
                    column: &column,
                    re_render: status == Some(PostStatus::Stale),
                });
                self.post.mark_rendered(row, cell);
                decorated += 1;
            }
            tracing::trace!(target: targets::RENDER, row, cells = decorated, "row decorated");
            Timers::restart(
                &mut self.timers.manager,
                &mut self.timers.post_render,
                self.options.async_post_render_delay,
            );
            return;
        }
    }

    /// Run one cleanup group, then schedule the next.
    pub(super) fn async_post_process_cleanup(&mut self) {
        let _span = PerfSpan::new(span_names::POST_CLEANUP);
        for entry in self.post.take_orphaned() {
            self.destroy_entry(entry);
        }
        for action in self.post.next_cleanup_group() {
            match action {
                CleanupAction::Cell {
                    row,
                    column,
                    node,
                    remove,
                } => {
                    if let Some(cleanup) = column.async_post_render_cleanup.clone() {
                        cleanup(PostCleanupArgs {
                            backend: &mut self.backend,
                            node,
                            row,
                            column: &column,
                        });
                    }
                    if remove {
                        self.backend.remove_node(node);
                    }
                }
                CleanupAction::Row { row } => {
                    if let Some(entry) = self.post.take_parked(row) {
                        self.destroy_entry(entry);
                        tracing::trace!(target: targets::RENDER, row, "parked row destroyed");
                    }
                }
            }
        }
        if self.post.has_pending_cleanup() {
            self.start_post_processing_cleanup();
        }
    }
}
