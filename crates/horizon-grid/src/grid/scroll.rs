//! Scroll position and viewport ranges.

use std::time::Duration;

use horizon_grid_core::logging::targets;

use super::{Grid, Timers};
use crate::render::RenderBackend;
use crate::signals::ScrollEvent;
use crate::viewport::{ViewRange, ViewportMetrics};

/// Scrolls shorter than this since the last render do not re-render.
const RENDER_THRESHOLD_PX: f32 = 20.0;

/// Delay of the render scheduled after a jump of more than a viewport.
const DEFERRED_RENDER_DELAY: Duration = Duration::from_millis(50);

impl<B: RenderBackend> Grid<B> {
    pub(crate) fn viewport_metrics(&self) -> ViewportMetrics {
        ViewportMetrics {
            row_height: self.options.row_height,
            pane_height: self.viewport.pane_height,
            pane_width: self.viewport.pane_width,
            canvas_width: self.layout.canvas_width(),
            scroll_rows: self.layout.scroll_rows(self.data.len()),
        }
    }

    /// Rows and pixels currently inside the scrolling pane.
    pub fn visible_range(&self) -> ViewRange {
        self.viewport_metrics()
            .visible_range(self.scroll_top, self.scroll_left)
    }

    /// The range a render at the given offsets would materialize: the
    /// visible range widened by the row buffer and one pane width each side.
    /// Offsets default to the current scroll position.
    pub fn viewport(&self, scroll_top: Option<f32>, scroll_left: Option<f32>) -> ViewRange {
        let visible = self.viewport_metrics().visible_range(
            scroll_top.unwrap_or(self.scroll_top),
            scroll_left.unwrap_or(self.scroll_left),
        );
        self.buffered_range(visible)
    }

    pub(super) fn buffered_range(&self, visible: ViewRange) -> ViewRange {
        let metrics = self.viewport_metrics();
        let buffer = self
            .scroll_tracker
            .buffer(self.options.min_buffer, metrics.visible_row_capacity());
        metrics.buffered_range(visible, buffer, self.options.render_all_cells)
    }

    /// Current `(scroll_top, scroll_left)`.
    pub fn scroll_position(&self) -> (f32, f32) {
        (self.scroll_top, self.scroll_left)
    }

    /// Largest valid vertical offset.
    pub fn max_scroll_top(&self) -> f32 {
        (self.viewport.virtual_height - self.viewport.pane_height).max(0.0)
    }

    /// Largest valid horizontal offset.
    pub fn max_scroll_left(&self) -> f32 {
        (self.layout.canvas_width() - self.viewport.pane_width).max(0.0)
    }

    /// Scroll the scrolling pane. Offsets are clamped to the content.
    ///
    /// Emits `scroll`. Moves of more than 20px since the last render
    /// re-render: right away when less than a viewport away (or with
    /// [`force_sync_scrolling`](crate::GridOptions::force_sync_scrolling)),
    /// otherwise through a render scheduled 50ms later.
    pub fn set_scroll_position(&mut self, scroll_top: f32, scroll_left: f32) {
        let top = scroll_top.clamp(0.0, self.max_scroll_top());
        let left = scroll_left.clamp(0.0, self.max_scroll_left());
        if top == self.scroll_top && left == self.scroll_left {
            return;
        }
        let previous_top = self.scroll_top;
        self.scroll_top = top;
        self.scroll_left = left;
        if top != previous_top {
            self.scroll_tracker
                .record(previous_top, top, self.options.row_height);
        }
        self.signals.scroll.emit(ScrollEvent {
            scroll_top: top,
            scroll_left: left,
        });
        self.handle_scroll();
    }

    /// Scroll by a delta.
    pub fn scroll_by(&mut self, delta_top: f32, delta_left: f32) {
        self.set_scroll_position(self.scroll_top + delta_top, self.scroll_left + delta_left);
    }

    pub(super) fn scroll_to(&mut self, top: f32) {
        self.set_scroll_position(top, self.scroll_left);
    }

    fn handle_scroll(&mut self) {
        if !self.initialized {
            return;
        }
        let v_dist = (self.scroll_top - self.last_rendered_scroll_top).abs();
        let h_dist = (self.scroll_left - self.last_rendered_scroll_left).abs();
        if v_dist <= RENDER_THRESHOLD_PX && h_dist <= RENDER_THRESHOLD_PX {
            return;
        }
        let near = |dist: f32, extent: f32| dist == 0.0 || dist < extent;
        if self.options.force_sync_scrolling
            || (near(v_dist, self.viewport.pane_height) && near(h_dist, self.viewport.pane_width))
        {
            Timers::cancel(&mut self.timers.manager, &mut self.timers.render);
            self.render();
        } else {
            tracing::trace!(target: targets::SCROLL, v_dist, h_dist, "scroll jump, render deferred");
            Timers::restart(&mut self.timers.manager, &mut self.timers.render, DEFERRED_RENDER_DELAY);
        }
        self.signals.viewport_changed.emit(());
    }

    /// Keep the offsets valid after the content shrank.
    pub(super) fn clamp_scroll(&mut self) {
        self.scroll_top = self.scroll_top.clamp(0.0, self.max_scroll_top());
        self.scroll_left = self.scroll_left.clamp(0.0, self.max_scroll_left());
    }

    /// Index of `row` inside the scrolling pane, or `None` for frozen rows.
    fn scroll_offset_of(&self, row: usize) -> Option<usize> {
        let rows = self.layout.scroll_rows(self.data.len());
        rows.contains(&row).then(|| row - rows.start)
    }

    /// Scroll vertically until `row` is fully visible. With `do_paging` the
    /// row lands at the opposite edge, so the next rows come into view.
    pub fn scroll_row_into_view(&mut self, row: usize, do_paging: bool) {
        let Some(offset) = self.scroll_offset_of(row) else {
            return;
        };
        let row_height = self.options.row_height;
        let pane_height = self.viewport.pane_height;
        let row_at_top = offset as f32 * row_height;
        let row_at_bottom = (offset + 1) as f32 * row_height - pane_height;

        if (offset + 1) as f32 * row_height > self.scroll_top + pane_height {
            self.scroll_to(if do_paging { row_at_top } else { row_at_bottom });
            self.render();
        } else if row_at_top < self.scroll_top {
            self.scroll_to(if do_paging { row_at_bottom } else { row_at_top });
            self.render();
        }
    }

    /// Scroll so that `row` is the first visible row.
    pub fn scroll_row_to_top(&mut self, row: usize) {
        if let Some(offset) = self.scroll_offset_of(row) {
            self.scroll_to(offset as f32 * self.options.row_height);
            self.render();
        }
    }

    /// Scroll until the cell is visible both ways.
    pub fn scroll_cell_into_view(&mut self, row: usize, cell: usize, do_paging: bool) {
        self.scroll_row_into_view(row, do_paging);
        let colspan = self.colspan(row, cell);
        self.scroll_span_into_view(cell, colspan);
    }

    /// Scroll horizontally until the column is visible.
    pub fn scroll_column_into_view(&mut self, cell: usize) {
        self.scroll_span_into_view(cell, 1);
    }

    fn scroll_span_into_view(&mut self, cell: usize, colspan: usize) {
        let count = self.columns.len();
        if cell >= count || cell < self.layout.frozen_cols() {
            return;
        }
        let metrics = self.layout.column_metrics();
        let left = metrics.left(cell);
        let right = metrics.right((cell + colspan.max(1) - 1).min(count - 1));
        let pane_width = self.viewport.pane_width;
        let target = if left < self.scroll_left {
            left
        } else if right > self.scroll_left + pane_width {
            (right - pane_width).min(left)
        } else {
            return;
        };
        self.set_scroll_position(self.scroll_top, target);
        self.render();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::column::Column;
    use crate::grid::Grid;
    use crate::model::{RowItem, Value, VecDataSource, record};
    use crate::options::GridOptions;
    use crate::render::MemoryBackend;

    fn setup(rows: usize) -> Grid<MemoryBackend> {
        let data = Arc::new(VecDataSource::from_rows(
            (0..rows)
                .map(|i| RowItem::Data(record([("a", Value::from(i))])))
                .collect(),
        ));
        Grid::in_memory()
            .data(data)
            .columns((0..10).map(|i| Column::new(format!("c{i}"), "a").with_width(100.0)))
            .options(GridOptions::new().with_column_header(false))
            .container_size(300.0, 500.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut grid = setup(100);
        grid.set_scroll_position(-50.0, 10_000.0);
        assert_eq!(grid.scroll_position(), (0.0, 700.0));
        grid.set_scroll_position(1.0e9, 0.0);
        assert_eq!(grid.scroll_position().0, 2500.0 - 500.0);
    }

    #[test]
    fn test_small_scroll_does_not_render() {
        let mut grid = setup(1000);
        let before = grid.rendered_range();
        grid.set_scroll_position(15.0, 0.0);
        assert_eq!(grid.rendered_range(), before);
        grid.set_scroll_position(40.0, 0.0);
        assert_ne!(grid.rendered_range(), before);
    }

    #[test]
    fn test_jump_defers_render() {
        let mut grid = setup(1000);
        let before = grid.rendered_range();
        grid.set_scroll_position(10_000.0, 0.0);
        assert_eq!(grid.rendered_range(), before);
        assert!(grid.has_pending_timers());

        grid.process_timers(std::time::Instant::now() + Duration::from_secs(1));
        assert_eq!(grid.rendered_range().top, 400 - 3);
    }

    #[test]
    fn test_scroll_row_into_view() {
        let mut grid = setup(1000);
        grid.scroll_row_into_view(50, false);
        // Row 50 ends at 1275px; it lands on the bottom edge.
        assert_eq!(grid.scroll_position().0, 51.0 * 25.0 - 500.0);
        grid.scroll_row_into_view(3, false);
        assert_eq!(grid.scroll_position().0, 75.0);
        grid.scroll_row_to_top(10);
        assert_eq!(grid.scroll_position().0, 250.0);
    }

    #[test]
    fn test_scroll_column_into_view() {
        let mut grid = setup(10);
        grid.scroll_column_into_view(5);
        assert_eq!(grid.scroll_position().1, 300.0);
        grid.scroll_column_into_view(1);
        assert_eq!(grid.scroll_position().1, 100.0);
    }
}
