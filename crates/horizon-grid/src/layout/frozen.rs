//! Four-pane layout with frozen columns and rows.
//!
//! Panes are split at the frozen column and at the frozen rows:
//!
//! ```text
//! +-----------+------------------+
//! | top-left  | top-right        |   frozen rows (or scrolling rows
//! +-----------+------------------+   when rows are frozen at the bottom)
//! | bot-left  | bot-right        |
//! +-----------+------------------+
//!   frozen      scrolling columns
//! ```
//!
//! All four panes are created up front and hidden while unused, so pane
//! nodes keep their identity when the frozen counts change.

use std::ops::Range;
use std::sync::Arc;

use horizon_grid_core::logging::targets;

use super::{ColumnMetrics, LayoutEngine, LayoutHost, PaneNodes, Size, ViewportInfo, rows_in};
use crate::column::Column;
use crate::error::{GridError, Result};
use crate::options::GridOptions;
use crate::render::{NodeId, PaneColumn, PaneId, PaneRow, RenderBackend};

/// Layout pinning leading columns and top (or bottom) rows.
///
/// The number of frozen columns is the number of columns flagged
/// [`Column::frozen`], or [`GridOptions::frozen_columns`] when none is
/// flagged. Flagged columns are moved to the front of the view.
#[derive(Debug, Default)]
pub struct FrozenLayout {
    panes: Option<[PaneNodes; 4]>,
    metrics: ColumnMetrics,
    frozen_cols: usize,
    frozen_rows: usize,
    frozen_bottom: bool,
    /// First frozen row when frozen at the bottom, else the first scrolling row.
    actual_frozen_row: usize,
    canvas_width_l: f32,
    canvas_width_r: f32,
}

impl FrozenLayout {
    /// Create the layout. Pane nodes are created by `init`.
    pub fn new() -> Self {
        Self::default()
    }

    fn configure(&mut self, host: &dyn LayoutHost) -> Result<()> {
        let columns = host.columns();
        let options = host.options();
        let flagged = columns.iter().filter(|c| c.frozen).count();
        let frozen_cols = if flagged > 0 {
            flagged
        } else {
            options.frozen_columns.unwrap_or(0)
        };
        if frozen_cols > columns.len() {
            return Err(GridError::FrozenColumnsOutOfRange {
                frozen: frozen_cols,
                columns: columns.len(),
            });
        }
        let frozen_rows = options.frozen_rows.unwrap_or(0);
        if frozen_rows > host.data_length() {
            return Err(GridError::FrozenRowsOutOfRange {
                frozen: frozen_rows,
                rows: host.data_length(),
            });
        }
        self.frozen_cols = frozen_cols;
        self.frozen_rows = frozen_rows;
        self.frozen_bottom = options.frozen_bottom;
        self.sync_rows(host.data_length());
        Ok(())
    }

    fn sync_rows(&mut self, data_length: usize) {
        self.actual_frozen_row = if self.frozen_bottom {
            data_length.saturating_sub(self.frozen_rows)
        } else {
            self.frozen_rows
        };
    }

    fn column_side(&self, cell: usize) -> PaneColumn {
        if self.frozen_cols > 0 && cell >= self.frozen_cols {
            PaneColumn::Right
        } else {
            PaneColumn::Left
        }
    }

    fn row_side(&self, row: usize) -> PaneRow {
        let frozen = self.is_frozen_row(row);
        match (self.frozen_rows > 0, self.frozen_bottom, frozen) {
            (false, _, _) => PaneRow::Top,
            (true, false, true) | (true, true, false) => PaneRow::Top,
            (true, false, false) | (true, true, true) => PaneRow::Bottom,
        }
    }

    /// The pane row that scrolls vertically.
    fn scrolling_row_side(&self) -> PaneRow {
        if self.frozen_rows > 0 && !self.frozen_bottom {
            PaneRow::Bottom
        } else {
            PaneRow::Top
        }
    }

    fn pane(&self, id: PaneId) -> Option<PaneNodes> {
        let index = match (id.column, id.row) {
            (PaneColumn::Left, PaneRow::Top) => 0,
            (PaneColumn::Right, PaneRow::Top) => 1,
            (PaneColumn::Left, PaneRow::Bottom) => 2,
            (PaneColumn::Right, PaneRow::Bottom) => 3,
        };
        self.panes.map(|panes| panes[index])
    }

    fn update_visibility(&self, backend: &mut dyn RenderBackend, show_header: bool) {
        for id in PaneId::ALL {
            if let Some(pane) = self.pane(id) {
                let visible = (id.column == PaneColumn::Left || self.frozen_cols > 0)
                    && (id.row == PaneRow::Top || self.frozen_rows > 0);
                pane.set_visible(backend, visible);
                backend.set_visible(pane.header, visible && id.row == PaneRow::Top && show_header);
            }
        }
    }

    fn canvas_heights(&self, data_length: usize, row_height: f32) -> (f32, f32) {
        let frozen_height = self.frozen_rows as f32 * row_height;
        let scrolling_height = self.scroll_rows(data_length).len() as f32 * row_height;
        match (self.frozen_rows > 0, self.frozen_bottom) {
            (false, _) => (scrolling_height, 0.0),
            (true, false) => (frozen_height, scrolling_height),
            (true, true) => (scrolling_height, frozen_height),
        }
    }

    fn size_canvases(&self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) {
        let (top, bottom) = self.canvas_heights(host.data_length(), host.options().row_height);
        let left_width = if self.frozen_cols > 0 {
            self.canvas_width_l
        } else {
            self.canvas_width_r
        };
        for id in PaneId::ALL {
            if let Some(pane) = self.pane(id) {
                let width = match id.column {
                    PaneColumn::Left => left_width,
                    PaneColumn::Right => self.canvas_width_r,
                };
                let height = match id.row {
                    PaneRow::Top => top,
                    PaneRow::Bottom => bottom,
                };
                backend.set_size(pane.canvas, width, height);
                backend.set_size(pane.header, width, host.options().header_height);
            }
        }
    }
}

impl LayoutEngine for FrozenLayout {
    fn layout_name(&self) -> &'static str {
        "frozen"
    }

    fn init(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) -> Result<()> {
        self.configure(host)?;
        if self.panes.is_none() {
            self.panes = Some(PaneId::ALL.map(|id| PaneNodes::create(&mut *backend, id)));
        }
        self.apply_column_widths(host);
        self.update_canvas_width(host, backend);
        self.update_visibility(backend, host.options().show_column_header);
        tracing::debug!(
            target: targets::LAYOUT,
            layout = self.layout_name(),
            frozen_cols = self.frozen_cols,
            frozen_rows = self.frozen_rows,
            "layout initialized"
        );
        Ok(())
    }

    fn after_set_options(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) -> Result<()> {
        self.configure(host)?;
        self.apply_column_widths(host);
        self.update_canvas_width(host, backend);
        self.update_visibility(backend, host.options().show_column_header);
        Ok(())
    }

    fn destroy(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(panes) = self.panes.take() {
            for pane in panes {
                pane.remove(backend);
            }
        }
    }

    fn reorder_view_columns(&self, columns: Vec<Arc<Column>>, _options: &GridOptions) -> Vec<Arc<Column>> {
        let (frozen, scrolling): (Vec<_>, Vec<_>) = columns.into_iter().partition(|c| c.frozen);
        frozen.into_iter().chain(scrolling).collect()
    }

    fn frozen_cols(&self) -> usize {
        self.frozen_cols
    }

    fn frozen_rows(&self) -> usize {
        self.frozen_rows
    }

    fn is_frozen_row(&self, row: usize) -> bool {
        if self.frozen_rows == 0 {
            return false;
        }
        if self.frozen_bottom {
            row >= self.actual_frozen_row
        } else {
            row < self.frozen_rows
        }
    }

    fn scroll_rows(&self, data_length: usize) -> Range<usize> {
        match (self.frozen_rows > 0, self.frozen_bottom) {
            (false, _) => 0..data_length,
            (true, false) => self.frozen_rows.min(data_length)..data_length,
            (true, true) => 0..data_length.saturating_sub(self.frozen_rows),
        }
    }

    fn row_top(&self, row: usize, row_height: f32) -> f32 {
        let offset = match (self.frozen_rows > 0, self.frozen_bottom, self.is_frozen_row(row)) {
            (true, false, false) => self.frozen_rows,
            (true, true, true) => self.actual_frozen_row,
            _ => 0,
        };
        row.saturating_sub(offset) as f32 * row_height
    }

    fn apply_column_widths(&mut self, host: &dyn LayoutHost) {
        self.metrics = ColumnMetrics::compute(host.columns(), self.frozen_cols);
    }

    fn column_metrics(&self) -> &ColumnMetrics {
        &self.metrics
    }

    fn canvas_width(&self) -> f32 {
        self.canvas_width_r
    }

    fn calc_canvas_width(&self, host: &dyn LayoutHost) -> f32 {
        let diff = host.options().cell_width_diff;
        let width: f32 = host
            .columns()
            .iter()
            .skip(self.frozen_cols)
            .map(|c| c.width + diff)
            .sum();
        width.max(0.0)
    }

    fn update_canvas_width(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) -> bool {
        let diff = host.options().cell_width_diff;
        let left: f32 = host
            .columns()
            .iter()
            .take(self.frozen_cols)
            .map(|c| c.width + diff)
            .sum();
        let right = self.calc_canvas_width(host);
        let changed = left != self.canvas_width_l || right != self.canvas_width_r;
        self.canvas_width_l = left;
        self.canvas_width_r = right;
        self.size_canvases(host, backend);
        changed
    }

    fn resize_canvas(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) -> ViewportInfo {
        let options = host.options();
        let row_height = options.row_height;
        let chrome = options.chrome_height();
        let Size { width, height } = host.container_size();
        let height = (height - chrome).max(0.0);
        self.sync_rows(host.data_length());

        let frozen_height = (self.frozen_rows as f32 * row_height).min(height);
        let scrolling_height = if self.frozen_rows > 0 {
            height - frozen_height
        } else {
            height
        };
        let (top_height, bottom_height) = match (self.frozen_rows > 0, self.frozen_bottom) {
            (false, _) => (height, 0.0),
            (true, false) => (frozen_height, scrolling_height),
            (true, true) => (scrolling_height, frozen_height),
        };
        let left_width = if self.frozen_cols > 0 {
            self.canvas_width_l.min(width)
        } else {
            width
        };
        let right_width = (width - left_width).max(0.0);

        for id in PaneId::ALL {
            if let Some(pane) = self.pane(id) {
                let (left, pane_width) = match id.column {
                    PaneColumn::Left => (0.0, left_width),
                    PaneColumn::Right => (left_width, right_width),
                };
                let (top, pane_height) = match id.row {
                    PaneRow::Top => (chrome, top_height),
                    PaneRow::Bottom => (chrome + top_height, bottom_height),
                };
                backend.set_position(pane.viewport, left, top);
                backend.set_size(pane.viewport, pane_width, pane_height);
                backend.set_position(pane.header, left, 0.0);
            }
        }
        self.size_canvases(host, backend);
        self.update_visibility(backend, options.show_column_header);

        let pane_width = if self.frozen_cols > 0 { right_width } else { width };
        let virtual_height = self.scroll_rows(host.data_length()).len() as f32 * row_height;
        let info = ViewportInfo {
            width,
            height,
            pane_width,
            pane_height: scrolling_height,
            virtual_height,
            num_visible_rows: rows_in(scrolling_height, row_height),
            has_v_scroll: virtual_height > scrolling_height,
            has_h_scroll: self.canvas_width_r > pane_width,
        };
        tracing::trace!(target: targets::LAYOUT, ?info, scrolling = ?self.scrolling_row_side(), "panes resized");
        info
    }

    fn update_row_count(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) {
        self.sync_rows(host.data_length());
        self.size_canvases(host, backend);
    }

    fn pane_for(&self, cell: usize, row: usize) -> PaneId {
        PaneId::new(self.column_side(cell), self.row_side(row))
    }

    fn canvas_node_for(&self, cell: usize, row: usize) -> Option<NodeId> {
        self.pane(self.pane_for(cell, row)).map(|pane| pane.canvas)
    }

    fn viewport_node_for(&self, cell: usize, row: usize) -> Option<NodeId> {
        self.pane(self.pane_for(cell, row)).map(|pane| pane.viewport)
    }

    fn header_node_for(&self, cell: usize) -> Option<NodeId> {
        self.pane(PaneId::new(self.column_side(cell), PaneRow::Top))
            .map(|pane| pane.header)
    }

    fn canvas_nodes(&self) -> Vec<NodeId> {
        self.panes
            .map(|panes| panes.iter().map(|pane| pane.canvas).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MemoryBackend;

    struct Host {
        columns: Vec<Arc<Column>>,
        options: GridOptions,
        rows: usize,
    }

    impl LayoutHost for Host {
        fn columns(&self) -> &[Arc<Column>] {
            &self.columns
        }
        fn options(&self) -> &GridOptions {
            &self.options
        }
        fn data_length(&self) -> usize {
            self.rows
        }
        fn container_size(&self) -> Size {
            Size::new(500.0, 525.0)
        }
        fn scroll_top(&self) -> f32 {
            0.0
        }
        fn scroll_left(&self) -> f32 {
            0.0
        }
    }

    fn host(options: GridOptions) -> Host {
        Host {
            columns: (0..5)
                .map(|i| Arc::new(Column::new(format!("c{i}"), "f").with_width(100.0)))
                .collect(),
            options,
            rows: 100,
        }
    }

    fn ids(columns: &[Arc<Column>]) -> Vec<&str> {
        columns.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_reorder_moves_flagged_columns_first() {
        let layout = FrozenLayout::new();
        let mut columns = host(GridOptions::default()).columns;
        columns[3] = Arc::new(Column::new("c3", "f").with_frozen(true));
        columns[4] = Arc::new(Column::new("c4", "f").with_frozen(true));

        let options = GridOptions::default();
        let once = layout.reorder_view_columns(columns, &options);
        assert_eq!(ids(&once), vec!["c3", "c4", "c0", "c1", "c2"]);
        let twice = layout.reorder_view_columns(once.clone(), &options);
        assert_eq!(ids(&twice), ids(&once));
    }

    #[test]
    fn test_frozen_columns_out_of_range() {
        let mut layout = FrozenLayout::new();
        let mut backend = MemoryBackend::new();
        let result = layout.init(&host(GridOptions::default().with_frozen_columns(6)), &mut backend);
        assert_eq!(
            result,
            Err(GridError::FrozenColumnsOutOfRange { frozen: 6, columns: 5 })
        );

        let result = layout.init(&host(GridOptions::default().with_frozen_rows(101)), &mut backend);
        assert!(matches!(result, Err(GridError::FrozenRowsOutOfRange { .. })));
    }

    #[test]
    fn test_panes_for_frozen_rows_and_columns() {
        let mut layout = FrozenLayout::new();
        let mut backend = MemoryBackend::new();
        let host = host(GridOptions::default().with_frozen_columns(2).with_frozen_rows(3));
        layout.init(&host, &mut backend).unwrap();

        assert_eq!(layout.pane_for(0, 0), PaneId::TOP_LEFT);
        assert_eq!(layout.pane_for(3, 1), PaneId::TOP_RIGHT);
        assert_eq!(layout.pane_for(1, 10), PaneId::BOTTOM_LEFT);
        assert_eq!(layout.pane_for(4, 10), PaneId::BOTTOM_RIGHT);
        assert_eq!(layout.scroll_rows(100), 3..100);
        assert_eq!(layout.row_top(3, 25.0), 0.0);
        assert_eq!(layout.row_top(2, 25.0), 50.0);

        let info = layout.resize_canvas(&host, &mut backend);
        assert_eq!(info.pane_height, 425.0);
        assert_eq!(info.pane_width, 300.0);
        assert_eq!(layout.canvas_width(), 300.0);
        assert_eq!(layout.column_metrics().left(2), 0.0);
    }

    #[test]
    fn test_frozen_bottom_rows() {
        let mut layout = FrozenLayout::new();
        let mut backend = MemoryBackend::new();
        let host = host(GridOptions::default().with_frozen_rows(2).with_frozen_bottom(true));
        layout.init(&host, &mut backend).unwrap();

        assert!(layout.is_frozen_row(98));
        assert!(!layout.is_frozen_row(97));
        assert_eq!(layout.pane_for(0, 99), PaneId::BOTTOM_LEFT);
        assert_eq!(layout.pane_for(0, 0), PaneId::TOP_LEFT);
        assert_eq!(layout.scroll_rows(100), 0..98);
        assert_eq!(layout.row_top(99, 25.0), 25.0);
    }

    #[test]
    fn test_pane_nodes_are_stable_across_option_changes() {
        let mut layout = FrozenLayout::new();
        let mut backend = MemoryBackend::new();
        let mut host = host(GridOptions::default().with_frozen_columns(1));
        layout.init(&host, &mut backend).unwrap();
        let canvases = layout.canvas_nodes();
        assert_eq!(canvases.len(), 4);

        host.options.frozen_columns = Some(0);
        layout.after_set_options(&host, &mut backend).unwrap();
        assert_eq!(layout.canvas_nodes(), canvases);
        assert_eq!(layout.frozen_cols(), 0);
        assert_eq!(layout.pane_for(4, 0), PaneId::TOP_LEFT);

        let right = layout.pane(PaneId::TOP_RIGHT).map(|p| p.viewport);
        assert_eq!(right.and_then(|id| backend.node(id)).map(|n| n.visible), Some(false));
    }
}
