//! Single-pane layout.

use std::ops::Range;
use std::sync::Arc;

use horizon_grid_core::logging::targets;

use super::{ColumnMetrics, LayoutEngine, LayoutHost, PaneNodes, Size, ViewportInfo, rows_in};
use crate::column::Column;
use crate::error::Result;
use crate::options::GridOptions;
use crate::render::{NodeId, PaneId, RenderBackend};

/// A layout with one pane holding every column and row.
///
/// Frozen column and row options are ignored.
#[derive(Debug, Default)]
pub struct BasicLayout {
    pane: Option<PaneNodes>,
    metrics: ColumnMetrics,
    canvas_width: f32,
    canvas_height: f32,
}

impl BasicLayout {
    /// Create the layout. Pane nodes are created by `init`.
    pub fn new() -> Self {
        Self::default()
    }

    fn size_canvas(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) {
        self.canvas_height = host.data_length() as f32 * host.options().row_height;
        if let Some(pane) = self.pane {
            backend.set_size(pane.canvas, self.canvas_width, self.canvas_height);
        }
    }
}

impl LayoutEngine for BasicLayout {
    fn layout_name(&self) -> &'static str {
        "basic"
    }

    fn init(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) -> Result<()> {
        if self.pane.is_none() {
            self.pane = Some(PaneNodes::create(backend, PaneId::TOP_LEFT));
        }
        self.apply_column_widths(host);
        self.canvas_width = self.calc_canvas_width(host);
        self.size_canvas(host, backend);
        tracing::debug!(target: targets::LAYOUT, layout = self.layout_name(), "layout initialized");
        Ok(())
    }

    fn after_set_options(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) -> Result<()> {
        self.apply_column_widths(host);
        self.update_canvas_width(host, backend);
        Ok(())
    }

    fn destroy(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(pane) = self.pane.take() {
            pane.remove(backend);
        }
    }

    fn reorder_view_columns(&self, columns: Vec<Arc<Column>>, _options: &GridOptions) -> Vec<Arc<Column>> {
        columns
    }

    fn frozen_cols(&self) -> usize {
        0
    }

    fn frozen_rows(&self) -> usize {
        0
    }

    fn is_frozen_row(&self, _row: usize) -> bool {
        false
    }

    fn scroll_rows(&self, data_length: usize) -> Range<usize> {
        0..data_length
    }

    fn row_top(&self, row: usize, row_height: f32) -> f32 {
        row as f32 * row_height
    }

    fn apply_column_widths(&mut self, host: &dyn LayoutHost) {
        self.metrics = ColumnMetrics::compute(host.columns(), 0);
    }

    fn column_metrics(&self) -> &ColumnMetrics {
        &self.metrics
    }

    fn canvas_width(&self) -> f32 {
        self.canvas_width
    }

    fn calc_canvas_width(&self, host: &dyn LayoutHost) -> f32 {
        let diff = host.options().cell_width_diff;
        let width: f32 = host.columns().iter().map(|c| c.width + diff).sum();
        width.max(0.0)
    }

    fn update_canvas_width(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) -> bool {
        let width = self.calc_canvas_width(host);
        let changed = width != self.canvas_width;
        self.canvas_width = width;
        if let Some(pane) = self.pane {
            backend.set_size(pane.canvas, width, self.canvas_height);
            backend.set_size(pane.header, width, host.options().header_height);
        }
        changed
    }

    fn resize_canvas(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) -> ViewportInfo {
        let options = host.options();
        let Size { width, height } = host.container_size();
        let height = (height - options.chrome_height()).max(0.0);
        let virtual_height = host.data_length() as f32 * options.row_height;

        if let Some(pane) = self.pane {
            backend.set_position(pane.viewport, 0.0, options.chrome_height());
            backend.set_size(pane.viewport, width, height);
            backend.set_visible(pane.header, options.show_column_header);
            backend.set_size(pane.header, self.canvas_width, options.header_height);
        }
        self.size_canvas(host, backend);

        ViewportInfo {
            width,
            height,
            pane_width: width,
            pane_height: height,
            virtual_height,
            num_visible_rows: rows_in(height, options.row_height),
            has_v_scroll: virtual_height > height,
            has_h_scroll: self.canvas_width > width,
        }
    }

    fn update_row_count(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) {
        self.size_canvas(host, backend);
    }

    fn pane_for(&self, _cell: usize, _row: usize) -> PaneId {
        PaneId::TOP_LEFT
    }

    fn canvas_node_for(&self, _cell: usize, _row: usize) -> Option<NodeId> {
        self.pane.map(|pane| pane.canvas)
    }

    fn viewport_node_for(&self, _cell: usize, _row: usize) -> Option<NodeId> {
        self.pane.map(|pane| pane.viewport)
    }

    fn header_node_for(&self, _cell: usize) -> Option<NodeId> {
        self.pane.map(|pane| pane.header)
    }

    fn canvas_nodes(&self) -> Vec<NodeId> {
        self.pane.map(|pane| pane.canvas).into_iter().collect()
    }
}
