//! Pluggable pane layouts.
//!
//! A [`LayoutEngine`] owns the pane containers of the grid (viewport, canvas
//! and header nodes), decides which pane a cell lives in, and computes the
//! column offsets and pane sizes the viewport calculator works from.
//!
//! Two engines are provided:
//!
//! - [`BasicLayout`]: a single pane
//! - [`FrozenLayout`]: up to four panes for frozen columns and rows
//!
//! Pane nodes are created once in [`LayoutEngine::init`] and live as long as
//! the engine; the render cycle only ever adds and removes rows inside them.

mod basic;
mod frozen;

use std::ops::Range;
use std::sync::Arc;

pub use basic::BasicLayout;
pub use frozen::FrozenLayout;

use crate::column::Column;
use crate::error::Result;
use crate::options::GridOptions;
use crate::render::{NodeId, NodeKind, PaneId, RenderBackend};

/// A width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Size {
    /// Create a size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Pane geometry computed by [`LayoutEngine::resize_canvas`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportInfo {
    /// Width of the whole viewport area.
    pub width: f32,
    /// Height of the viewport area below the header strips.
    pub height: f32,
    /// Width of the pane that scrolls horizontally.
    pub pane_width: f32,
    /// Height of the pane that scrolls vertically.
    pub pane_height: f32,
    /// Height of the scrolling canvas.
    pub virtual_height: f32,
    /// Rows that fit into the scrolling pane.
    pub num_visible_rows: usize,
    /// The scrolling canvas is taller than its pane.
    pub has_v_scroll: bool,
    /// The scrolling canvas is wider than its pane.
    pub has_h_scroll: bool,
}

/// Left and right offsets of the view columns.
///
/// Offsets restart at zero after the frozen columns, since frozen and
/// scrolling columns live on different canvases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMetrics {
    left: Vec<f32>,
    right: Vec<f32>,
    frozen: usize,
}

impl ColumnMetrics {
    /// Compute offsets for `columns`, the first `frozen` of which are pinned.
    pub fn compute(columns: &[Arc<Column>], frozen: usize) -> Self {
        let mut left = Vec::with_capacity(columns.len());
        let mut right = Vec::with_capacity(columns.len());
        let mut x = 0.0;
        for (index, column) in columns.iter().enumerate() {
            if index == frozen && frozen > 0 {
                x = 0.0;
            }
            left.push(x);
            x += column.width;
            right.push(x);
        }
        Self {
            left,
            right,
            frozen: frozen.min(columns.len()),
        }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Returns `true` if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Number of frozen columns.
    pub fn frozen(&self) -> usize {
        self.frozen
    }

    /// Left offset of `cell` on its canvas.
    pub fn left(&self, cell: usize) -> f32 {
        self.left.get(cell).copied().unwrap_or(0.0)
    }

    /// Right offset of `cell` on its canvas.
    pub fn right(&self, cell: usize) -> f32 {
        self.right.get(cell).copied().unwrap_or(0.0)
    }

    /// Width of a cell spanning `colspan` columns from `cell`.
    pub fn span_width(&self, cell: usize, colspan: usize) -> f32 {
        let last = (cell + colspan.max(1) - 1).min(self.len().saturating_sub(1));
        // A span starting in the frozen section is cut at the boundary.
        let last = if cell < self.frozen {
            last.min(self.frozen - 1)
        } else {
            last
        };
        (self.right(last) - self.left(cell)).max(0.0)
    }

    /// Total width of the frozen columns.
    pub fn frozen_width(&self) -> f32 {
        if self.frozen == 0 {
            0.0
        } else {
            self.right(self.frozen - 1)
        }
    }

    /// Total width of the scrolling columns.
    pub fn scrolling_width(&self) -> f32 {
        if self.len() > self.frozen {
            self.right(self.len() - 1)
        } else {
            0.0
        }
    }

    /// Total width of all columns.
    pub fn total_width(&self) -> f32 {
        self.frozen_width() + self.scrolling_width()
    }

    /// Scrolling columns intersecting the pixel span `[left_px, right_px)`.
    pub fn scrolling_columns_in(&self, left_px: f32, right_px: f32) -> Range<usize> {
        let lefts = &self.left[self.frozen..];
        let rights = &self.right[self.frozen..];
        let first = rights.partition_point(|right| *right <= left_px);
        let end = lefts.partition_point(|left| *left < right_px);
        (self.frozen + first)..(self.frozen + end.max(first))
    }
}

/// What a layout engine may read from the grid.
pub trait LayoutHost {
    /// The view columns, already reordered by the engine.
    fn columns(&self) -> &[Arc<Column>];

    /// The grid options.
    fn options(&self) -> &GridOptions;

    /// Number of data rows.
    fn data_length(&self) -> usize;

    /// Size of the grid container.
    fn container_size(&self) -> Size;

    /// Current vertical scroll offset of the scrolling pane.
    fn scroll_top(&self) -> f32;

    /// Current horizontal scroll offset of the scrolling pane.
    fn scroll_left(&self) -> f32;
}

/// A pane layout strategy.
pub trait LayoutEngine: Send {
    /// Short name used in logs.
    fn layout_name(&self) -> &'static str;

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create the pane nodes and compute the initial geometry.
    fn init(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) -> Result<()>;

    /// Re-read options after they changed. Fails if the configured frozen
    /// counts do not fit the current columns or rows.
    fn after_set_options(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) -> Result<()>;

    /// Remove the pane nodes.
    fn destroy(&mut self, backend: &mut dyn RenderBackend);

    // =========================================================================
    // Columns and rows
    // =========================================================================

    /// Order the view columns for this layout. Applying it twice yields the
    /// same order as applying it once.
    fn reorder_view_columns(&self, columns: Vec<Arc<Column>>, options: &GridOptions) -> Vec<Arc<Column>>;

    /// Number of frozen columns.
    fn frozen_cols(&self) -> usize;

    /// Number of frozen rows.
    fn frozen_rows(&self) -> usize;

    /// Returns `true` if `row` is rendered in the frozen row pane.
    fn is_frozen_row(&self, row: usize) -> bool;

    /// Rows that live in the vertically scrolling pane.
    fn scroll_rows(&self, data_length: usize) -> Range<usize>;

    /// Top offset of `row` inside its canvas.
    fn row_top(&self, row: usize, row_height: f32) -> f32;

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Recompute column offsets from the host's columns.
    fn apply_column_widths(&mut self, host: &dyn LayoutHost);

    /// Column offsets computed by the last [`apply_column_widths`](Self::apply_column_widths).
    fn column_metrics(&self) -> &ColumnMetrics;

    /// Width of the canvas that scrolls horizontally.
    fn canvas_width(&self) -> f32;

    /// Compute the width the scrolling canvas should have.
    fn calc_canvas_width(&self, host: &dyn LayoutHost) -> f32;

    /// Apply a changed canvas width. Returns `true` if the width changed.
    fn update_canvas_width(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) -> bool;

    /// Size the panes for the current container.
    fn resize_canvas(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend) -> ViewportInfo;

    /// Resize canvases after the number of rows changed.
    fn update_row_count(&mut self, host: &dyn LayoutHost, backend: &mut dyn RenderBackend);

    // =========================================================================
    // Pane nodes
    // =========================================================================

    /// The pane a cell belongs to.
    fn pane_for(&self, cell: usize, row: usize) -> PaneId;

    /// Canvas node the cell's row node lives in.
    fn canvas_node_for(&self, cell: usize, row: usize) -> Option<NodeId>;

    /// Viewport node of the cell's pane.
    fn viewport_node_for(&self, cell: usize, row: usize) -> Option<NodeId>;

    /// Header node above `cell`.
    fn header_node_for(&self, cell: usize) -> Option<NodeId>;

    /// Every canvas node the engine created.
    fn canvas_nodes(&self) -> Vec<NodeId>;
}

/// The viewport, canvas and header nodes of one pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PaneNodes {
    pub viewport: NodeId,
    pub canvas: NodeId,
    pub header: NodeId,
}

impl PaneNodes {
    pub fn create(backend: &mut dyn RenderBackend, pane: PaneId) -> Self {
        let viewport = backend.create_node(None, NodeKind::Viewport(pane));
        let canvas = backend.create_node(Some(viewport), NodeKind::Canvas(pane));
        let header = backend.create_node(None, NodeKind::Header(pane));
        backend.set_class(viewport, "slick-viewport", true);
        backend.set_class(canvas, "grid-canvas", true);
        backend.set_class(header, "slick-header", true);
        Self { viewport, canvas, header }
    }

    pub fn set_visible(&self, backend: &mut dyn RenderBackend, visible: bool) {
        backend.set_visible(self.viewport, visible);
        backend.set_visible(self.header, visible);
    }

    pub fn remove(&self, backend: &mut dyn RenderBackend) {
        backend.remove_node(self.viewport);
        backend.remove_node(self.header);
    }
}

/// Rows that fit into `height`, rounded up.
pub(crate) fn rows_in(height: f32, row_height: f32) -> usize {
    if row_height <= 0.0 {
        0
    } else {
        (height / row_height).ceil() as usize
    }
}
