//! Viewport range calculation.
//!
//! Translates scroll offsets and pane sizes into the window of rows (and the
//! horizontal pixel span) that is visible, and widens it by a buffer to get
//! the range the render cycle materializes.
//!
//! The buffer has a fixed part, `min_buffer` rows on both sides, and an
//! adaptive part that grows with how far the user jumps per scroll event. The
//! adaptive part is added only on the side the user is scrolling toward.

use std::ops::Range;

/// Smoothing factor of the scroll jumpiness moving average.
pub const JUMPINESS_SMOOTHING: f32 = 0.3;

/// A window of rows and horizontal pixels.
///
/// Rows are half-open: `top` is the first row in the window and `bottom` is
/// one past the last.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewRange {
    /// First row.
    pub top: usize,
    /// One past the last row.
    pub bottom: usize,
    /// Left edge in canvas pixels of the scrolling columns.
    pub left_px: f32,
    /// Right edge in canvas pixels of the scrolling columns.
    pub right_px: f32,
}

impl ViewRange {
    /// The rows of the window.
    pub fn rows(&self) -> Range<usize> {
        self.top..self.bottom
    }

    /// Number of rows in the window.
    pub fn row_count(&self) -> usize {
        self.bottom.saturating_sub(self.top)
    }

    /// Returns `true` if the window holds no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Returns `true` if `row` is inside the window.
    pub fn contains_row(&self, row: usize) -> bool {
        self.rows().contains(&row)
    }

    /// Returns `true` if `other` lies entirely inside this window.
    pub fn contains(&self, other: &ViewRange) -> bool {
        let rows_inside = other.is_empty() || (other.top >= self.top && other.bottom <= self.bottom);
        rows_inside && other.left_px >= self.left_px && other.right_px <= self.right_px
    }
}

/// Vertical scroll direction of the most recent scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    /// Toward row 0.
    Up,
    /// No vertical scroll yet.
    #[default]
    None,
    /// Toward the last row.
    Down,
}

/// Extra rows rendered before and after the visible rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowBuffer {
    /// Rows above the visible window.
    pub before: usize,
    /// Rows below the visible window.
    pub after: usize,
}

/// Tracks the scroll direction and how erratic scrolling has been.
#[derive(Debug, Clone, Default)]
pub struct ScrollTracker {
    direction: ScrollDirection,
    jumpiness: f32,
}

impl ScrollTracker {
    /// Create a tracker with no scroll history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vertical scroll from `previous_top` to `top`.
    pub fn record(&mut self, previous_top: f32, top: f32, row_height: f32) {
        let delta = top - previous_top;
        if delta == 0.0 || row_height <= 0.0 {
            return;
        }
        self.direction = if delta > 0.0 {
            ScrollDirection::Down
        } else {
            ScrollDirection::Up
        };
        let rows = delta.abs() / row_height;
        self.jumpiness += JUMPINESS_SMOOTHING * (rows - self.jumpiness);
    }

    /// Direction of the most recent vertical scroll.
    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// Moving average of rows jumped per scroll event.
    pub fn jumpiness(&self) -> f32 {
        self.jumpiness
    }

    /// Buffer for the next render: `min_buffer` on both sides, plus the
    /// adaptive part (capped at `visible_rows`) toward the scroll direction.
    pub fn buffer(&self, min_buffer: usize, visible_rows: usize) -> RowBuffer {
        let adaptive = (self.jumpiness.round() as usize).min(visible_rows);
        match self.direction {
            ScrollDirection::Down => RowBuffer {
                before: min_buffer,
                after: min_buffer + adaptive,
            },
            ScrollDirection::Up => RowBuffer {
                before: min_buffer + adaptive,
                after: min_buffer,
            },
            ScrollDirection::None => RowBuffer {
                before: min_buffer,
                after: min_buffer,
            },
        }
    }

    /// Forget the scroll history.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Geometry of the scrolling pane needed to compute ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportMetrics {
    /// Height of one row.
    pub row_height: f32,
    /// Height of the scrolling pane.
    pub pane_height: f32,
    /// Width of the scrolling pane.
    pub pane_width: f32,
    /// Width of the scrolling canvas.
    pub canvas_width: f32,
    /// Rows that scroll: the first one, and one past the last one.
    pub scroll_rows: Range<usize>,
}

impl ViewportMetrics {
    /// Number of rows that fit into the scrolling pane.
    pub fn visible_row_capacity(&self) -> usize {
        if self.row_height <= 0.0 {
            return 0;
        }
        (self.pane_height / self.row_height).ceil() as usize
    }

    /// The rows and pixels visible at the given scroll offsets.
    pub fn visible_range(&self, scroll_top: f32, scroll_left: f32) -> ViewRange {
        let rows = self.pixel_rows(scroll_top, scroll_top + self.pane_height);
        ViewRange {
            top: rows.start,
            bottom: rows.end,
            left_px: scroll_left,
            right_px: scroll_left + self.pane_width,
        }
    }

    /// Widen `visible` by `buffer` rows and one pane width each side.
    pub fn buffered_range(&self, visible: ViewRange, buffer: RowBuffer, render_all_cells: bool) -> ViewRange {
        let top = visible
            .top
            .saturating_sub(buffer.before)
            .max(self.scroll_rows.start);
        let bottom = (visible.bottom + buffer.after).min(self.scroll_rows.end);
        let (left_px, right_px) = if render_all_cells {
            (0.0, self.canvas_width.max(visible.right_px))
        } else {
            (
                (visible.left_px - self.pane_width).max(0.0),
                (visible.right_px + self.pane_width).min(self.canvas_width.max(visible.right_px)),
            )
        };
        ViewRange {
            top: top.min(bottom),
            bottom,
            left_px,
            right_px,
        }
    }

    /// Rows intersecting the pixel span `[from_px, to_px]` of the scrolling
    /// pane, clamped to the scrolling rows.
    fn pixel_rows(&self, from_px: f32, to_px: f32) -> Range<usize> {
        if self.row_height <= 0.0 || self.scroll_rows.is_empty() {
            return self.scroll_rows.start..self.scroll_rows.start;
        }
        let first = self.scroll_rows.start + (from_px.max(0.0) / self.row_height).floor() as usize;
        let last = self.scroll_rows.start + (to_px.max(0.0) / self.row_height).floor() as usize;
        let end = self.scroll_rows.end;
        first.min(end)..(last + 1).min(end)
    }
}
