//! Logging and performance tracing facilities for Horizon Grid.
//!
//! Horizon Grid uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_grid::render=debug")
//!         .init();
//! }
//! ```

/// Span names used throughout Horizon Grid for tracing.
pub mod span_names {
    /// A full render pass.
    pub const RENDER: &str = "horizon_grid::render";
    /// One asynchronous post-render tick.
    pub const POST_RENDER: &str = "horizon_grid::post_render";
    /// One asynchronous post-render cleanup tick.
    pub const POST_CLEANUP: &str = "horizon_grid::post_cleanup";
    /// Canvas/viewport resize.
    pub const RESIZE: &str = "horizon_grid::resize";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Grid engine target.
    pub const GRID: &str = "horizon_grid";
    /// Render cycle and row cache.
    pub const RENDER: &str = "horizon_grid::render";
    /// Scroll handling.
    pub const SCROLL: &str = "horizon_grid::scroll";
    /// Layout engines.
    pub const LAYOUT: &str = "horizon_grid::layout";
    /// Editing and the editor lock.
    pub const EDIT: &str = "horizon_grid::edit";
    /// Timer system target.
    pub const TIMER: &str = "horizon_grid_core::timer";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_grid_core::signal";
}

/// A guard for performance tracing spans.
///
/// Create one at the start of an operation; the span closes when the guard
/// is dropped.
///
/// ```
/// use horizon_grid_core::logging::{PerfSpan, span_names};
///
/// fn render_pass() {
///     let _span = PerfSpan::new(span_names::RENDER);
///     // ...
/// }
/// ```
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_grid::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span_with_subscriber() {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter("horizon_grid=trace")
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let _span = PerfSpan::new(span_names::RENDER);
            tracing::debug!(target: targets::RENDER, rows = 3, "inside span");
        });
    }
}
