//! Horizon Grid - a virtualized, spreadsheet-like data grid engine.
//!
//! The grid shows rows from a [`DataSource`](model::DataSource) and only
//! materializes the rows inside the viewport plus a scroll-adaptive buffer.
//! It renders into any [`RenderBackend`](render::RenderBackend); the
//! in-memory [`MemoryBackend`](render::MemoryBackend) is the default.
//!
//! - [`Grid`]: rendering, scrolling, active cell, navigation and editing
//! - [`layout`]: single-pane and frozen (four-pane) layouts
//! - [`model`]: data sources, row metadata and selection models
//! - [`edit`]: editors, the editor lock and edit commands
//! - [`format`]: cell formatters
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_grid::{Column, Direction, Grid, GridOptions};
//! use horizon_grid::model::{record, RowItem, Value, VecDataSource};
//!
//! let rows = (0..100)
//!     .map(|i| RowItem::Data(record([("id", Value::from(i))])))
//!     .collect();
//! let mut grid = Grid::in_memory()
//!     .data(Arc::new(VecDataSource::from_rows(rows)))
//!     .columns([Column::new("id", "id").with_name("Id")])
//!     .options(GridOptions::new().with_frozen_rows(1))
//!     .build()
//!     .unwrap();
//!
//! assert!(grid.set_active_cell(5, 0));
//! assert!(grid.navigate(Direction::Down));
//! assert_eq!(grid.active_cell().map(|p| p.row), Some(6));
//! ```

mod column;
pub mod edit;
mod error;
pub mod format;
mod grid;
pub mod layout;
pub mod model;
mod options;
pub mod render;
pub mod signals;
pub mod viewport;

pub use column::{
    AsyncPostCleanup, AsyncPostRender, Column, ColumnSort, DEFAULT_COLUMN_WIDTH, DEFAULT_MIN_COLUMN_WIDTH,
    PostCleanupArgs, PostRenderArgs, Validator,
};
pub use error::{GridError, Result};
pub use grid::{CellStyles, DEFAULT_CONTAINER_SIZE, Direction, Grid, GridBuilder, Key, KeyboardModifiers, SortModifier};
pub use options::{DEFAULT_ROW_HEIGHT, GridOptions, ValueExtractor};
pub use signals::{CellPosition, GridSignals};
pub use viewport::ViewRange;
