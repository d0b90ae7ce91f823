//! Data model contracts for the grid.
//!
//! The grid consumes any [`DataSource`]: an indexed sequence of [`RowItem`]s
//! (data records or group rows) with optional per-row [`ItemMetadata`] and
//! change notifications through [`DataSignals`].
//!
//! - [`Value`] and [`Record`]: field access on data items
//! - [`VecDataSource`]: an in-memory data source
//! - [`CellRange`] and [`SelectionModel`]: selection contracts

mod item;
mod metadata;
mod range;
mod selection;
mod traits;
mod value;
mod vec_source;

pub use item::{Group, GroupTotals, ItemHandle, Record, RowItem, item_handle, record};
pub use metadata::{Colspan, ColumnKey, ColumnMetadata, ItemMetadata};
pub use range::CellRange;
pub use selection::{RowSelectionModel, SelectionModel, SelectionSignals};
pub use traits::{DataSignals, DataSource, RowCountChange};
pub use value::Value;
pub use vec_source::{GROUP_CSS_CLASS, GROUP_TOTALS_CSS_CLASS, MetadataProvider, VecDataSource};
