//! Error types for the grid crate.

use thiserror::Error;

/// Configuration and contract errors reported by the grid.
///
/// Validation failures and navigation boundaries are not errors; they are
/// reported through `false` returns and signals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// More frozen columns were requested than there are visible columns.
    #[error("frozen column count {frozen} exceeds the {columns} visible columns")]
    FrozenColumnsOutOfRange { frozen: usize, columns: usize },

    /// More frozen rows were requested than there are data rows.
    #[error("frozen row count {frozen} exceeds the {rows} data rows")]
    FrozenRowsOutOfRange { frozen: usize, rows: usize },

    /// Two columns share the same id.
    #[error("duplicate column id: {0}")]
    DuplicateColumnId(String),

    /// No column with the given id exists.
    #[error("unknown column id: {0}")]
    UnknownColumn(String),

    /// The editor lock is held by a different edit controller.
    #[error("editor lock is already held by another edit controller")]
    EditorLockHeld,

    /// The caller tried to release an editor lock it does not hold.
    #[error("editor lock is not held by this edit controller")]
    EditorLockNotHeld,

    /// A selection operation was attempted without a selection model.
    #[error("no selection model is set")]
    SelectionModelMissing,

    /// The grid has not been initialized yet.
    #[error("grid is not initialized")]
    NotInitialized,
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
