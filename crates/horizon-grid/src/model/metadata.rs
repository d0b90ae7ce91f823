//! Per-row metadata overrides supplied by a data source.

use std::collections::HashMap;
use std::sync::Arc;

use crate::edit::EditorFactory;
use crate::format::Formatter;

/// How many columns a cell spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colspan {
    /// A fixed number of columns (values below 1 are treated as 1).
    Cells(usize),
    /// Every remaining column to the end of the row.
    Rest,
}

impl Colspan {
    /// Resolve to a concrete span for a cell at `cell` in a row of
    /// `column_count` columns.
    pub fn resolve(self, cell: usize, column_count: usize) -> usize {
        let remaining = column_count.saturating_sub(cell).max(1);
        match self {
            Colspan::Cells(n) => n.clamp(1, remaining),
            Colspan::Rest => remaining,
        }
    }
}

/// Key of a per-column override.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    /// Matches the column with this id.
    Id(String),
    /// Matches the column at this visible index.
    Index(usize),
}

/// Overrides for one column of one row.
#[derive(Clone, Default)]
pub struct ColumnMetadata {
    /// Column span of the cell.
    pub colspan: Option<Colspan>,
    /// Formatter used instead of the column's.
    pub formatter: Option<Formatter>,
    /// Overrides whether the cell can become active.
    pub focusable: Option<bool>,
    /// Overrides whether the cell can be selected.
    pub selectable: Option<bool>,
    /// Editor used instead of the column's.
    pub editor: Option<Arc<dyn EditorFactory>>,
}

impl ColumnMetadata {
    /// Create an empty override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column span.
    pub fn with_colspan(mut self, colspan: Colspan) -> Self {
        self.colspan = Some(colspan);
        self
    }

    /// Set the formatter.
    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Set whether the cell can become active.
    pub fn with_focusable(mut self, focusable: bool) -> Self {
        self.focusable = Some(focusable);
        self
    }
}

impl std::fmt::Debug for ColumnMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnMetadata")
            .field("colspan", &self.colspan)
            .field("formatter", &self.formatter.is_some())
            .field("focusable", &self.focusable)
            .field("selectable", &self.selectable)
            .field("editor", &self.editor.is_some())
            .finish()
    }
}

/// Row-level metadata.
#[derive(Clone, Default)]
pub struct ItemMetadata {
    /// Extra css classes for the row (space separated).
    pub css_classes: Option<String>,
    /// Whether any cell of the row can become active.
    pub focusable: Option<bool>,
    /// Whether the row can be selected.
    pub selectable: Option<bool>,
    /// Formatter for every cell of the row without a column override.
    pub formatter: Option<Formatter>,
    /// Per-column overrides.
    pub columns: HashMap<ColumnKey, ColumnMetadata>,
}

impl ItemMetadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row css classes.
    pub fn with_css_classes(mut self, classes: impl Into<String>) -> Self {
        self.css_classes = Some(classes.into());
        self
    }

    /// Set whether the row can become active.
    pub fn with_focusable(mut self, focusable: bool) -> Self {
        self.focusable = Some(focusable);
        self
    }

    /// Set whether the row can be selected.
    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = Some(selectable);
        self
    }

    /// Set the row formatter.
    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Add an override for the column with the given id.
    pub fn with_column(mut self, id: impl Into<String>, metadata: ColumnMetadata) -> Self {
        self.columns.insert(ColumnKey::Id(id.into()), metadata);
        self
    }

    /// Add an override for the column at the given index.
    pub fn with_column_index(mut self, index: usize, metadata: ColumnMetadata) -> Self {
        self.columns.insert(ColumnKey::Index(index), metadata);
        self
    }

    /// Look up the override for a column, by id first and then by index.
    pub fn column(&self, id: &str, index: usize) -> Option<&ColumnMetadata> {
        if self.columns.is_empty() {
            return None;
        }
        self.columns
            .get(&ColumnKey::Id(id.to_string()))
            .or_else(|| self.columns.get(&ColumnKey::Index(index)))
    }
}

impl std::fmt::Debug for ItemMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemMetadata")
            .field("css_classes", &self.css_classes)
            .field("focusable", &self.focusable)
            .field("selectable", &self.selectable)
            .field("formatter", &self.formatter.is_some())
            .field("columns", &self.columns)
            .finish()
    }
}
