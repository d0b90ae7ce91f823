//! Bookkeeping of materialized rows.
//!
//! The cache maps data row indices to the nodes rendered for them. It decides
//! which rows to drop when the rendered range moves, which cached rows are
//! stale, and which rows still have to be created.

use std::collections::BTreeMap;
use std::ops::Range;

use super::backend::NodeId;

/// A rendered cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CachedCell {
    pub node: NodeId,
    pub colspan: usize,
}

/// The nodes rendered for one data row.
#[derive(Debug, Clone)]
pub(crate) struct RowCacheEntry {
    /// One row node per pane column: left, then right when columns are frozen.
    pub row_nodes: Vec<NodeId>,
    /// Rendered cells keyed by the first column they cover.
    pub cells: BTreeMap<usize, CachedCell>,
    /// The item changed since the row was rendered.
    pub dirty: bool,
    /// The row was rendered from a group or totals item.
    pub non_data: bool,
    /// Classes taken from the row metadata on the last render.
    pub row_classes: Vec<String>,
}

impl RowCacheEntry {
    pub fn new(row_nodes: Vec<NodeId>, non_data: bool) -> Self {
        Self {
            row_nodes,
            cells: BTreeMap::new(),
            dirty: false,
            non_data,
            row_classes: Vec::new(),
        }
    }

    pub fn cell_node(&self, cell: usize) -> Option<NodeId> {
        self.cells.get(&cell).map(|c| c.node)
    }

    /// The rendered cell covering `column`, taking colspans into account.
    pub fn cell_covering(&self, column: usize) -> Option<(usize, CachedCell)> {
        self.cells
            .range(..=column)
            .next_back()
            .filter(|(start, cell)| **start + cell.colspan > column)
            .map(|(start, cell)| (*start, *cell))
    }

    /// Returns `true` if the cell layout differs from `spans` for the cells
    /// that are rendered.
    pub fn layout_differs(&self, spans: &[(usize, usize)]) -> bool {
        self.cells.iter().any(|(start, cell)| {
            !spans
                .iter()
                .any(|(s, colspan)| s == start && *colspan == cell.colspan)
        })
    }
}

/// Cache of rendered rows, keyed by data row index.
#[derive(Debug, Default)]
pub(crate) struct RowCache {
    entries: BTreeMap<usize, RowCacheEntry>,
}

impl RowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, row: usize) -> bool {
        self.entries.contains_key(&row)
    }

    pub fn get(&self, row: usize) -> Option<&RowCacheEntry> {
        self.entries.get(&row)
    }

    pub fn get_mut(&mut self, row: usize) -> Option<&mut RowCacheEntry> {
        self.entries.get_mut(&row)
    }

    pub fn insert(&mut self, row: usize, entry: RowCacheEntry) {
        self.entries.insert(row, entry);
    }

    pub fn remove(&mut self, row: usize) -> Option<RowCacheEntry> {
        self.entries.remove(&row)
    }

    /// Cached row indices, ascending.
    pub fn rows(&self) -> Vec<usize> {
        self.entries.keys().copied().collect()
    }

    pub fn cell_node(&self, row: usize, cell: usize) -> Option<NodeId> {
        self.entries.get(&row)?.cell_node(cell)
    }

    /// Mark a cached row stale. Returns `false` if the row is not cached.
    pub fn mark_dirty(&mut self, row: usize) -> bool {
        match self.entries.get_mut(&row) {
            Some(entry) => {
                entry.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Rows that fall outside `keep` (or beyond the data) and are not pinned.
    pub fn rows_to_remove(
        &self,
        keep: &Range<usize>,
        data_len: usize,
        pinned: impl Fn(usize) -> bool,
    ) -> Vec<usize> {
        self.entries
            .keys()
            .copied()
            .filter(|row| *row >= data_len || (!keep.contains(row) && !pinned(*row)))
            .collect()
    }

    /// Stale rows among `rows`.
    pub fn dirty_rows(&self, rows: impl IntoIterator<Item = usize>) -> Vec<usize> {
        rows.into_iter()
            .filter(|row| self.entries.get(row).is_some_and(|entry| entry.dirty))
            .collect()
    }

    /// Rows among `rows` that have no cache entry.
    pub fn missing_rows(&self, rows: impl IntoIterator<Item = usize>) -> Vec<usize> {
        rows.into_iter().filter(|row| !self.contains(*row)).collect()
    }
}
