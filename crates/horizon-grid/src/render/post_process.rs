//! State of async post-render decoration and its deferred cleanup.
//!
//! Decoration runs one row per timer tick over the rows of the last render.
//! Rows that leave the rendered range after being decorated are not destroyed
//! right away: they are parked and queued for cleanup, grouped so one tick
//! cleans one row. A parked row that re-enters the range before its cleanup
//! runs is handed back intact.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use super::backend::NodeId;
use super::row_cache::RowCacheEntry;
use crate::column::Column;
use crate::viewport::ScrollDirection;

/// Post-render state of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PostStatus {
    /// Decorated and up to date.
    Rendered,
    /// Decorated, but the row changed since; decorate again.
    Stale,
}

/// A row removed from the cache but not destroyed yet.
pub(crate) struct ParkedRow {
    group: u64,
    pub entry: RowCacheEntry,
    pub status: HashMap<usize, PostStatus>,
}

/// A deferred cleanup step.
pub(crate) enum CleanupAction {
    /// Run the column's cleanup callback on a cell, then destroy the node if
    /// `remove` is set (cells cleaned with their row go away with the row).
    Cell {
        row: usize,
        column: Arc<Column>,
        node: NodeId,
        remove: bool,
    },
    /// Destroy the nodes of a parked row.
    Row { row: usize },
}

struct CleanupEntry {
    group: u64,
    action: CleanupAction,
}

#[derive(Default)]
pub(crate) struct PostProcessor {
    status: HashMap<usize, HashMap<usize, PostStatus>>,
    pending: VecDeque<usize>,
    queue: VecDeque<CleanupEntry>,
    parked: BTreeMap<usize, ParkedRow>,
    orphaned: Vec<RowCacheEntry>,
    next_group: u64,
}

impl PostProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart decoration over `rows`.
    pub fn set_rows(&mut self, rows: impl IntoIterator<Item = usize>) {
        self.pending = rows.into_iter().collect();
    }

    /// Next row to decorate, walking in the scroll direction.
    pub fn next_row(&mut self, direction: ScrollDirection) -> Option<usize> {
        match direction {
            ScrollDirection::Up => self.pending.pop_back(),
            ScrollDirection::None | ScrollDirection::Down => self.pending.pop_front(),
        }
    }

    pub fn has_pending_rows(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn status(&self, row: usize, cell: usize) -> Option<PostStatus> {
        self.status.get(&row)?.get(&cell).copied()
    }

    pub fn mark_rendered(&mut self, row: usize, cell: usize) {
        self.status
            .entry(row)
            .or_default()
            .insert(cell, PostStatus::Rendered);
    }

    pub fn is_decorated(&self, row: usize) -> bool {
        self.status.get(&row).is_some_and(|cells| !cells.is_empty())
    }

    /// Forget decoration results of a changed row. With cleanup enabled the
    /// cells are marked stale so the callback knows it re-renders.
    pub fn invalidate_row(&mut self, row: usize, keep_for_cleanup: bool) {
        if keep_for_cleanup {
            if let Some(cells) = self.status.get_mut(&row) {
                cells.values_mut().for_each(|s| *s = PostStatus::Stale);
            }
        } else {
            self.status.remove(&row);
        }
    }

    pub fn forget_row(&mut self, row: usize) {
        self.status.remove(&row);
    }

    pub fn forget_cell(&mut self, row: usize, cell: usize) {
        if let Some(cells) = self.status.get_mut(&row) {
            cells.remove(&cell);
        }
    }

    /// Park a removed row and queue its cleanup as one group.
    pub fn park_row(&mut self, row: usize, entry: RowCacheEntry, columns: &[Arc<Column>]) {
        let group = self.allocate_group();
        let status = self.status.remove(&row).unwrap_or_default();
        for cell in status.keys() {
            if let (Some(column), Some(node)) = (columns.get(*cell), entry.cell_node(*cell)) {
                self.queue.push_back(CleanupEntry {
                    group,
                    action: CleanupAction::Cell {
                        row,
                        column: column.clone(),
                        node,
                        remove: false,
                    },
                });
            }
        }
        self.queue.push_back(CleanupEntry {
            group,
            action: CleanupAction::Row { row },
        });
        // A row parked twice keeps only the latest nodes.
        if let Some(previous) = self.parked.insert(row, ParkedRow { group, entry, status }) {
            self.queue.retain(|e| e.group != previous.group);
            self.orphaned.push(previous.entry);
        }
    }

    /// Queue cleanup of a single decorated cell that left the column range.
    pub fn queue_cell(&mut self, row: usize, cell: usize, column: Arc<Column>, node: NodeId) {
        let group = self.allocate_group();
        self.forget_cell(row, cell);
        self.queue.push_back(CleanupEntry {
            group,
            action: CleanupAction::Cell {
                row,
                column,
                node,
                remove: true,
            },
        });
    }

    /// Take a parked row back, cancelling its cleanup.
    pub fn rescue(&mut self, row: usize) -> Option<RowCacheEntry> {
        let parked = self.parked.remove(&row)?;
        self.queue.retain(|e| e.group != parked.group);
        if !parked.status.is_empty() {
            self.status.insert(row, parked.status);
        }
        Some(parked.entry)
    }

    /// Mark a parked row stale so it is refreshed if rescued. Returns
    /// `false` if the row is not parked.
    pub fn mark_parked_dirty(&mut self, row: usize) -> bool {
        match self.parked.get_mut(&row) {
            Some(parked) => {
                parked.entry.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_parked_dirty(&mut self) {
        self.parked.values_mut().for_each(|p| p.entry.dirty = true);
    }

    pub fn is_parked(&self, row: usize) -> bool {
        self.parked.contains_key(&row)
    }

    pub fn has_pending_cleanup(&self) -> bool {
        !self.queue.is_empty() || !self.orphaned.is_empty()
    }

    /// Pop every action of the oldest cleanup group.
    pub fn next_cleanup_group(&mut self) -> Vec<CleanupAction> {
        let Some(group) = self.queue.front().map(|e| e.group) else {
            return Vec::new();
        };
        let mut actions = Vec::new();
        while self.queue.front().is_some_and(|e| e.group == group) {
            if let Some(entry) = self.queue.pop_front() {
                actions.push(entry.action);
            }
        }
        actions
    }

    /// Remove the parked row a `Row` action refers to.
    pub fn take_parked(&mut self, row: usize) -> Option<RowCacheEntry> {
        self.parked.remove(&row).map(|parked| parked.entry)
    }

    /// Entries displaced by re-parking a row; destroyed without callbacks.
    pub fn take_orphaned(&mut self) -> Vec<RowCacheEntry> {
        std::mem::take(&mut self.orphaned)
    }

    fn allocate_group(&mut self) -> u64 {
        self.next_group += 1;
        self.next_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn setup() -> (PostProcessor, Vec<Arc<Column>>, RowCacheEntry) {
        let mut ids: SlotMap<NodeId, ()> = SlotMap::with_key();
        let row_node = ids.insert(());
        let cell_node = ids.insert(());
        let mut entry = RowCacheEntry::new(vec![row_node], false);
        entry.cells.insert(
            0,
            super::super::row_cache::CachedCell {
                node: cell_node,
                colspan: 1,
            },
        );
        let columns = vec![Arc::new(Column::new("a", "a"))];
        (PostProcessor::new(), columns, entry)
    }

    #[test]
    fn test_rows_walk_in_scroll_direction() {
        let mut post = PostProcessor::new();
        post.set_rows(3..6);
        assert_eq!(post.next_row(ScrollDirection::Down), Some(3));
        assert_eq!(post.next_row(ScrollDirection::Up), Some(5));
        assert_eq!(post.next_row(ScrollDirection::None), Some(4));
        assert!(!post.has_pending_rows());
    }

    #[test]
    fn test_invalidate_marks_stale_or_forgets() {
        let mut post = PostProcessor::new();
        post.mark_rendered(1, 0);
        post.invalidate_row(1, true);
        assert_eq!(post.status(1, 0), Some(PostStatus::Stale));
        post.invalidate_row(1, false);
        assert_eq!(post.status(1, 0), None);
    }

    #[test]
    fn test_park_then_cleanup_group() {
        let (mut post, columns, entry) = setup();
        post.mark_rendered(7, 0);
        post.park_row(7, entry, &columns);

        assert!(post.is_parked(7));
        let actions = post.next_cleanup_group();
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], CleanupAction::Cell { row: 7, remove: false, .. }));
        assert!(matches!(actions[1], CleanupAction::Row { row: 7 }));
        assert!(post.take_parked(7).is_some());
        assert!(!post.has_pending_cleanup());
    }

    #[test]
    fn test_rescue_cancels_cleanup() {
        let (mut post, columns, entry) = setup();
        post.mark_rendered(7, 0);
        post.park_row(7, entry, &columns);

        assert!(post.mark_parked_dirty(7));
        assert!(!post.mark_parked_dirty(8));
        assert!(post.rescue(7).is_some_and(|entry| entry.dirty));
        assert!(!post.is_parked(7));
        assert!(!post.has_pending_cleanup());
        assert_eq!(post.status(7, 0), Some(PostStatus::Rendered));
    }
}
