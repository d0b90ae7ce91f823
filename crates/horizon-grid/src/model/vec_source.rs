//! In-memory data source.
//!
//! `VecDataSource` holds its rows in a `Vec` and emits the matching
//! [`DataSignals`] for every mutation, so a grid bound to it stays in sync
//! without manual invalidation.

use std::sync::Arc;

use parking_lot::RwLock;

use super::item::{ItemHandle, Record, RowItem};
use super::metadata::{Colspan, ColumnMetadata, ItemMetadata};
use super::traits::{DataSignals, DataSource};

/// Callback computing metadata for a row.
pub type MetadataProvider = Arc<dyn Fn(usize, &RowItem) -> Option<ItemMetadata> + Send + Sync>;

/// Css class applied to group header rows.
pub const GROUP_CSS_CLASS: &str = "slick-group";
/// Css class applied to group totals rows.
pub const GROUP_TOTALS_CSS_CLASS: &str = "slick-group-totals";

/// A data source backed by a vector of rows.
pub struct VecDataSource {
    rows: RwLock<Vec<RowItem>>,
    metadata: Option<MetadataProvider>,
    signals: DataSignals,
}

impl VecDataSource {
    /// Create a data source from data records.
    pub fn new(items: Vec<ItemHandle>) -> Self {
        Self::from_rows(items.into_iter().map(RowItem::Data).collect())
    }

    /// Create a data source from arbitrary rows (data and group rows mixed).
    pub fn from_rows(rows: Vec<RowItem>) -> Self {
        Self {
            rows: RwLock::new(rows),
            metadata: None,
            signals: DataSignals::new(),
        }
    }

    /// Create an empty data source.
    pub fn empty() -> Self {
        Self::from_rows(Vec::new())
    }

    /// Use `provider` for row metadata.
    ///
    /// Rows for which the provider returns `None` fall back to the built-in
    /// group metadata.
    pub fn with_metadata<F>(mut self, provider: F) -> Self
    where
        F: Fn(usize, &RowItem) -> Option<ItemMetadata> + Send + Sync + 'static,
    {
        self.metadata = Some(Arc::new(provider));
        self
    }

    /// Appends a row.
    pub fn push(&self, row: impl Into<RowItem>) {
        let len = {
            let mut rows = self.rows.write();
            rows.push(row.into());
            rows.len()
        };
        self.signals.emit_row_count_changed(len - 1, len);
    }

    /// Inserts a row at `index`. Returns `false` if `index > len()`.
    pub fn insert(&self, index: usize, row: impl Into<RowItem>) -> bool {
        let len = {
            let mut rows = self.rows.write();
            if index > rows.len() {
                return false;
            }
            rows.insert(index, row.into());
            rows.len()
        };
        self.signals.emit_row_count_changed(len - 1, len);
        self.signals.emit_rows_changed((index..len).collect());
        true
    }

    /// Removes and returns the row at `index`.
    pub fn remove(&self, index: usize) -> Option<RowItem> {
        let (removed, len) = {
            let mut rows = self.rows.write();
            if index >= rows.len() {
                return None;
            }
            let removed = rows.remove(index);
            (removed, rows.len())
        };
        self.signals.emit_row_count_changed(len + 1, len);
        self.signals.emit_rows_changed((index..len).collect());
        Some(removed)
    }

    /// Replaces the row at `index`. Returns `false` if out of range.
    pub fn set_row(&self, index: usize, row: impl Into<RowItem>) -> bool {
        {
            let mut rows = self.rows.write();
            let Some(slot) = rows.get_mut(index) else {
                return false;
            };
            *slot = row.into();
        }
        self.signals.emit_rows_changed(vec![index]);
        true
    }

    /// Replaces all rows.
    pub fn set_rows(&self, rows: Vec<RowItem>) {
        let previous = {
            let mut current = self.rows.write();
            std::mem::replace(&mut *current, rows).len()
        };
        self.signals.emit_row_count_changed(previous, self.len());
        self.signals.emit_data_changed();
    }

    /// Mutates the record at `index` in place and notifies.
    ///
    /// Returns `None` for out-of-range or non-data rows.
    pub fn update_item<F, R>(&self, index: usize, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn Record) -> R,
    {
        let handle = self.rows.read().get(index)?.as_data()?.clone();
        let result = f(&mut *handle.write());
        self.signals.emit_rows_changed(vec![index]);
        Some(result)
    }

    /// Sorts the rows and notifies that every row changed.
    pub fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&RowItem, &RowItem) -> std::cmp::Ordering,
    {
        let len = {
            let mut rows = self.rows.write();
            rows.sort_by(compare);
            rows.len()
        };
        self.signals.emit_rows_changed((0..len).collect());
    }

    fn default_metadata(row: &RowItem) -> Option<ItemMetadata> {
        match row {
            RowItem::Data(_) => None,
            RowItem::Group(_) => Some(
                ItemMetadata::new()
                    .with_css_classes(GROUP_CSS_CLASS)
                    .with_selectable(false)
                    .with_column_index(0, ColumnMetadata::new().with_colspan(Colspan::Rest)),
            ),
            RowItem::GroupTotals(_) => Some(
                ItemMetadata::new()
                    .with_css_classes(GROUP_TOTALS_CSS_CLASS)
                    .with_focusable(false)
                    .with_selectable(false),
            ),
        }
    }
}

impl DataSource for VecDataSource {
    fn len(&self) -> usize {
        self.rows.read().len()
    }

    fn item(&self, row: usize) -> Option<RowItem> {
        self.rows.read().get(row).cloned()
    }

    fn item_metadata(&self, row: usize) -> Option<ItemMetadata> {
        let item = self.item(row)?;
        self.metadata
            .as_ref()
            .and_then(|provider| provider(row, &item))
            .or_else(|| Self::default_metadata(&item))
    }

    fn signals(&self) -> &DataSignals {
        &self.signals
    }
}

impl Default for VecDataSource {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Group, Value, record};
    use parking_lot::Mutex;

    fn setup(count: usize) -> VecDataSource {
        VecDataSource::new(
            (0..count)
                .map(|i| record([("id", Value::from(i))]))
                .collect(),
        )
    }

    #[test]
    fn test_push_and_remove_emit_row_count() {
        let source = setup(2);
        let changes = Arc::new(Mutex::new(Vec::new()));
        let changes_clone = changes.clone();
        source.signals().row_count_changed.connect(move |change| {
            changes_clone.lock().push((change.previous, change.current));
        });

        source.push(record([("id", Value::from(2))]));
        assert!(source.remove(0).is_some());
        assert!(source.remove(10).is_none());

        assert_eq!(*changes.lock(), vec![(2, 3), (3, 2)]);
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_update_item_emits_rows_changed() {
        let source = setup(3);
        let rows = Arc::new(Mutex::new(Vec::new()));
        let rows_clone = rows.clone();
        source.signals().rows_changed.connect(move |changed| {
            rows_clone.lock().extend_from_slice(changed);
        });

        source.update_item(1, |item| item.set_value("id", Value::from(42)));
        assert_eq!(*rows.lock(), vec![1]);
        assert_eq!(source.item(1).map(|item| item.value("id")), Some(Value::from(42)));
    }

    #[test]
    fn test_group_rows_get_default_metadata() {
        let source = VecDataSource::from_rows(vec![
            Group::new("A", "a", 1).into(),
            record([("id", Value::from(0))]).into(),
        ]);

        let group = source.item_metadata(0).expect("group metadata");
        assert_eq!(group.css_classes.as_deref(), Some(GROUP_CSS_CLASS));
        assert_eq!(group.column("any", 0).and_then(|m| m.colspan), Some(Colspan::Rest));
        assert!(source.item_metadata(1).is_none());
    }
}
