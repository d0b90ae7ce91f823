//! Row items: data records and non-data (group) rows.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use super::Value;

/// A data record addressed by field name.
///
/// Columns read cells through [`Record::value`] and editors write them back
/// through [`Record::set_value`].
pub trait Record: Send + Sync {
    /// Returns the value of `field`, or `Value::None` if the field is absent.
    fn value(&self, field: &str) -> Value;

    /// Stores `value` under `field`.
    fn set_value(&mut self, field: &str, value: Value);
}

impl Record for HashMap<String, Value> {
    fn value(&self, field: &str) -> Value {
        self.get(field).cloned().unwrap_or_default()
    }

    fn set_value(&mut self, field: &str, value: Value) {
        self.insert(field.to_string(), value);
    }
}

impl Record for BTreeMap<String, Value> {
    fn value(&self, field: &str) -> Value {
        self.get(field).cloned().unwrap_or_default()
    }

    fn set_value(&mut self, field: &str, value: Value) {
        self.insert(field.to_string(), value);
    }
}

/// Shared, mutable handle to a data record.
///
/// Handles are compared by identity: two handles refer to the same item only
/// if they point at the same allocation.
pub type ItemHandle = Arc<RwLock<dyn Record>>;

/// Wrap a record in an [`ItemHandle`].
pub fn item_handle<R: Record + 'static>(record: R) -> ItemHandle {
    Arc::new(RwLock::new(record))
}

/// Build a `BTreeMap` record from `(field, value)` pairs.
///
/// ```
/// use horizon_grid::model::{record, Record, Value};
///
/// let item = record([("title", Value::from("Task 1")), ("done", Value::from(false))]);
/// assert_eq!(item.read().value("title"), Value::from("Task 1"));
/// ```
pub fn record<K, I>(fields: I) -> ItemHandle
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    let map: BTreeMap<String, Value> = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
    item_handle(map)
}

/// A group header row produced by a grouping data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    /// Nesting level, starting at 0.
    pub level: usize,
    /// Number of rows in the group.
    pub count: usize,
    /// The grouping value shared by the rows.
    pub value: Value,
    /// Display title.
    pub title: String,
    /// Whether the group is collapsed.
    pub collapsed: bool,
    /// Key identifying the group across refreshes.
    pub grouping_key: String,
}

impl Group {
    /// Create a group header.
    pub fn new(title: impl Into<String>, value: impl Into<Value>, count: usize) -> Self {
        let title = title.into();
        Self {
            level: 0,
            count,
            value: value.into(),
            grouping_key: title.clone(),
            title,
            collapsed: false,
        }
    }
}

/// A group totals row carrying aggregate values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupTotals {
    /// Key of the group the totals belong to.
    pub grouping_key: String,
    /// Whether the aggregates have been computed.
    pub initialized: bool,
    /// Aggregate values by field.
    pub totals: BTreeMap<String, Value>,
}

/// One row of a data source.
#[derive(Clone)]
pub enum RowItem {
    /// An ordinary, editable data record.
    Data(ItemHandle),
    /// A group header.
    Group(Arc<Group>),
    /// A group totals row.
    GroupTotals(Arc<GroupTotals>),
}

impl RowItem {
    /// Wrap a record as a data row.
    pub fn data<R: Record + 'static>(record: R) -> Self {
        RowItem::Data(item_handle(record))
    }

    /// Returns `true` for group headers and totals rows.
    ///
    /// Non-data rows are never edited and never handed to editors.
    pub fn is_non_data(&self) -> bool {
        !matches!(self, RowItem::Data(_))
    }

    /// Returns the record handle of a data row.
    pub fn as_data(&self) -> Option<&ItemHandle> {
        match self {
            RowItem::Data(item) => Some(item),
            _ => None,
        }
    }

    /// Reads `field` from a data row, or from the aggregates of a totals row.
    pub fn value(&self, field: &str) -> Value {
        match self {
            RowItem::Data(item) => item.read().value(field),
            RowItem::Group(_) => Value::None,
            RowItem::GroupTotals(totals) => totals.totals.get(field).cloned().unwrap_or_default(),
        }
    }

    /// Returns `true` if both rows refer to the same underlying item.
    pub fn same_item(&self, other: &RowItem) -> bool {
        match (self, other) {
            (RowItem::Data(a), RowItem::Data(b)) => Arc::ptr_eq(a, b),
            (RowItem::Group(a), RowItem::Group(b)) => Arc::ptr_eq(a, b),
            (RowItem::GroupTotals(a), RowItem::GroupTotals(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for RowItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowItem::Data(item) => f
                .debug_tuple("Data")
                .field(&Arc::as_ptr(item).cast::<()>())
                .finish(),
            RowItem::Group(group) => f.debug_tuple("Group").field(group).finish(),
            RowItem::GroupTotals(totals) => f.debug_tuple("GroupTotals").field(totals).finish(),
        }
    }
}

impl From<ItemHandle> for RowItem {
    fn from(item: ItemHandle) -> Self {
        RowItem::Data(item)
    }
}

impl From<Group> for RowItem {
    fn from(group: Group) -> Self {
        RowItem::Group(Arc::new(group))
    }
}

impl From<GroupTotals> for RowItem {
    fn from(totals: GroupTotals) -> Self {
        RowItem::GroupTotals(Arc::new(totals))
    }
}

static_assertions::assert_impl_all!(RowItem: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let item = record([("name", Value::from("a"))]);
        item.write().set_value("name", Value::from("b"));
        assert_eq!(item.read().value("name"), Value::from("b"));
        assert!(item.read().value("missing").is_none());
    }

    #[test]
    fn test_non_data_rows() {
        let data = RowItem::from(record([("x", Value::from(1))]));
        let group = RowItem::from(Group::new("Fruit", "fruit", 3));
        let totals = RowItem::from(GroupTotals::default());

        assert!(!data.is_non_data());
        assert!(group.is_non_data());
        assert!(totals.is_non_data());
        assert!(group.as_data().is_none());
        assert!(data.same_item(&data.clone()));
        assert!(!data.same_item(&group));
    }
}
