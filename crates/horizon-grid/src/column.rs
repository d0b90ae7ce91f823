//! Column definitions.

use std::fmt;
use std::sync::Arc;

use crate::edit::{EditorFactory, ValidationResult};
use crate::format::Formatter;
use crate::model::{RowItem, Value};
use crate::render::{NodeId, RenderBackend};

/// Validates a serialized editor value for a column.
pub type Validator = Arc<dyn Fn(&Value) -> ValidationResult + Send + Sync>;

/// Arguments of an async post-render callback.
pub struct PostRenderArgs<'a> {
    /// Backend owning the cell node.
    pub backend: &'a mut dyn RenderBackend,
    /// The rendered cell.
    pub node: NodeId,
    /// Data row index.
    pub row: usize,
    /// The row item, if available.
    pub item: Option<&'a RowItem>,
    /// The column being decorated.
    pub column: &'a Column,
    /// `true` if the cell was decorated before and its row changed since.
    pub re_render: bool,
}

/// Decorates a rendered cell some time after the render pass.
pub type AsyncPostRender = Arc<dyn Fn(PostRenderArgs<'_>) + Send + Sync>;

/// Arguments of an async post-render cleanup callback.
pub struct PostCleanupArgs<'a> {
    /// Backend owning the cell node.
    pub backend: &'a mut dyn RenderBackend,
    /// The decorated cell, about to be destroyed.
    pub node: NodeId,
    /// Data row index the cell belonged to.
    pub row: usize,
    /// The column that decorated the cell.
    pub column: &'a Column,
}

/// Releases what an [`AsyncPostRender`] callback attached to a cell.
pub type AsyncPostCleanup = Arc<dyn Fn(PostCleanupArgs<'_>) + Send + Sync>;

/// Sort state of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSort {
    /// Id of the sorted column.
    pub column_id: String,
    /// Ascending if `true`.
    pub sort_asc: bool,
}

impl ColumnSort {
    /// Create a sort entry.
    pub fn new(column_id: impl Into<String>, sort_asc: bool) -> Self {
        Self {
            column_id: column_id.into(),
            sort_asc,
        }
    }
}

/// A grid column.
///
/// Columns are immutable once handed to the grid; changing a column means
/// handing the grid a new column list (or using the grid's width setter).
///
/// # Example
///
/// ```
/// use horizon_grid::Column;
///
/// let column = Column::new("title", "title")
///     .with_name("Title")
///     .with_width(120.0)
///     .with_sortable(true);
/// assert_eq!(column.width, 120.0);
/// ```
#[derive(Clone)]
pub struct Column {
    /// Unique id.
    pub id: String,
    /// Header text.
    pub name: String,
    /// Field read from data items.
    pub field: String,
    /// Width in pixels.
    pub width: f32,
    /// Minimum width in pixels.
    pub min_width: f32,
    /// Maximum width in pixels.
    pub max_width: Option<f32>,
    /// Pinned to the leading edge in the frozen layout.
    pub frozen: bool,
    /// Hidden columns are not part of the view.
    pub visible: bool,
    /// Whether header clicks sort by this column.
    pub sortable: bool,
    /// Whether the column can be resized by the user.
    pub resizable: bool,
    /// Whether cells of the column can become active.
    pub focusable: bool,
    /// Whether cells of the column can be selected.
    pub selectable: bool,
    /// Initial direction when sorting starts.
    pub default_sort_asc: bool,
    /// Re-render the column's cells after a width change.
    pub rerender_on_resize: bool,
    /// Extra css classes for every cell.
    pub css_class: Option<String>,
    /// Header tooltip.
    pub tool_tip: Option<String>,
    /// Cell formatter.
    pub formatter: Option<Formatter>,
    /// Cell editor.
    pub editor: Option<Arc<dyn EditorFactory>>,
    /// Value validator, available to editors.
    pub validator: Option<Validator>,
    /// Deferred cell decoration.
    pub async_post_render: Option<AsyncPostRender>,
    /// Cleanup of deferred cell decoration.
    pub async_post_render_cleanup: Option<AsyncPostCleanup>,
}

/// Default column width in pixels.
pub const DEFAULT_COLUMN_WIDTH: f32 = 80.0;

/// Default minimum column width in pixels.
pub const DEFAULT_MIN_COLUMN_WIDTH: f32 = 30.0;

impl Column {
    /// Create a column with the given id reading `field`.
    pub fn new(id: impl Into<String>, field: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            field: field.into(),
            width: DEFAULT_COLUMN_WIDTH,
            min_width: DEFAULT_MIN_COLUMN_WIDTH,
            max_width: None,
            frozen: false,
            visible: true,
            sortable: false,
            resizable: true,
            focusable: true,
            selectable: true,
            default_sort_asc: true,
            rerender_on_resize: false,
            css_class: None,
            tool_tip: None,
            formatter: None,
            editor: None,
            validator: None,
            async_post_render: None,
            async_post_render_cleanup: None,
        }
    }

    /// Set the header text.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the width.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Set the width limits.
    pub fn with_width_limits(mut self, min: f32, max: Option<f32>) -> Self {
        self.min_width = min;
        self.max_width = max;
        self
    }

    /// Pin the column in the frozen layout.
    pub fn with_frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    /// Show or hide the column.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Make the column sortable.
    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Set whether cells can become active.
    pub fn with_focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }

    /// Set whether cells can be selected.
    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    /// Set the initial sort direction.
    pub fn with_default_sort_asc(mut self, asc: bool) -> Self {
        self.default_sort_asc = asc;
        self
    }

    /// Set extra cell css classes.
    pub fn with_css_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = Some(class.into());
        self
    }

    /// Set the formatter.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&crate::format::FormatArgs<'_>) -> crate::format::CellContent + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Set the editor.
    pub fn with_editor(mut self, editor: Arc<dyn EditorFactory>) -> Self {
        self.editor = Some(editor);
        self
    }

    /// Set the validator.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> ValidationResult + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Set the async post-render callback.
    pub fn with_async_post_render<F>(mut self, callback: F) -> Self
    where
        F: Fn(PostRenderArgs<'_>) + Send + Sync + 'static,
    {
        self.async_post_render = Some(Arc::new(callback));
        self
    }

    /// Set the async post-render cleanup callback.
    pub fn with_async_post_render_cleanup<F>(mut self, callback: F) -> Self
    where
        F: Fn(PostCleanupArgs<'_>) + Send + Sync + 'static,
    {
        self.async_post_render_cleanup = Some(Arc::new(callback));
        self
    }

    /// Clamp `width` to the column's limits.
    pub fn clamp_width(&self, width: f32) -> f32 {
        let width = width.max(self.min_width);
        match self.max_width {
            Some(max) => width.min(max.max(self.min_width)),
            None => width,
        }
    }

    /// Validate `value` with the column's validator, if any.
    pub fn validate(&self, value: &Value) -> ValidationResult {
        match &self.validator {
            Some(validator) => validator(value),
            None => ValidationResult::valid(),
        }
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("field", &self.field)
            .field("width", &self.width)
            .field("frozen", &self.frozen)
            .field("visible", &self.visible)
            .field("sortable", &self.sortable)
            .field("focusable", &self.focusable)
            .field("editor", &self.editor.is_some())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Column: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let column = Column::new("age", "age_years");
        assert_eq!(column.name, "age");
        assert_eq!(column.field, "age_years");
        assert_eq!(column.width, DEFAULT_COLUMN_WIDTH);
        assert!(column.visible);
        assert!(column.focusable);
        assert!(!column.frozen);
    }

    #[test]
    fn test_clamp_width() {
        let column = Column::new("a", "a").with_width_limits(40.0, Some(100.0));
        assert_eq!(column.clamp_width(10.0), 40.0);
        assert_eq!(column.clamp_width(60.0), 60.0);
        assert_eq!(column.clamp_width(500.0), 100.0);
    }

    #[test]
    fn test_validate() {
        let column = Column::new("n", "n").with_validator(|value| {
            if value.as_int().is_some() {
                ValidationResult::valid()
            } else {
                ValidationResult::invalid("not a number")
            }
        });
        assert!(column.validate(&Value::from(3)).valid);
        assert_eq!(
            column.validate(&Value::from("x")).msg.as_deref(),
            Some("not a number")
        );
    }
}
