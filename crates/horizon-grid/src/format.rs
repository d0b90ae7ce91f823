//! Cell formatters.
//!
//! A [`Formatter`] turns the value of a cell into [`CellContent`]. The grid
//! resolves the formatter of a cell in this order: column override in the row
//! metadata, row metadata formatter, column formatter, formatter factory,
//! and finally the grid's default formatter.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::column::Column;
use crate::model::{RowItem, Value};

/// Everything a formatter gets to see about a cell.
pub struct FormatArgs<'a> {
    /// Data row index.
    pub row: usize,
    /// Column index.
    pub cell: usize,
    /// The value extracted for this cell.
    pub value: &'a Value,
    /// The column definition.
    pub column: &'a Column,
    /// The row item.
    pub item: &'a RowItem,
}

/// Structured formatter output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatterResult {
    /// Markup content. Takes precedence over `text`.
    pub html: Option<String>,
    /// Plain text content.
    pub text: Option<String>,
    /// Extra css classes for the cell (space separated).
    pub add_class: Option<String>,
    /// Extra attributes for the cell.
    pub add_attrs: BTreeMap<String, String>,
    /// Tooltip for the cell.
    pub tool_tip: Option<String>,
}

impl FormatterResult {
    /// A result with plain text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Add css classes.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class = Some(class.into());
        self
    }

    /// Add a tooltip.
    pub fn with_tool_tip(mut self, tool_tip: impl Into<String>) -> Self {
        self.tool_tip = Some(tool_tip.into());
        self
    }
}

/// What a formatter produces for a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    /// Markup content.
    Html(String),
    /// Structured content with classes, attributes and tooltip.
    Result(FormatterResult),
}

impl CellContent {
    /// Empty content.
    pub fn empty() -> Self {
        CellContent::Html(String::new())
    }

    /// The markup or text carried by the content.
    pub fn text(&self) -> &str {
        match self {
            CellContent::Html(html) => html,
            CellContent::Result(result) => result
                .html
                .as_deref()
                .or(result.text.as_deref())
                .unwrap_or(""),
        }
    }

    /// Extra css classes requested by the formatter.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        let classes = match self {
            CellContent::Html(_) => None,
            CellContent::Result(result) => result.add_class.as_deref(),
        };
        classes.into_iter().flat_map(str::split_whitespace)
    }
}

impl Default for CellContent {
    fn default() -> Self {
        Self::empty()
    }
}

/// A cell formatter.
pub type Formatter = Arc<dyn Fn(&FormatArgs<'_>) -> CellContent + Send + Sync>;

/// Supplies formatters for columns that have none of their own.
pub trait FormatterFactory: Send + Sync {
    /// The formatter for `column`, or `None` to use the grid default.
    fn formatter(&self, column: &Column) -> Option<Formatter>;
}

/// Escape the characters that are significant in markup.
pub fn html_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render the value as escaped text.
pub fn default_formatter() -> Formatter {
    Arc::new(|args: &FormatArgs<'_>| CellContent::Html(html_encode(&args.value.to_string())))
}
