//! The editor contract.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::column::Column;
use crate::model::{ItemHandle, Record, Value};
use crate::render::NodeId;

/// Result of validating an editor value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// `true` if the value may be committed.
    pub valid: bool,
    /// Reason shown to the user when invalid.
    pub msg: Option<String>,
}

impl ValidationResult {
    /// A passing result.
    pub fn valid() -> Self {
        Self { valid: true, msg: None }
    }

    /// A failing result with a reason.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self {
            valid: false,
            msg: Some(msg.into()),
        }
    }
}

/// Box of a cell in viewport coordinates, handed to editors for placement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellBox {
    /// Top edge.
    pub top: f32,
    /// Left edge.
    pub left: f32,
    /// Bottom edge.
    pub bottom: f32,
    /// Right edge.
    pub right: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Whether the cell is inside its viewport.
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditRequest {
    Commit,
    Cancel,
}

/// Lets an editor ask the grid to commit or cancel.
///
/// Requests are picked up on the grid's next turn
/// ([`Grid::process_events`](crate::Grid::process_events)).
#[derive(Debug, Clone, Default)]
pub struct EditorHost {
    request: Arc<Mutex<Option<EditRequest>>>,
}

impl EditorHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Ask the grid to commit the edit.
    pub fn commit_changes(&self) {
        *self.request.lock() = Some(EditRequest::Commit);
    }

    /// Ask the grid to cancel the edit.
    pub fn cancel_changes(&self) {
        *self.request.lock() = Some(EditRequest::Cancel);
    }

    pub(crate) fn take_request(&self) -> Option<EditRequest> {
        self.request.lock().take()
    }
}

/// Everything an editor is constructed with.
pub struct EditorArgs {
    /// Data row index.
    pub row: usize,
    /// Column index.
    pub cell: usize,
    /// The edited column.
    pub column: Arc<Column>,
    /// The edited item.
    pub item: ItemHandle,
    /// Cell node the editor renders into.
    pub container: Option<NodeId>,
    /// Where the cell is.
    pub position: CellBox,
    /// Commit and cancel requests.
    pub host: EditorHost,
}

/// An in-place cell editor.
///
/// The grid drives the lifecycle: construction through an [`EditorFactory`],
/// `load_value`, then either a commit (`is_value_changed`, `validate`,
/// `serialize_value`, `apply_value` through an edit command) or a cancel,
/// and finally `destroy`.
pub trait Editor: Send {
    /// Load the edited field from `item`.
    fn load_value(&mut self, item: &dyn Record);

    /// The current editor value.
    fn serialize_value(&self) -> Value;

    /// Write `value` into `item`.
    fn apply_value(&self, item: &mut dyn Record, value: &Value);

    /// Returns `true` if the value differs from what was loaded.
    fn is_value_changed(&self) -> bool;

    /// Check the current value.
    fn validate(&self) -> ValidationResult {
        ValidationResult::valid()
    }

    /// Take keyboard focus.
    fn focus(&mut self) {}

    /// Release everything the editor created.
    fn destroy(&mut self) {}

    /// The cell moved, for editors that float above the grid.
    fn position(&mut self, _position: CellBox) {}

    /// The cell scrolled back into view.
    fn show(&mut self) {}

    /// The cell scrolled out of view.
    fn hide(&mut self) {}

    /// A click landed on the edited cell.
    fn pre_click(&mut self) {}

    /// Returns `true` to keep the cell content when the editor opens.
    fn suppress_clear_on_edit(&self) -> bool {
        false
    }
}

/// Creates editors for a column.
pub trait EditorFactory: Send + Sync {
    /// Create an editor bound to a cell.
    fn create(&self, args: EditorArgs) -> Box<dyn Editor>;
}

impl<F> EditorFactory for F
where
    F: Fn(EditorArgs) -> Box<dyn Editor> + Send + Sync,
{
    fn create(&self, args: EditorArgs) -> Box<dyn Editor> {
        self(args)
    }
}

pub(crate) type SharedEditor = Arc<Mutex<Box<dyn Editor>>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_result() {
        assert!(ValidationResult::valid().valid);
        let invalid = ValidationResult::invalid("too long");
        assert!(!invalid.valid);
        assert_eq!(invalid.msg.as_deref(), Some("too long"));
    }

    #[test]
    fn test_host_keeps_latest_request() {
        let host = EditorHost::new();
        let editor_side = host.clone();
        editor_side.commit_changes();
        editor_side.cancel_changes();
        assert_eq!(host.take_request(), Some(EditRequest::Cancel));
        assert_eq!(host.take_request(), None);
    }
}
