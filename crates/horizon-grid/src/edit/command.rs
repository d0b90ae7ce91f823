//! Edit commands.

use std::sync::Arc;

use super::editor::SharedEditor;
use super::session::EditEffects;
use crate::column::Column;
use crate::model::{ItemHandle, Value};

/// A committed edit, as handed to an [`EditCommandHandler`].
///
/// `execute` applies the new value, `undo` restores the previous one. Both
/// refresh the row and emit `cell_change`. The grid executes the command
/// itself when no handler is configured; it never calls `undo`.
pub struct EditCommand {
    /// Data row index.
    pub row: usize,
    /// Column index.
    pub cell: usize,
    /// Value to apply.
    pub serialized_value: Value,
    /// Value before the edit.
    pub prev_serialized_value: Value,
    pub(crate) editor: SharedEditor,
    pub(crate) item: ItemHandle,
    pub(crate) effects: Arc<EditEffects>,
}

impl EditCommand {
    /// Apply the new value.
    pub fn execute(&self) {
        self.apply(&self.serialized_value);
    }

    /// Restore the previous value.
    pub fn undo(&self) {
        self.apply(&self.prev_serialized_value);
    }

    fn apply(&self, value: &Value) {
        {
            let editor = self.editor.lock();
            let mut item = self.item.write();
            editor.apply_value(&mut *item, value);
        }
        self.effects.applied(self.row, self.cell, self.item.clone());
    }
}

impl std::fmt::Debug for EditCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditCommand")
            .field("row", &self.row)
            .field("cell", &self.cell)
            .field("serialized_value", &self.serialized_value)
            .field("prev_serialized_value", &self.prev_serialized_value)
            .finish_non_exhaustive()
    }
}

/// Receives committed edits, e.g. to keep an undo stack.
///
/// The handler is responsible for calling [`EditCommand::execute`].
pub type EditCommandHandler = Arc<dyn Fn(&ItemHandle, &Column, EditCommand) + Send + Sync>;
