//! The in-progress edit of one grid.

use std::collections::BTreeSet;
use std::sync::Arc;

use horizon_grid_core::logging::targets;
use parking_lot::Mutex;

use super::command::{EditCommand, EditCommandHandler};
use super::editor::{Editor, SharedEditor};
use super::lock::{EditController, EditorLock};
use crate::column::Column;
use crate::model::{ItemHandle, Record, Value};
use crate::signals::{CellChange, CellPosition, GridSignals, ValidationError};

/// State of an open editor.
pub(crate) struct ActiveEdit {
    pub position: CellPosition,
    pub column: Arc<Column>,
    pub item: ItemHandle,
    pub editor: SharedEditor,
    /// Serialized value when the editor opened.
    pub serialized_value: Value,
}

/// Render work requested by edits, applied on the grid's next turn.
#[derive(Debug, Default)]
pub(crate) struct PendingEffects {
    pub refresh_rows: BTreeSet<usize>,
    pub invalid: Option<CellPosition>,
    pub finished: Option<CellPosition>,
}

impl PendingEffects {
    pub fn is_empty(&self) -> bool {
        self.refresh_rows.is_empty() && self.invalid.is_none() && self.finished.is_none()
    }
}

pub(crate) struct EditEffects {
    signals: Arc<GridSignals>,
    pending: Mutex<PendingEffects>,
}

impl EditEffects {
    pub fn new(signals: Arc<GridSignals>) -> Self {
        Self {
            signals,
            pending: Mutex::new(PendingEffects::default()),
        }
    }

    /// An edit command wrote into the item at `row`.
    pub fn applied(&self, row: usize, cell: usize, item: ItemHandle) {
        self.pending.lock().refresh_rows.insert(row);
        self.signals.cell_change.emit(CellChange { row, cell, item });
    }

    pub fn take(&self) -> PendingEffects {
        std::mem::take(&mut *self.pending.lock())
    }
}

/// Edit controller of a grid.
///
/// The grid registers the session with its editor lock when an editor opens;
/// the lock (possibly driven by another grid) then commits or cancels
/// through it.
pub(crate) struct EditSession {
    state: Mutex<Option<ActiveEdit>>,
    editor_lock: Mutex<Arc<EditorLock>>,
    handler: Mutex<Option<EditCommandHandler>>,
    effects: Arc<EditEffects>,
}

impl EditSession {
    pub fn new(editor_lock: Arc<EditorLock>, signals: Arc<GridSignals>) -> Self {
        Self {
            state: Mutex::new(None),
            editor_lock: Mutex::new(editor_lock),
            handler: Mutex::new(None),
            effects: Arc::new(EditEffects::new(signals)),
        }
    }

    pub fn editor_lock(&self) -> Arc<EditorLock> {
        self.editor_lock.lock().clone()
    }

    pub fn set_editor_lock(&self, lock: Arc<EditorLock>) {
        *self.editor_lock.lock() = lock;
    }

    pub fn set_handler(&self, handler: Option<EditCommandHandler>) {
        *self.handler.lock() = handler;
    }

    pub fn effects(&self) -> &Arc<EditEffects> {
        &self.effects
    }

    pub fn is_editing(&self) -> bool {
        self.state.lock().is_some()
    }

    pub fn position(&self) -> Option<CellPosition> {
        self.state.lock().as_ref().map(|edit| edit.position)
    }

    /// Track a freshly opened editor. The caller holds the editor lock.
    pub fn begin(&self, edit: ActiveEdit) {
        tracing::debug!(
            target: targets::EDIT,
            row = edit.position.row,
            cell = edit.position.cell,
            column = %edit.column.id,
            "editor opened"
        );
        *self.state.lock() = Some(edit);
    }

    /// Run `f` on the open editor, if any.
    pub fn with_editor<R>(&self, f: impl FnOnce(&mut dyn Editor) -> R) -> Option<R> {
        let editor = self.state.lock().as_ref().map(|edit| edit.editor.clone())?;
        let mut editor = editor.lock();
        Some(f(&mut **editor))
    }

    /// Reload the editor from its item after the row was refreshed.
    pub fn reload_value(&self) {
        let Some((editor, item)) = self
            .state
            .lock()
            .as_ref()
            .map(|edit| (edit.editor.clone(), edit.item.clone()))
        else {
            return;
        };
        let item = item.read();
        editor.lock().load_value(&*item as &dyn Record);
    }

    /// Close the editor without applying anything.
    fn finish(&self) {
        let Some(edit) = self.state.lock().take() else {
            return;
        };
        self.effects.signals.before_cell_editor_destroy.emit(edit.position);
        edit.editor.lock().destroy();
        {
            let mut pending = self.effects.pending.lock();
            pending.refresh_rows.insert(edit.position.row);
            pending.finished = Some(edit.position);
            pending.invalid = None;
        }
        if let Err(err) = self.editor_lock().deactivate(self) {
            tracing::error!(target: targets::EDIT, %err, "editor lock out of sync with the open editor");
        }
        tracing::debug!(target: targets::EDIT, row = edit.position.row, cell = edit.position.cell, "editor closed");
    }
}

impl EditController for EditSession {
    fn commit_current_edit(&self) -> bool {
        let Some((position, column, item, editor, previous)) = self.state.lock().as_ref().map(|edit| {
            (
                edit.position,
                edit.column.clone(),
                edit.item.clone(),
                edit.editor.clone(),
                edit.serialized_value.clone(),
            )
        }) else {
            return true;
        };

        let changed = editor.lock().is_value_changed();
        if !changed {
            self.finish();
            return true;
        }

        let (serialized, validation) = {
            let editor = editor.lock();
            let serialized = editor.serialize_value();
            let mut validation = editor.validate();
            if validation.valid {
                validation = column.validate(&serialized);
            }
            (serialized, validation)
        };

        if !validation.valid {
            tracing::debug!(
                target: targets::EDIT,
                row = position.row,
                cell = position.cell,
                msg = ?validation.msg,
                "commit refused by validation"
            );
            self.effects.pending.lock().invalid = Some(position);
            editor.lock().focus();
            self.effects.signals.validation_error.emit(ValidationError {
                row: position.row,
                cell: position.cell,
                column_id: column.id.clone(),
                msg: validation.msg,
            });
            return false;
        }

        let command = EditCommand {
            row: position.row,
            cell: position.cell,
            serialized_value: serialized,
            prev_serialized_value: previous,
            editor,
            item: item.clone(),
            effects: self.effects.clone(),
        };
        let handler = self.handler.lock().clone();
        match handler {
            Some(handler) => {
                self.finish();
                handler(&item, &column, command);
            }
            None => {
                command.execute();
                self.finish();
            }
        }
        true
    }

    fn cancel_current_edit(&self) -> bool {
        self.finish();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::ValidationResult;
    use crate::model::record;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TextEditor {
        field: String,
        loaded: Value,
        current: Arc<Mutex<Value>>,
        destroyed: Arc<AtomicUsize>,
    }

    impl Editor for TextEditor {
        fn load_value(&mut self, item: &dyn Record) {
            self.loaded = item.value(&self.field);
            *self.current.lock() = self.loaded.clone();
        }
        fn serialize_value(&self) -> Value {
            self.current.lock().clone()
        }
        fn apply_value(&self, item: &mut dyn Record, value: &Value) {
            item.set_value(&self.field, value.clone());
        }
        fn is_value_changed(&self) -> bool {
            *self.current.lock() != self.loaded
        }
        fn validate(&self) -> ValidationResult {
            match self.current.lock().as_str() {
                Some("") => ValidationResult::invalid("required"),
                _ => ValidationResult::valid(),
            }
        }
        fn destroy(&mut self) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        session: Arc<EditSession>,
        lock: Arc<EditorLock>,
        signals: Arc<GridSignals>,
        item: ItemHandle,
        value: Arc<Mutex<Value>>,
        destroyed: Arc<AtomicUsize>,
    }

    fn setup() -> Fixture {
        let lock = Arc::new(EditorLock::new());
        let signals = Arc::new(GridSignals::new());
        let session = Arc::new(EditSession::new(lock.clone(), signals.clone()));
        let item = record([("title", Value::from("a"))]);
        let value = Arc::new(Mutex::new(Value::None));
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut editor = TextEditor {
            field: "title".into(),
            loaded: Value::None,
            current: value.clone(),
            destroyed: destroyed.clone(),
        };
        editor.load_value(&*item.read());

        lock.activate(session.clone()).unwrap();
        session.begin(ActiveEdit {
            position: CellPosition::new(2, 0),
            column: Arc::new(Column::new("title", "title")),
            item: item.clone(),
            editor: Arc::new(Mutex::new(Box::new(editor))),
            serialized_value: Value::from("a"),
        });
        Fixture { session, lock, signals, item, value, destroyed }
    }

    #[test]
    fn test_commit_applies_and_releases_lock() {
        let fx = setup();
        let changes = Arc::new(AtomicUsize::new(0));
        let counter = changes.clone();
        fx.signals.cell_change.connect(move |change| {
            assert_eq!(change.row, 2);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        *fx.value.lock() = Value::from("b");
        assert!(fx.lock.commit_current_edit());

        assert_eq!(fx.item.read().value("title"), Value::from("b"));
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(fx.destroyed.load(Ordering::SeqCst), 1);
        assert!(!fx.lock.is_active());
        assert!(!fx.session.is_editing());

        let effects = fx.session.effects().take();
        assert!(effects.refresh_rows.contains(&2));
        assert_eq!(effects.finished, Some(CellPosition::new(2, 0)));
    }

    #[test]
    fn test_invalid_value_keeps_editor_open() {
        let fx = setup();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        fx.signals.validation_error.connect(move |err| sink.lock().push(err.clone()));

        *fx.value.lock() = Value::from("");
        assert!(!fx.lock.commit_current_edit());

        assert!(fx.session.is_editing());
        assert!(fx.lock.is_active_controller(fx.session.as_ref()));
        assert_eq!(fx.item.read().value("title"), Value::from("a"));
        assert_eq!(errors.lock()[0].msg.as_deref(), Some("required"));
        assert_eq!(fx.session.effects().take().invalid, Some(CellPosition::new(2, 0)));
    }

    #[test]
    fn test_unchanged_value_just_closes() {
        let fx = setup();
        assert!(fx.session.commit_current_edit());
        assert!(!fx.session.is_editing());
        assert!(!fx.lock.is_active());
    }

    #[test]
    fn test_handler_receives_command() {
        let fx = setup();
        let executed = Arc::new(AtomicUsize::new(0));
        let counter = executed.clone();
        fx.session.set_handler(Some(Arc::new(move |_item: &ItemHandle, column: &Column, command: EditCommand| {
            assert_eq!(column.id, "title");
            assert_eq!(command.prev_serialized_value, Value::from("a"));
            command.execute();
            command.undo();
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        *fx.value.lock() = Value::from("c");
        assert!(fx.session.commit_current_edit());
        assert_eq!(executed.load(Ordering::SeqCst), 1);
        assert_eq!(fx.item.read().value("title"), Value::from("a"));
    }

    #[test]
    fn test_cancel_discards() {
        let fx = setup();
        *fx.value.lock() = Value::from("zzz");
        assert!(fx.lock.cancel_current_edit());
        assert_eq!(fx.item.read().value("title"), Value::from("a"));
        assert!(!fx.lock.is_active());
    }
}
