//! Shared fixtures for the grid integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use horizon_grid::edit::{Editor, EditorArgs, EditorFactory, ValidationResult};
use horizon_grid::model::{Record, RowItem, Value, VecDataSource, record};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

/// Route grid logs to the test output. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Rows with an `id` and a `title` field.
pub fn task_rows(count: usize) -> Vec<RowItem> {
    (0..count)
        .map(|i| {
            RowItem::Data(record([
                ("id", Value::from(i)),
                ("title", Value::from(format!("Task {i}"))),
            ]))
        })
        .collect()
}

pub fn tasks(count: usize) -> Arc<VecDataSource> {
    Arc::new(VecDataSource::from_rows(task_rows(count)))
}

/// An editor whose value lives in a shared cell the test writes to,
/// standing in for a text input.
pub struct TextEditor {
    field: String,
    loaded: Value,
    input: Arc<Mutex<Value>>,
}

impl Editor for TextEditor {
    fn load_value(&mut self, item: &dyn Record) {
        self.loaded = item.value(&self.field);
        *self.input.lock() = self.loaded.clone();
    }

    fn serialize_value(&self) -> Value {
        self.input.lock().clone()
    }

    fn apply_value(&self, item: &mut dyn Record, value: &Value) {
        item.set_value(&self.field, value.clone());
    }

    fn is_value_changed(&self) -> bool {
        *self.input.lock() != self.loaded
    }

    fn validate(&self) -> ValidationResult {
        match self.input.lock().as_str() {
            Some("") => ValidationResult::invalid("a title is required"),
            _ => ValidationResult::valid(),
        }
    }
}

/// Factory handing every editor the same input cell.
pub struct TextEditorFactory {
    pub input: Arc<Mutex<Value>>,
}

impl TextEditorFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            input: Arc::new(Mutex::new(Value::None)),
        })
    }

    /// Type into the open editor.
    pub fn type_text(&self, text: &str) {
        *self.input.lock() = Value::from(text);
    }
}

impl EditorFactory for TextEditorFactory {
    fn create(&self, args: EditorArgs) -> Box<dyn Editor> {
        Box::new(TextEditor {
            field: args.column.field.clone(),
            loaded: Value::None,
            input: self.input.clone(),
        })
    }
}
