//! In-place editing.
//!
//! - [`Editor`] and [`EditorFactory`]: the editor lifecycle contract
//! - [`EditorLock`] and [`EditController`]: at most one open edit per lock
//! - [`EditCommand`]: a committed edit, executed by the grid or by an
//!   [`EditCommandHandler`]

mod command;
mod editor;
mod lock;
pub(crate) mod session;

pub use command::{EditCommand, EditCommandHandler};
pub use editor::{CellBox, Editor, EditorArgs, EditorFactory, EditorHost, ValidationResult};
pub use lock::{EditController, EditorLock};

pub(crate) use editor::EditRequest;
