//! Mutual exclusion of in-progress edits.
//!
//! An [`EditorLock`] holds at most one active [`EditController`]. Grids that
//! share a lock can never have two edits open at the same time: before a grid
//! starts an edit it asks the lock to commit whatever edit is active, and only
//! a successful commit frees the lock.
//!
//! Every grid uses [`EditorLock::global`] unless its options name another
//! lock, which isolates composite editors from the rest of the process.

use std::sync::{Arc, OnceLock};

use horizon_grid_core::logging::targets;
use parking_lot::Mutex;

use crate::error::{GridError, Result};

/// Something that owns an in-progress edit.
pub trait EditController: Send + Sync {
    /// Try to commit the edit. Returns `false` if validation refused it.
    fn commit_current_edit(&self) -> bool;

    /// Discard the edit. Returns `true` once the edit is gone.
    fn cancel_current_edit(&self) -> bool;
}

/// Holder of the single active edit controller.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use horizon_grid::edit::{EditController, EditorLock};
///
/// struct Noop;
/// impl EditController for Noop {
///     fn commit_current_edit(&self) -> bool { true }
///     fn cancel_current_edit(&self) -> bool { true }
/// }
///
/// let lock = EditorLock::new();
/// let a: Arc<dyn EditController> = Arc::new(Noop);
/// let b: Arc<dyn EditController> = Arc::new(Noop);
///
/// lock.activate(a.clone()).unwrap();
/// assert!(lock.activate(b.clone()).is_err());
/// assert!(lock.is_active_controller(a.as_ref()));
/// lock.deactivate(a.as_ref()).unwrap();
/// ```
#[derive(Default)]
pub struct EditorLock {
    active: Mutex<Option<Arc<dyn EditController>>>,
}

static GLOBAL_LOCK: OnceLock<Arc<EditorLock>> = OnceLock::new();

fn same_controller(a: &dyn EditController, b: &dyn EditController) -> bool {
    std::ptr::addr_eq(a as *const dyn EditController, b as *const dyn EditController)
}

impl EditorLock {
    /// Create a private lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide lock shared by grids that do not name their own.
    pub fn global() -> Arc<EditorLock> {
        GLOBAL_LOCK.get_or_init(|| Arc::new(EditorLock::new())).clone()
    }

    /// Returns `true` if a controller holds the lock.
    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Returns `true` if `controller` holds the lock.
    pub fn is_active_controller(&self, controller: &dyn EditController) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|active| same_controller(active.as_ref(), controller))
    }

    /// Make `controller` the holder. Re-activating the holder is a no-op.
    ///
    /// # Errors
    ///
    /// [`GridError::EditorLockHeld`] if a different controller holds the lock.
    pub fn activate(&self, controller: Arc<dyn EditController>) -> Result<()> {
        let mut active = self.active.lock();
        match active.as_ref() {
            Some(current) if same_controller(current.as_ref(), controller.as_ref()) => Ok(()),
            Some(_) => {
                tracing::error!(target: targets::EDIT, "activate called while another edit controller is active");
                Err(GridError::EditorLockHeld)
            }
            None => {
                *active = Some(controller);
                tracing::trace!(target: targets::EDIT, "editor lock activated");
                Ok(())
            }
        }
    }

    /// Release the lock held by `controller`.
    ///
    /// # Errors
    ///
    /// [`GridError::EditorLockNotHeld`] if `controller` is not the holder.
    pub fn deactivate(&self, controller: &dyn EditController) -> Result<()> {
        let mut active = self.active.lock();
        match active.as_ref() {
            Some(current) if same_controller(current.as_ref(), controller) => {
                *active = None;
                tracing::trace!(target: targets::EDIT, "editor lock released");
                Ok(())
            }
            _ => {
                tracing::error!(target: targets::EDIT, "deactivate called by a controller that is not active");
                Err(GridError::EditorLockNotHeld)
            }
        }
    }

    /// Commit the active edit. Returns `true` if there is none.
    pub fn commit_current_edit(&self) -> bool {
        // The controller releases the lock itself, so it must not be held here.
        let active = self.active.lock().clone();
        match active {
            Some(controller) => controller.commit_current_edit(),
            None => true,
        }
    }

    /// Cancel the active edit. Returns `true` if there is none.
    pub fn cancel_current_edit(&self) -> bool {
        let active = self.active.lock().clone();
        match active {
            Some(controller) => controller.cancel_current_edit(),
            None => true,
        }
    }
}

impl std::fmt::Debug for EditorLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorLock")
            .field("active", &self.is_active())
            .finish()
    }
}

static_assertions::assert_impl_all!(EditorLock: Send, Sync);
