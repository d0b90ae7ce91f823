//! Render tree plumbing.
//!
//! - [`RenderBackend`]: the contract a display surface implements
//! - [`MemoryBackend`]: a retained in-memory tree, the default backend
//!
//! The row cache and the async post-processing queue are internal to the
//! render cycle.

mod backend;
mod memory;
pub(crate) mod post_process;
pub(crate) mod row_cache;

pub use backend::{NodeId, NodeKind, PaneColumn, PaneId, PaneRow, RenderBackend};
pub use memory::{MemoryBackend, MemoryNode};
