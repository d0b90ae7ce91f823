//! Core systems for Horizon Grid.
//!
//! This crate provides the building blocks the grid engine is wired with:
//!
//! - **Signal/Slot System**: Type-safe notifications between components
//! - **Timers**: One-shot timers driven by the host event loop
//! - **Logging**: `tracing` targets and performance spans
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Timer Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use horizon_grid_core::TimerManager;
//!
//! let mut timers = TimerManager::new();
//! let now = Instant::now();
//! let id = timers.start_one_shot(now, Duration::from_millis(50));
//!
//! assert!(timers.process_expired(now).is_empty());
//! assert_eq!(timers.process_expired(now + Duration::from_millis(50)), vec![id]);
//! ```

mod error;
pub mod logging;
mod signal;
mod timer;

pub use error::{CoreError, Result, SignalError, TimerError};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
pub use timer::{TimerId, TimerManager};
