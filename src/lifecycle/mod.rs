//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! start():
//!     initial synchronous cycle → spawn polling worker
//!
//! stop():
//!     trigger shutdown → worker wakes from its inter-cycle sleep → exits
//! ```
//!
//! # Design Decisions
//! - An in-flight fetch completes before the worker observes stop
//! - The sleep between cycles is interruptible, never a busy poll
//! - Stop is idempotent and safe from any thread

pub mod shutdown;

pub use shutdown::Shutdown;
