//! Synchronization subsystem.
//!
//! # Data Flow
//! ```text
//! run_cycle():
//!     for each namespace:
//!         GET {server}/configs/{app}/{cluster}/{ns}?ip=
//!             200         → MemoryCache.set → DiskCache.write (fingerprint gated)
//!             non-200     → DiskCache.load → MemoryCache.set
//!             unreachable → DiskCache.load → MemoryCache.set → ServerLocator.resolve(excluding)
//!     any unreachable → DiskCache.load_all → MemoryCache.set (every namespace)
//! ```
//!
//! # Design Decisions
//! - No fetch failure escapes a cycle; every path ends in a memory state
//! - No lock is held across a network call
//! - Disk I/O runs on the blocking pool

pub mod engine;
pub mod types;

pub use engine::SyncEngine;
pub use types::{ConfigResponse, CycleReport, FetchOutcome};
