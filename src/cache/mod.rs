//! Two-tier configuration cache.
//!
//! # Data Flow
//! ```text
//! Successful fetch:
//!     → memory.rs (swap snapshot, readers see it immediately)
//!     → disk.rs (persist if the release fingerprint changed)
//!
//! Failed fetch:
//!     → disk.rs (best-effort read of the last persisted snapshot)
//!     → memory.rs (serve stale-but-available data)
//! ```
//!
//! # Design Decisions
//! - Memory is the single source of truth for reads
//! - Disk is a fallback, never a guaranteed store
//! - Each tier owns its lock; neither is held across a network call

pub mod disk;
pub mod memory;

pub use disk::DiskCache;
pub use memory::{ConfigSnapshot, MemoryCache, SnapshotSource};
