//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Sync engine, caches, locator produce:
//!     → events.rs (SyncEvent delivered to an EventSink)
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Prometheus scrape (optional)
//!     → custom EventSink implementations
//! ```
//!
//! # Design Decisions
//! - Failures the engine absorbs are still visible to operators
//! - Event sinks are decoupled from control flow
//! - Metrics are cheap (atomic increments)

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{EventSink, SyncEvent, TracingSink};
