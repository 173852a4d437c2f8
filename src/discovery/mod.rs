//! Server discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Client construction / failover
//!     → locator.rs (GET {meta}/services/config)
//!     → filter out the excluded endpoint
//!     → endpoint.rs (parse host/port from homepage URL)
//!     → first remaining candidate becomes the current endpoint
//! ```
//!
//! # Design Decisions
//! - Selection is deterministic (first candidate), not load-balanced
//! - The current endpoint is swapped atomically, never mutated in place
//! - An empty candidate list is `NoServiceAvailable`

pub mod endpoint;
pub mod locator;

pub use endpoint::{ServerEndpoint, ServiceInstance};
pub use locator::ServerLocator;
