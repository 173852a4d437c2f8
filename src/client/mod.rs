//! Client facade.
//!
//! # Data Flow
//! ```text
//! ConfigClient::new:
//!     validate config → build HTTP client → ServerLocator.resolve (fatal if none)
//!
//! ConfigClient::start:
//!     SyncEngine.run_cycle (synchronous) → spawn SyncEngine.run
//!
//! get / get_structured:
//!     MemoryCache → value, default, or empty object
//! ```
//!
//! # Responsibilities
//! - Public read API and lifecycle
//! - Registry sharing one client per configuration identity

pub mod facade;
pub mod registry;

pub use facade::ConfigClient;
pub use registry::ClientRegistry;
