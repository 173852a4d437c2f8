//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → config file (TOML, loader.rs)
//!     → APOLLO_* environment overrides (loader.rs)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → owned by ConfigClient, read once by the engine
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a client is built
//! - All fields except the meta address and app id have defaults
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::ClientConfig;
pub use schema::ObservabilityConfig;
