//! Security subsystem.
//!
//! # Responsibilities
//! - Sign config-server requests when an application secret is configured
//!
//! # Design Decisions
//! - Unauthenticated clients send no auth headers at all
//! - The secret never appears in logs or `Debug` output

pub mod signature;

pub use signature::{RequestSigner, SignedHeaders};
