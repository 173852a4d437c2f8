//! Client-side synchronization engine for an Apollo-style configuration service.

pub mod cache;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;
pub mod sync;

pub use client::{ClientRegistry, ConfigClient};
pub use config::ClientConfig;
pub use error::{ApolloError, ApolloResult};
pub use observability::{EventSink, SyncEvent};
