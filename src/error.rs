//! Error taxonomy for the synchronization engine.
//!
//! # Propagation
//! - `NoServiceAvailable` is the only error that escapes client construction
//! - `ServerUnreachable`, `NamespaceFetchFailed` and `CacheCorrupt` are absorbed
//!   by the engine and surfaced as [`SyncEvent`](crate::observability::events::SyncEvent)s
//! - Reads through the facade never fail

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Errors produced while discovering servers, fetching or caching configuration.
#[derive(Debug, Error)]
pub enum ApolloError {
    /// The meta-registry returned no usable config-server candidate.
    #[error("no config service available from meta server")]
    NoServiceAvailable,

    /// Timeout or connection failure talking to a server.
    #[error("server {url} unreachable: {reason}")]
    ServerUnreachable { url: String, reason: String },

    /// The config server answered with a non-success status or an unusable body.
    #[error("fetching namespace '{namespace}' failed with status {status}")]
    NamespaceFetchFailed { namespace: String, status: u16 },

    /// A disk cache record could not be read or decoded.
    #[error("cache file {path} is corrupt: {reason}")]
    CacheCorrupt { path: String, reason: String },

    /// The meta-registry answered with something other than a service list.
    #[error("discovery failed: {0}")]
    Discovery(String),

    /// Invalid client configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Request signing could not be initialised.
    #[error("signature error: {0}")]
    Signature(String),

    /// Disk cache I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations.
pub type ApolloResult<T> = Result<T, ApolloError>;

impl ApolloError {
    /// Returns true if the engine can keep serving reads after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ApolloError::ServerUnreachable { .. }
                | ApolloError::NamespaceFetchFailed { .. }
                | ApolloError::CacheCorrupt { .. }
                | ApolloError::Io(_)
        )
    }

    /// Returns true for connection-level failures that warrant a failover.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApolloError::ServerUnreachable { .. })
    }

    pub(crate) fn unreachable(url: impl Into<String>, err: &reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        ApolloError::ServerUnreachable {
            url: url.into(),
            reason,
        }
    }
}
