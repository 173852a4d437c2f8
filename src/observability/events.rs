//! Structured sync events.
//!
//! Every recoverable failure and state change of the engine is reported as a
//! [`SyncEvent`]. Sinks observe; they never alter the engine's control flow.

use crate::observability::metrics;

/// Something the sync engine did or absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A namespace was fetched and applied to memory.
    ConfigUpdated {
        namespace: String,
        release_key: String,
        persisted: bool,
    },
    /// Non-success status or unusable body from the config server.
    NamespaceFetchFailed { namespace: String, status: u16 },
    /// Timeout or connection failure while fetching a namespace.
    ServerUnreachable {
        namespace: String,
        url: String,
        reason: String,
    },
    /// Memory was refilled from the disk cache.
    DiskFallback { namespace: String, keys: usize },
    /// A disk cache file could not be decoded.
    CacheCorrupt { namespace: String, reason: String },
    /// Persisting a fetched snapshot failed.
    CacheWriteFailed { namespace: String, reason: String },
    /// The engine switched to another config server.
    FailoverCompleted { from: String, to: String },
    /// No alternative config server could be resolved.
    FailoverFailed { from: String, reason: String },
    /// A cycle with connectivity failures reloaded every namespace from disk.
    CycleReloadedFromDisk { namespaces: usize },
    /// A full cycle over all namespaces finished.
    CycleCompleted { namespaces: usize, failures: usize },
}

/// Receiver of [`SyncEvent`]s.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &SyncEvent);
}

/// Default sink: structured logs plus metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &SyncEvent) {
        match event {
            SyncEvent::ConfigUpdated {
                namespace,
                release_key,
                persisted,
            } => {
                metrics::record_fetch(namespace, "updated");
                tracing::debug!(%namespace, %release_key, persisted, "Configuration fetched");
            }
            SyncEvent::NamespaceFetchFailed { namespace, status } => {
                metrics::record_fetch(namespace, "rejected");
                tracing::warn!(
                    %namespace,
                    status,
                    "Get configuration from config server failed, loading from local cache file"
                );
            }
            SyncEvent::ServerUnreachable {
                namespace,
                url,
                reason,
            } => {
                metrics::record_fetch(namespace, "unreachable");
                tracing::error!(%namespace, %url, error = %reason, "Config server unreachable");
            }
            SyncEvent::DiskFallback { namespace, keys } => {
                metrics::record_disk_fallback(namespace);
                tracing::info!(%namespace, keys, "Serving configuration from disk cache");
            }
            SyncEvent::CacheCorrupt { namespace, reason } => {
                tracing::error!(%namespace, error = %reason, "Disk cache unreadable, treating as empty");
            }
            SyncEvent::CacheWriteFailed { namespace, reason } => {
                tracing::error!(%namespace, error = %reason, "Failed to persist configuration");
            }
            SyncEvent::FailoverCompleted { from, to } => {
                metrics::record_failover(true);
                tracing::warn!(%from, %to, "Switched config server");
            }
            SyncEvent::FailoverFailed { from, reason } => {
                metrics::record_failover(false);
                tracing::warn!(%from, error = %reason, "No alternative config server, keeping current");
            }
            SyncEvent::CycleReloadedFromDisk { namespaces } => {
                tracing::warn!(namespaces, "Connectivity lost during cycle, reloaded cache from disk");
            }
            SyncEvent::CycleCompleted {
                namespaces,
                failures,
            } => {
                tracing::debug!(namespaces, failures, "Sync cycle completed");
            }
        }
    }
}
