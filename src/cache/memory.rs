//! In-memory configuration cache.
//!
//! # Responsibilities
//! - Map namespace → configuration snapshot for all reads
//! - Serialize updates behind one update lock
//! - Let readers proceed without waiting on writers
//!
//! # Design Decisions
//! - The whole map lives behind an `ArcSwap`; an update clones the map,
//!   replaces one entry and swaps the pointer
//! - Readers load the pointer and see either the old or the new snapshot,
//!   never a mix

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::observability::metrics;

/// Where a snapshot's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Fetched from a config server.
    Remote,
    /// Loaded from the disk cache after a failed fetch.
    Disk,
}

/// Key/value configuration of one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// Configuration entries.
    pub configurations: HashMap<String, String>,
    /// Release fingerprint; absent for disk-loaded snapshots.
    pub release_key: Option<String>,
    pub source: SnapshotSource,
}

impl ConfigSnapshot {
    pub fn remote(configurations: HashMap<String, String>, release_key: impl Into<String>) -> Self {
        Self {
            configurations,
            release_key: Some(release_key.into()),
            source: SnapshotSource::Remote,
        }
    }

    pub fn from_disk(configurations: HashMap<String, String>) -> Self {
        Self {
            configurations,
            release_key: None,
            source: SnapshotSource::Disk,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.configurations.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}

type SnapshotMap = HashMap<String, Arc<ConfigSnapshot>>;

/// Thread-safe namespace → snapshot cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: ArcSwap<SnapshotMap>,
    update_lock: Mutex<()>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of `namespace`, if one has been stored.
    pub fn get(&self, namespace: &str) -> Option<Arc<ConfigSnapshot>> {
        self.entries.load().get(namespace).cloned()
    }

    /// Value of `key` in `namespace`.
    pub fn value(&self, namespace: &str, key: &str) -> Option<String> {
        self.entries
            .load()
            .get(namespace)
            .and_then(|snapshot| snapshot.get(key))
            .map(String::from)
    }

    /// Replace the snapshot of `namespace`.
    pub fn set(&self, namespace: &str, snapshot: ConfigSnapshot) {
        let _guard = self
            .update_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut next: SnapshotMap = HashMap::clone(&self.entries.load());
        next.insert(namespace.to_string(), Arc::new(snapshot));
        let count = next.len();
        self.entries.store(Arc::new(next));

        metrics::record_cached_namespaces(count);
    }

    /// Names of all cached namespaces.
    pub fn namespaces(&self) -> Vec<String> {
        self.entries.load().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }
}
