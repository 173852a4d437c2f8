//! Disk persistence of namespace configuration.
//!
//! # Responsibilities
//! - Persist one JSON file per (app id, namespace): `{app_id}_configuration_{namespace}.txt`
//! - Skip writes whose release fingerprint was already persisted
//! - Load snapshots back when the network is unavailable
//!
//! # Design Decisions
//! - File content is the bare `configurations` map, without the fingerprint
//! - Writes go to a temporary file that is renamed over the target, so readers
//!   never observe a partially written file
//! - The fingerprint table is process-local and starts empty; the first write
//!   after a restart may rewrite identical data
//! - Reads are best-effort: missing or corrupt files yield an empty map

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;

use crate::error::{ApolloError, ApolloResult};
use crate::observability::metrics;

const FILE_INFIX: &str = "_configuration_";
const FILE_EXTENSION: &str = "txt";

/// Namespace configuration persisted on disk.
#[derive(Debug)]
pub struct DiskCache {
    directory: PathBuf,
    app_id: String,
    /// Namespace → last persisted release fingerprint.
    fingerprints: DashMap<String, String>,
    write_lock: Mutex<()>,
    writes: AtomicU64,
}

impl DiskCache {
    /// Open the cache in `directory`, creating it if needed.
    pub fn new(directory: impl Into<PathBuf>, app_id: impl Into<String>) -> ApolloResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            app_id: app_id.into(),
            fingerprints: DashMap::new(),
            write_lock: Mutex::new(()),
            writes: AtomicU64::new(0),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File holding `namespace`.
    pub fn path_for(&self, namespace: &str) -> PathBuf {
        self.directory.join(format!(
            "{}{}{}.{}",
            self.app_id, FILE_INFIX, namespace, FILE_EXTENSION
        ))
    }

    /// Persist `configurations` unless `fingerprint` is already on disk.
    ///
    /// Returns `true` if a file was written. The fingerprint table is only
    /// updated after the file is in place.
    pub fn write(
        &self,
        namespace: &str,
        fingerprint: &str,
        configurations: &HashMap<String, String>,
    ) -> ApolloResult<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if self.fingerprint(namespace).as_deref() == Some(fingerprint) {
            tracing::trace!(namespace, fingerprint, "Release unchanged, skipping cache write");
            return Ok(false);
        }

        let path = self.path_for(namespace);
        let temp_path = path.with_extension(format!("{}.tmp", FILE_EXTENSION));

        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, configurations)
            .map_err(|e| ApolloError::Io(e.into()))?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);

        fs::rename(&temp_path, &path)?;

        self.fingerprints
            .insert(namespace.to_string(), fingerprint.to_string());
        self.writes.fetch_add(1, Ordering::Relaxed);
        metrics::record_disk_write(namespace);

        tracing::debug!(
            namespace,
            fingerprint,
            keys = configurations.len(),
            path = %path.display(),
            "Configuration persisted to disk cache"
        );
        Ok(true)
    }

    /// Load `namespace` from disk.
    ///
    /// `Ok(None)` when no file exists, `CacheCorrupt` when it cannot be decoded.
    pub fn load(&self, namespace: &str) -> ApolloResult<Option<HashMap<String, String>>> {
        let path = self.path_for(namespace);
        match fs::read_to_string(&path) {
            Ok(content) => parse_snapshot(&path, &content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ApolloError::CacheCorrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Best-effort read of `namespace`; missing or corrupt files yield an empty map.
    pub fn read(&self, namespace: &str) -> HashMap<String, String> {
        match self.load(namespace) {
            Ok(Some(configurations)) => configurations,
            Ok(None) => HashMap::new(),
            Err(e) => {
                tracing::error!(namespace, error = %e, "Error reading cache file");
                HashMap::new()
            }
        }
    }

    /// Load every namespace persisted for this application.
    ///
    /// Files of other applications, swap and temporary files are skipped.
    /// Unreadable files are logged and left out.
    pub fn load_all(&self) -> HashMap<String, HashMap<String, String>> {
        let mut loaded = HashMap::new();

        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(
                    directory = %self.directory.display(),
                    error = %e,
                    "Cannot list cache directory"
                );
                return loaded;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(namespace) = self.namespace_of(&path) else {
                continue;
            };
            match fs::read_to_string(&path)
                .map_err(|e| ApolloError::CacheCorrupt {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
                .and_then(|content| parse_snapshot(&path, &content))
            {
                Ok(configurations) => {
                    loaded.insert(namespace, configurations);
                }
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable cache file"),
            }
        }

        loaded
    }

    /// Last persisted fingerprint of `namespace` in this process.
    pub fn fingerprint(&self, namespace: &str) -> Option<String> {
        self.fingerprints.get(namespace).map(|r| r.value().clone())
    }

    /// Number of files written by this instance.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Namespace encoded in a cache file name, if the file belongs to this app.
    fn namespace_of(&self, path: &Path) -> Option<String> {
        let extension = path.extension()?.to_str()?;
        // Swap and temporary files carry a different final extension.
        if extension != FILE_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let prefix = format!("{}{}", self.app_id, FILE_INFIX);
        stem.strip_prefix(&prefix)
            .filter(|ns| !ns.is_empty())
            .map(String::from)
    }
}

fn parse_snapshot(path: &Path, content: &str) -> ApolloResult<HashMap<String, String>> {
    serde_json::from_str(content).map_err(|e| ApolloError::CacheCorrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_write_is_gated_by_fingerprint() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), "demo").unwrap();
        let data = map(&[("timeout", "30")]);

        assert!(cache.write("application", "r1", &data).unwrap());
        assert!(!cache.write("application", "r1", &data).unwrap());
        assert_eq!(cache.write_count(), 1);
        assert_eq!(cache.fingerprint("application").as_deref(), Some("r1"));

        assert!(cache.write("application", "r2", &data).unwrap());
        assert_eq!(cache.write_count(), 2);
    }

    #[test]
    fn test_file_holds_bare_map() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), "demo").unwrap();
        cache
            .write("application", "r1", &map(&[("timeout", "30")]))
            .unwrap();

        let path = dir.path().join("demo_configuration_application.txt");
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"timeout": "30"}));
    }

    #[test]
    fn test_round_trip_through_fresh_instance() {
        let dir = tempdir().unwrap();
        let data = map(&[("timeout", "30"), ("db.url", "postgres://x")]);
        {
            let cache = DiskCache::new(dir.path(), "demo").unwrap();
            cache.write("application", "r1", &data).unwrap();
            cache.write("db_settings", "r9", &map(&[("pool", "4")])).unwrap();
        }

        let fresh = DiskCache::new(dir.path(), "demo").unwrap();
        assert!(fresh.fingerprint("application").is_none());

        let all = fresh.load_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all["application"], data);
        assert_eq!(all["db_settings"]["pool"], "4");
    }

    #[test]
    fn test_missing_and_corrupt_read_as_empty() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), "demo").unwrap();
        assert!(cache.read("application").is_empty());
        assert!(cache.load("application").unwrap().is_none());

        fs::write(cache.path_for("application"), "{not json").unwrap();
        assert!(cache.read("application").is_empty());
        assert!(matches!(
            cache.load("application"),
            Err(ApolloError::CacheCorrupt { .. })
        ));
    }

    #[test]
    fn test_load_all_skips_foreign_and_transient_files() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), "demo").unwrap();
        cache.write("application", "r1", &map(&[("a", "1")])).unwrap();

        fs::write(dir.path().join("other_configuration_application.txt"), "{}").unwrap();
        fs::write(dir.path().join("demo_configuration_application.txt.swp"), "garbage").unwrap();
        fs::write(dir.path().join("demo_configuration_redis.txt.tmp"), "{\"x\":\"1\"}").unwrap();
        fs::write(dir.path().join("demo_configuration_broken.txt"), "[1,2").unwrap();
        fs::create_dir(dir.path().join("demo_configuration_dir.txt")).unwrap();

        let all = cache.load_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all["application"]["a"], "1");
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let cache = DiskCache::new(&nested, "demo").unwrap();
        assert!(nested.is_dir());
        assert_eq!(cache.directory(), nested.as_path());
    }
}
