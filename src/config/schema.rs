//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Port assumed when a config-server homepage URL carries none.
pub const DEFAULT_CONFIG_SERVER_PORT: u16 = 8090;

/// Namespace fetched when none is configured.
pub const DEFAULT_NAMESPACE: &str = "application";

/// Root configuration for a config client.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Meta server address (e.g., "http://apollo-meta:8080").
    pub meta_server_address: String,

    /// Application identifier.
    pub app_id: String,

    /// Shared secret; enables request signing when present.
    pub app_secret: Option<String>,

    /// Cluster name.
    pub cluster: String,

    /// Deployment environment label.
    pub env: String,

    /// Namespaces fetched on every cycle.
    pub namespaces: Vec<String>,

    /// Client address reported for grey releases. Auto-detected when unset.
    pub ip: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Polling interval in seconds.
    pub cycle_time_secs: u64,

    /// Directory holding the disk cache files.
    pub cache_directory: Option<PathBuf>,

    /// Whether the HTTP client honours proxy environment variables.
    pub system_proxy: bool,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            meta_server_address: String::new(),
            app_id: String::new(),
            app_secret: None,
            cluster: "default".to_string(),
            env: "DEV".to_string(),
            namespaces: vec![DEFAULT_NAMESPACE.to_string()],
            ip: None,
            timeout_secs: 10,
            cycle_time_secs: 30,
            cache_directory: None,
            system_proxy: true,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with the two required settings.
    pub fn new(meta_server_address: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            meta_server_address: meta_server_address.into(),
            app_id: app_id.into(),
            ..Self::default()
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.app_secret = Some(secret.into());
        self
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = cluster.into();
        self
    }

    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_cycle_time_secs(mut self, secs: u64) -> Self {
        self.cycle_time_secs = secs;
        self
    }

    pub fn with_cache_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_directory = Some(dir.into());
        self
    }

    pub fn with_system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = enabled;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cycle_time(&self) -> Duration {
        Duration::from_secs(self.cycle_time_secs)
    }

    /// Secret used for signing, ignoring blank values.
    pub fn secret(&self) -> Option<&str> {
        self.app_secret.as_deref().filter(|s| !s.is_empty())
    }

    /// Cache directory, falling back to `config/` next to the running executable.
    pub fn resolved_cache_directory(&self) -> PathBuf {
        if let Some(dir) = &self.cache_directory {
            return dir.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.join("config")))
            .unwrap_or_else(|| std::env::temp_dir().join("apollo-sync").join("config"))
    }

    /// Canonical identity of the logical client described by this configuration.
    ///
    /// Namespace order and duplicates do not change the identity.
    pub fn identity_key(&self) -> String {
        let mut namespaces = self.namespaces.clone();
        namespaces.sort();
        namespaces.dedup();
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}",
            self.meta_server_address.trim_end_matches('/'),
            self.app_id,
            self.cluster,
            self.env,
            namespaces.join(","),
            self.ip.as_deref().unwrap_or(""),
            self.secret().unwrap_or(""),
            self.resolved_cache_directory().display(),
        )
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Prometheus exporter bind address; disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}
