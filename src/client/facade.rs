//! Public read API and lifecycle of a config client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::cache::{ConfigSnapshot, DiskCache, MemoryCache};
use crate::config::validation::validate_config;
use crate::config::{ClientConfig, ConfigError};
use crate::discovery::{ServerEndpoint, ServerLocator};
use crate::error::ApolloResult;
use crate::lifecycle::Shutdown;
use crate::net::build_http_client;
use crate::observability::{EventSink, TracingSink};
use crate::sync::{CycleReport, SyncEngine};

/// A configuration client bound to one application, cluster and namespace set.
///
/// Reads never fail and never wait on the network. Dropping the client stops
/// its background worker.
pub struct ConfigClient {
    config: ClientConfig,
    engine: Arc<SyncEngine>,
    memory: Arc<MemoryCache>,
    disk: Arc<DiskCache>,
    locator: Arc<ServerLocator>,
    shutdown: Shutdown,
    started: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ConfigClient {
    /// Build a client and resolve its first config server.
    ///
    /// Fails with [`NoServiceAvailable`](crate::error::ApolloError::NoServiceAvailable)
    /// when the meta server offers no candidate. No configuration is fetched until [`start`](Self::start).
    pub async fn new(config: ClientConfig) -> ApolloResult<Self> {
        Self::new_with_sink(config, Arc::new(TracingSink)).await
    }

    /// Like [`new`](Self::new), delivering engine events to `sink`.
    pub async fn new_with_sink(
        config: ClientConfig,
        sink: Arc<dyn EventSink>,
    ) -> ApolloResult<Self> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let http = build_http_client(config.timeout(), config.system_proxy)?;
        let locator = Arc::new(ServerLocator::new(&config.meta_server_address, http.clone()));
        if let Err(e) = locator.resolve(None).await {
            tracing::error!(
                meta_server = %config.meta_server_address,
                connectivity = e.is_connectivity(),
                error = %e,
                "Cannot resolve an initial config server"
            );
            return Err(e);
        }

        let disk = Arc::new(DiskCache::new(
            config.resolved_cache_directory(),
            config.app_id.clone(),
        )?);
        let memory = Arc::new(MemoryCache::new());
        let engine = Arc::new(SyncEngine::new(
            &config,
            http,
            locator.clone(),
            memory.clone(),
            disk.clone(),
            sink,
        )?);

        tracing::info!(
            app_id = %config.app_id,
            cluster = %config.cluster,
            namespaces = ?config.namespaces,
            ip = %engine.ip(),
            cache_directory = %disk.directory().display(),
            "Config client created"
        );

        Ok(Self {
            config,
            engine,
            memory,
            disk,
            locator,
            shutdown: Shutdown::new(),
            started: AtomicBool::new(false),
            worker: Mutex::new(None),
        })
    }

    /// Build and start a client.
    pub async fn connect(config: ClientConfig) -> ApolloResult<Self> {
        let client = Self::new(config).await?;
        client.start().await;
        Ok(client)
    }

    /// Fetch every namespace once, then poll every `cycle_time` in the background.
    ///
    /// Must be called within a tokio runtime. Later calls are no-ops.
    pub async fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let report = self.engine.run_cycle().await;
        tracing::info!(
            updated = report.updated,
            failures = report.failures(),
            "Initial configuration loaded"
        );

        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if self.shutdown.is_triggered() {
            return;
        }
        let task = self
            .engine
            .clone()
            .run(self.shutdown.subscribe(), self.config.cycle_time());
        *worker = Some(tokio::spawn(task));
    }

    /// Signal the background worker to stop. Idempotent, callable from any thread.
    pub fn stop(&self) {
        if !self.shutdown.is_triggered() {
            tracing::info!(app_id = %self.config.app_id, "Stopping config client");
        }
        self.shutdown.trigger();
    }

    /// Stop and wait for the worker to exit.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Sync worker terminated abnormally");
            }
        }
    }

    /// Run one cycle now, outside the polling schedule.
    pub async fn refresh(&self) -> CycleReport {
        self.engine.run_cycle().await
    }

    /// Value of `key` in `namespace`.
    pub fn get(&self, key: &str, namespace: &str) -> Option<String> {
        self.memory.value(namespace, key)
    }

    /// Value of `key` in `namespace`, or `default` when absent.
    pub fn get_or(&self, key: &str, namespace: &str, default: &str) -> String {
        self.get(key, namespace)
            .unwrap_or_else(|| default.to_string())
    }

    /// Value of `key` parsed as JSON; an empty object when absent or unparseable.
    pub fn get_structured(&self, key: &str, namespace: &str) -> Value {
        let Some(raw) = self.get(key, namespace) else {
            return Value::Object(Default::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(key, namespace, error = %e, "Value is not valid JSON");
                Value::Object(Default::default())
            }
        }
    }

    /// Current snapshot of `namespace`.
    pub fn snapshot(&self, namespace: &str) -> Option<Arc<ConfigSnapshot>> {
        self.memory.get(namespace)
    }

    /// Config server the next fetch will target.
    pub fn current_endpoint(&self) -> Option<Arc<ServerEndpoint>> {
        self.locator.current()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn disk_cache(&self) -> &DiskCache {
        &self.disk
    }

    /// Whether the background worker is alive.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ConfigClient {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

impl std::fmt::Debug for ConfigClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigClient")
            .field("engine", &self.engine)
            .field("locator", &self.locator)
            .field("started", &self.started.load(Ordering::Relaxed))
            .field("stopped", &self.shutdown.is_triggered())
            .finish_non_exhaustive()
    }
}
