//! Namespace synchronization engine.
//!
//! # Responsibilities
//! - Fetch every configured namespace from the current config server
//! - Apply fresh data to memory, then persist it (fingerprint gated)
//! - Serve disk data when a fetch fails, rotate servers on connectivity loss
//! - Drive the periodic polling loop until stopped

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::watch;
use tokio::time;
use url::Url;

use crate::cache::{ConfigSnapshot, DiskCache, MemoryCache};
use crate::config::ClientConfig;
use crate::discovery::{ServerEndpoint, ServerLocator};
use crate::error::{ApolloError, ApolloResult};
use crate::lifecycle::shutdown;
use crate::net::local_addr::resolve_local_ip;
use crate::observability::{EventSink, SyncEvent};
use crate::security::RequestSigner;
use crate::sync::types::{ConfigResponse, CycleReport, FetchOutcome};

/// Keeps the memory cache current for a fixed set of namespaces.
pub struct SyncEngine {
    app_id: String,
    cluster: String,
    namespaces: Vec<String>,
    /// Client address sent as `?ip=`.
    ip: String,
    http: reqwest::Client,
    locator: Arc<ServerLocator>,
    memory: Arc<MemoryCache>,
    disk: Arc<DiskCache>,
    signer: Option<RequestSigner>,
    sink: Arc<dyn EventSink>,
}

impl SyncEngine {
    pub fn new(
        config: &ClientConfig,
        http: reqwest::Client,
        locator: Arc<ServerLocator>,
        memory: Arc<MemoryCache>,
        disk: Arc<DiskCache>,
        sink: Arc<dyn EventSink>,
    ) -> ApolloResult<Self> {
        let signer = config
            .secret()
            .map(|secret| RequestSigner::new(config.app_id.clone(), secret))
            .transpose()?;

        Ok(Self {
            app_id: config.app_id.clone(),
            cluster: config.cluster.clone(),
            namespaces: config.namespaces.clone(),
            ip: resolve_local_ip(config.ip.as_deref()),
            http,
            locator,
            memory,
            disk,
            signer,
            sink,
        })
    }

    /// Address reported to the config server.
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// `{endpoint}/configs/{app_id}/{cluster}/{namespace}?ip={ip}`
    pub fn fetch_url(&self, endpoint: &ServerEndpoint, namespace: &str) -> ApolloResult<Url> {
        let mut url = endpoint.base_url().clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApolloError::Discovery(format!("config server URL {} cannot be a base", endpoint))
            })?
            .pop_if_empty()
            .extend(["configs", self.app_id.as_str(), self.cluster.as_str(), namespace]);
        url.query_pairs_mut().append_pair("ip", &self.ip);
        Ok(url)
    }

    /// One pass over every configured namespace.
    ///
    /// Namespaces are fetched independently. If any of them lost connectivity,
    /// every namespace is reloaded from disk afterwards.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        let mut lost_connectivity = false;

        for namespace in &self.namespaces {
            let outcome = self.fetch_namespace(namespace).await;
            if !outcome.is_success() {
                tracing::debug!(namespace = %namespace, ?outcome, "Namespace served from fallback");
            }
            lost_connectivity |= outcome.is_connectivity_failure();
            report.record(&outcome);
        }

        if lost_connectivity {
            let reloaded = self.reload_from_disk().await;
            report.reloaded_from_disk = true;
            self.sink.record(&SyncEvent::CycleReloadedFromDisk {
                namespaces: reloaded,
            });
        }

        self.sink.record(&SyncEvent::CycleCompleted {
            namespaces: self.namespaces.len(),
            failures: report.failures(),
        });
        report
    }

    /// Fetch one namespace and apply the success or fallback policy.
    pub async fn fetch_namespace(&self, namespace: &str) -> FetchOutcome {
        let endpoint = match self.endpoint().await {
            Ok(endpoint) => endpoint,
            Err(e) => {
                tracing::error!(namespace, error = %e, "No config server to fetch from");
                self.fall_back_to_disk(namespace).await;
                return FetchOutcome::Unreachable;
            }
        };

        match self.request(&endpoint, namespace).await {
            Ok(response) => self.apply(namespace, response).await,
            Err(ApolloError::NamespaceFetchFailed { status, .. }) => {
                self.sink.record(&SyncEvent::NamespaceFetchFailed {
                    namespace: namespace.to_string(),
                    status,
                });
                self.fall_back_to_disk(namespace).await;
                FetchOutcome::Rejected { status }
            }
            Err(ApolloError::ServerUnreachable { url, reason }) => {
                self.sink.record(&SyncEvent::ServerUnreachable {
                    namespace: namespace.to_string(),
                    url,
                    reason,
                });
                self.fall_back_to_disk(namespace).await;
                self.fail_over(&endpoint).await;
                FetchOutcome::Unreachable
            }
            Err(e) => {
                tracing::error!(
                    namespace,
                    recoverable = e.is_recoverable(),
                    error = %e,
                    "Cannot build config request"
                );
                self.fall_back_to_disk(namespace).await;
                FetchOutcome::Rejected { status: 0 }
            }
        }
    }

    /// Poll every `interval` until `stop` observes shutdown.
    ///
    /// The sleep between cycles is interrupted by shutdown; a cycle in
    /// progress is allowed to finish.
    pub async fn run(self: Arc<Self>, mut stop: watch::Receiver<bool>, interval: Duration) {
        tracing::info!(
            interval_secs = interval.as_secs(),
            namespaces = self.namespaces.len(),
            "Sync worker starting"
        );

        loop {
            tokio::select! {
                _ = time::sleep(interval) => {}
                _ = shutdown::wait_for(&mut stop) => {
                    break;
                }
            }
            if *stop.borrow() {
                break;
            }
            self.run_cycle().await;
        }

        tracing::info!("Sync worker stopped");
    }

    async fn endpoint(&self) -> ApolloResult<Arc<ServerEndpoint>> {
        match self.locator.current() {
            Some(endpoint) => Ok(endpoint),
            None => self.locator.resolve(None).await,
        }
    }

    async fn request(
        &self,
        endpoint: &ServerEndpoint,
        namespace: &str,
    ) -> ApolloResult<ConfigResponse> {
        let url = self.fetch_url(endpoint, namespace)?;

        let mut request = self.http.get(url.clone());
        if let Some(signer) = &self.signer {
            request = request.headers(signer.headers(&url)?);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApolloError::unreachable(url.as_str(), &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApolloError::NamespaceFetchFailed {
                namespace: namespace.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApolloError::unreachable(url.as_str(), &e))?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(namespace, error = %e, "Config server returned an unusable body");
            ApolloError::NamespaceFetchFailed {
                namespace: namespace.to_string(),
                status: status.as_u16(),
            }
        })
    }

    async fn apply(&self, namespace: &str, response: ConfigResponse) -> FetchOutcome {
        let release_key = response.fingerprint();
        let configurations = response.configurations;

        self.memory.set(
            namespace,
            ConfigSnapshot::remote(configurations.clone(), release_key.clone()),
        );

        let persisted = {
            let namespace = namespace.to_string();
            let fingerprint = release_key.clone();
            self.on_disk(move |disk| disk.write(&namespace, &fingerprint, &configurations))
                .await
        };
        let persisted = match persisted {
            Ok(written) => written,
            Err(e) => {
                self.sink.record(&SyncEvent::CacheWriteFailed {
                    namespace: namespace.to_string(),
                    reason: e.to_string(),
                });
                false
            }
        };

        self.sink.record(&SyncEvent::ConfigUpdated {
            namespace: namespace.to_string(),
            release_key: release_key.clone(),
            persisted,
        });
        FetchOutcome::Updated {
            release_key,
            persisted,
        }
    }

    /// Refill memory for `namespace` from its disk record.
    ///
    /// A missing or corrupt record reads as empty. An empty read never
    /// replaces a snapshot already held in memory.
    async fn fall_back_to_disk(&self, namespace: &str) {
        let loaded = {
            let namespace = namespace.to_string();
            self.on_disk(move |disk| disk.load(&namespace)).await
        };

        let configurations = match loaded {
            Ok(Some(configurations)) => configurations,
            Ok(None) => HashMap::new(),
            Err(e) => {
                self.sink.record(&SyncEvent::CacheCorrupt {
                    namespace: namespace.to_string(),
                    reason: e.to_string(),
                });
                HashMap::new()
            }
        };

        if configurations.is_empty() && self.memory.get(namespace).is_some() {
            tracing::debug!(namespace, "No disk data, keeping in-memory snapshot");
            return;
        }

        let keys = configurations.len();
        self.memory
            .set(namespace, ConfigSnapshot::from_disk(configurations));
        self.sink.record(&SyncEvent::DiskFallback {
            namespace: namespace.to_string(),
            keys,
        });
    }

    async fn fail_over(&self, failed: &ServerEndpoint) {
        let from = failed.to_string();
        match self.locator.resolve(Some(&failed.origin_url)).await {
            Ok(next) => self.sink.record(&SyncEvent::FailoverCompleted {
                from,
                to: next.to_string(),
            }),
            Err(e) => self.sink.record(&SyncEvent::FailoverFailed {
                from,
                reason: e.to_string(),
            }),
        }
    }

    /// Reload every configured namespace present on disk. Returns how many were applied.
    async fn reload_from_disk(&self) -> usize {
        let all = match self.on_disk(|disk| Ok(disk.load_all())).await {
            Ok(all) => all,
            Err(e) => {
                tracing::error!(error = %e, "Full reload from disk failed");
                return 0;
            }
        };

        let mut applied = 0;
        for (namespace, configurations) in all {
            if !self.namespaces.contains(&namespace) {
                continue;
            }
            self.memory
                .set(&namespace, ConfigSnapshot::from_disk(configurations));
            applied += 1;
        }
        applied
    }

    /// Run blocking disk work off the async workers.
    async fn on_disk<T, F>(&self, work: F) -> ApolloResult<T>
    where
        F: FnOnce(&DiskCache) -> ApolloResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let disk = self.disk.clone();
        tokio::task::spawn_blocking(move || work(&disk))
            .await
            .map_err(|e| ApolloError::Io(std::io::Error::other(e)))?
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("app_id", &self.app_id)
            .field("cluster", &self.cluster)
            .field("namespaces", &self.namespaces)
            .field("ip", &self.ip)
            .field("signed", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}
