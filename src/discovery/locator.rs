//! Config-server discovery through the meta server.
//!
//! # Responsibilities
//! - Query `GET {meta}/services/config` for candidate endpoints
//! - Select the first candidate not excluded by the caller
//! - Hold the current selection, replaced wholesale on failover

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::discovery::endpoint::{ServerEndpoint, ServiceInstance};
use crate::error::{ApolloError, ApolloResult};

/// Resolves and tracks the config server a client talks to.
pub struct ServerLocator {
    /// Meta server base address, without trailing slash.
    meta_server_address: String,
    client: reqwest::Client,
    current: ArcSwapOption<ServerEndpoint>,
}

impl ServerLocator {
    pub fn new(meta_server_address: &str, client: reqwest::Client) -> Self {
        Self {
            meta_server_address: meta_server_address.trim_end_matches('/').to_string(),
            client,
            current: ArcSwapOption::empty(),
        }
    }

    /// Discovery endpoint URL.
    pub fn services_url(&self) -> String {
        format!("{}/services/config", self.meta_server_address)
    }

    /// Fetch the candidate list from the meta server.
    pub async fn candidates(&self) -> ApolloResult<Vec<ServiceInstance>> {
        let url = self.services_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApolloError::unreachable(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApolloError::Discovery(format!(
                "meta server {} returned status {}",
                url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApolloError::unreachable(&url, &e))?;
        serde_json::from_str(&body)
            .map_err(|e| ApolloError::Discovery(format!("invalid service list from {}: {}", url, e)))
    }

    /// Select a config server, skipping the endpoint identified by `excluding`.
    ///
    /// On success the selection becomes the current endpoint.
    pub async fn resolve(&self, excluding: Option<&str>) -> ApolloResult<Arc<ServerEndpoint>> {
        let instances = self.candidates().await?;
        tracing::debug!(
            candidates = instances.len(),
            excluding = ?excluding,
            "Meta server returned config services"
        );

        let endpoint = Arc::new(select_endpoint(&instances, excluding)?);
        self.current.store(Some(endpoint.clone()));

        tracing::info!(
            url = %endpoint.origin_url,
            host = %endpoint.host,
            port = endpoint.port,
            "Config server selected"
        );
        Ok(endpoint)
    }

    /// The currently selected endpoint, if any.
    pub fn current(&self) -> Option<Arc<ServerEndpoint>> {
        self.current.load_full()
    }
}

impl std::fmt::Debug for ServerLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerLocator")
            .field("meta_server_address", &self.meta_server_address)
            .field("current", &self.current.load().as_ref().map(|e| e.origin_url.clone()))
            .finish()
    }
}

/// Pick the first usable candidate whose homepage is not `excluding`.
///
/// Entries with an unparseable homepage URL are skipped.
pub fn select_endpoint(
    instances: &[ServiceInstance],
    excluding: Option<&str>,
) -> ApolloResult<ServerEndpoint> {
    instances
        .iter()
        .filter_map(|instance| match ServerEndpoint::from_homepage(&instance.homepage_url) {
            Ok(ep) => Some(ep),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring config service with invalid homepage");
                None
            }
        })
        .find(|ep| excluding.map_or(true, |ex| !ep.matches(ex)))
        .ok_or(ApolloError::NoServiceAvailable)
}
