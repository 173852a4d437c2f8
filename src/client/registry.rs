//! Shared client handles keyed by configuration identity.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::facade::ConfigClient;
use crate::config::ClientConfig;
use crate::error::ApolloResult;
use crate::observability::{EventSink, TracingSink};

/// Hands out one started client per distinct configuration.
///
/// Identical configurations share a client, and with it a single background
/// worker. The lock is held while a new client connects, so concurrent
/// requests for the same identity never build two.
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<String, Arc<ConfigClient>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registered client for `config`, connecting a new one if needed.
    pub async fn get_or_create(&self, config: ClientConfig) -> ApolloResult<Arc<ConfigClient>> {
        self.get_or_create_with_sink(config, Arc::new(TracingSink))
            .await
    }

    /// Like [`get_or_create`](Self::get_or_create); `sink` is only used when a
    /// new client is built.
    pub async fn get_or_create_with_sink(
        &self,
        config: ClientConfig,
        sink: Arc<dyn EventSink>,
    ) -> ApolloResult<Arc<ConfigClient>> {
        let key = config.identity_key();
        let mut clients = self.clients.lock().await;

        if let Some(client) = clients.get(&key) {
            tracing::debug!(app_id = %config.app_id, "Reusing registered config client");
            return Ok(client.clone());
        }

        let client = Arc::new(ConfigClient::new_with_sink(config, sink).await?);
        client.start().await;
        clients.insert(key, client.clone());
        Ok(client)
    }

    /// The registered client for `config`, if any.
    pub async fn get(&self, config: &ClientConfig) -> Option<Arc<ConfigClient>> {
        self.clients
            .lock()
            .await
            .get(&config.identity_key())
            .cloned()
    }

    /// Unregister and stop the client for `config`.
    pub async fn remove(&self, config: &ClientConfig) -> Option<Arc<ConfigClient>> {
        let client = self.clients.lock().await.remove(&config.identity_key())?;
        client.stop();
        Some(client)
    }

    /// Stop every registered client and wait for their workers.
    pub async fn shutdown_all(&self) {
        let clients: Vec<_> = self.clients.lock().await.drain().map(|(_, c)| c).collect();
        for client in clients {
            client.shutdown().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry").finish_non_exhaustive()
    }
}
