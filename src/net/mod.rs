//! Network helpers.
//!
//! # Responsibilities
//! - Build the shared HTTP client (timeout, proxy policy)
//! - Determine the client address reported to the config server

pub mod local_addr;

use std::time::Duration;

use crate::error::{ApolloError, ApolloResult};

/// HTTP client shared by the locator and the sync engine.
pub fn build_http_client(timeout: Duration, system_proxy: bool) -> ApolloResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(concat!("apollo-sync/", env!("CARGO_PKG_VERSION")));
    if !system_proxy {
        builder = builder.no_proxy();
    }
    builder
        .build()
        .map_err(|e| ApolloError::Discovery(format!("cannot build HTTP client: {}", e)))
}
