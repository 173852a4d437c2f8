//! Config-server endpoint abstraction.
//!
//! # Responsibilities
//! - Represent a single config-server candidate reported by the meta server
//! - Derive host and port from its homepage URL
//! - Provide the base URL requests are issued against

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::schema::DEFAULT_CONFIG_SERVER_PORT;
use crate::error::{ApolloError, ApolloResult};

/// One entry of the `GET {meta}/services/config` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstance {
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub instance_id: Option<String>,
    pub homepage_url: String,
}

/// A selected config server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    /// Host name or address.
    pub host: String,
    /// Port, [`DEFAULT_CONFIG_SERVER_PORT`] when the URL carries none.
    pub port: u16,
    /// Homepage URL exactly as reported; identifies the endpoint for exclusion.
    pub origin_url: String,
    /// Pre-calculated base URL (`scheme://host:port`).
    base_url: Url,
}

impl ServerEndpoint {
    /// Parse an endpoint from a homepage URL such as `http://10.0.0.1:8080/`.
    pub fn from_homepage(homepage_url: &str) -> ApolloResult<Self> {
        let url = Url::parse(homepage_url.trim()).map_err(|e| {
            ApolloError::Discovery(format!("invalid homepage URL '{}': {}", homepage_url, e))
        })?;
        let host = url
            .host_str()
            .ok_or_else(|| ApolloError::Discovery(format!("homepage URL '{}' has no host", homepage_url)))?
            .to_string();
        // `Url::port` hides a port equal to the scheme default, so the raw
        // authority decides whether one was given.
        let port = if has_explicit_port(homepage_url) {
            url.port_or_known_default().unwrap_or(DEFAULT_CONFIG_SERVER_PORT)
        } else {
            DEFAULT_CONFIG_SERVER_PORT
        };

        let base_url = Url::parse(&format!("{}://{}:{}", url.scheme(), host, port))
            .map_err(|e| ApolloError::Discovery(e.to_string()))?;

        Ok(Self {
            host,
            port,
            origin_url: homepage_url.to_string(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// True if this endpoint is the one identified by `origin`.
    ///
    /// Trailing slashes are not significant.
    pub fn matches(&self, origin: &str) -> bool {
        normalize(&self.origin_url) == normalize(origin)
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url.as_str().trim_end_matches('/'))
    }
}

/// Whether the authority of `raw` carries a `:port` suffix.
fn has_explicit_port(raw: &str) -> bool {
    let rest = raw.trim().split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let after_host = match host_port.rfind(']') {
        Some(end) => &host_port[end + 1..],
        None => host_port,
    };
    after_host
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}

fn normalize(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}
