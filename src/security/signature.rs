//! Signed-request authentication.
//!
//! # Algorithm
//! ```text
//! timestamp       = epoch millis
//! string_to_sign  = timestamp + "\n" + path_and_query(url)
//! signature       = base64(HMAC-SHA1(secret, string_to_sign))
//! Authorization   = "Apollo " + app_id + ":" + signature
//! ```
//!
//! Headers are rebuilt for every request; a captured set must not be replayed.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use sha1::Sha1;
use url::Url;

use crate::error::{ApolloError, ApolloResult};

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the signing timestamp.
pub const TIMESTAMP_HEADER: &str = "Timestamp";

/// Signs outgoing requests with the application secret.
#[derive(Clone)]
pub struct RequestSigner {
    app_id: String,
    mac: HmacSha1,
}

/// The two values attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub timestamp: String,
}

impl RequestSigner {
    /// Create a signer for `app_id` keyed with `secret`.
    pub fn new(app_id: impl Into<String>, secret: &str) -> ApolloResult<Self> {
        let mac = HmacSha1::new_from_slice(secret.as_bytes())
            .map_err(|e| ApolloError::Signature(e.to_string()))?;
        Ok(Self {
            app_id: app_id.into(),
            mac,
        })
    }

    /// Sign `url` with the current time.
    pub fn sign(&self, url: &Url) -> SignedHeaders {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        self.sign_at(url, now)
    }

    /// Sign `url` with an explicit timestamp.
    pub fn sign_at(&self, url: &Url, timestamp_ms: u128) -> SignedHeaders {
        let timestamp = timestamp_ms.to_string();
        let string_to_sign = format!("{}\n{}", timestamp, path_with_query(url));

        let mut mac = self.mac.clone();
        mac.update(string_to_sign.as_bytes());
        let signature = general_purpose::STANDARD.encode(mac.finalize().into_bytes());

        SignedHeaders {
            authorization: format!("Apollo {}:{}", self.app_id, signature),
            timestamp,
        }
    }

    /// Signed headers ready to attach to a reqwest request.
    pub fn headers(&self, url: &Url) -> ApolloResult<HeaderMap> {
        let signed = self.sign(url);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&signed.authorization)
                .map_err(|e| ApolloError::Signature(e.to_string()))?,
        );
        headers.insert(
            TIMESTAMP_HEADER,
            HeaderValue::from_str(&signed.timestamp)
                .map_err(|e| ApolloError::Signature(e.to_string()))?,
        );
        Ok(headers)
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

/// Path plus `?query` of a URL; an empty path signs as `/`.
pub fn path_with_query(url: &Url) -> String {
    let path = if url.path().is_empty() { "/" } else { url.path() };
    match url.query() {
        Some(q) if !q.is_empty() => format!("{}?{}", path, q),
        _ => path.to_string(),
    }
}
