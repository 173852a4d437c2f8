//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required identifiers are present
//! - Validate value ranges (timeouts > 0, cycle time > 0)
//! - Detect duplicate namespaces and names that would escape the cache directory
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before a client is constructed

use std::collections::HashSet;
use std::fmt;

use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a client configuration.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.meta_server_address.trim().is_empty() {
        errors.push(ValidationError::new("meta_server_address", "is required"));
    } else {
        match Url::parse(&config.meta_server_address) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "meta_server_address",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(
                "meta_server_address",
                format!("invalid URL: {}", e),
            )),
        }
    }

    if config.app_id.trim().is_empty() {
        errors.push(ValidationError::new("app_id", "is required"));
    }

    if config.cluster.trim().is_empty() {
        errors.push(ValidationError::new("cluster", "must not be empty"));
    }

    if config.namespaces.is_empty() {
        errors.push(ValidationError::new("namespaces", "at least one namespace is required"));
    }
    let mut seen = HashSet::new();
    for ns in &config.namespaces {
        if ns.trim().is_empty() {
            errors.push(ValidationError::new("namespaces", "namespace names must not be empty"));
        } else if ns.contains(['/', '\\']) {
            errors.push(ValidationError::new(
                "namespaces",
                format!("namespace '{}' must not contain path separators", ns),
            ));
        } else if !seen.insert(ns.as_str()) {
            errors.push(ValidationError::new(
                "namespaces",
                format!("duplicate namespace '{}'", ns),
            ));
        }
    }

    if config.timeout_secs == 0 {
        errors.push(ValidationError::new("timeout_secs", "must be positive"));
    }
    if config.cycle_time_secs == 0 {
        errors.push(ValidationError::new("cycle_time_secs", "must be positive"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
