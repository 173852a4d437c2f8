//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Prefix shared by all environment overrides.
pub const ENV_PREFIX: &str = "APOLLO_";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// TOML file plus environment overrides, without validation.
///
/// For callers that layer further overrides before validating.
pub fn read_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ClientConfig = toml::from_str(&content)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Apply `APOLLO_*` variables from the process environment.
pub fn apply_env_overrides(config: &mut ClientConfig) {
    apply_overrides_from(config, |name| std::env::var(name).ok());
}

/// Apply `APOLLO_*` overrides resolved through `lookup`.
///
/// Unparseable numeric values are ignored with a warning.
pub fn apply_overrides_from<F>(config: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| {
        lookup(&format!("{}{}", ENV_PREFIX, suffix))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(v) = var("META_SERVER_ADDRESS") {
        config.meta_server_address = v;
    }
    if let Some(v) = var("APP_ID") {
        config.app_id = v;
    }
    if let Some(v) = var("APP_SECRET") {
        config.app_secret = Some(v);
    }
    if let Some(v) = var("USING_APP_SECRET") {
        if !parse_bool(&v) {
            config.app_secret = None;
        }
    }
    if let Some(v) = var("CLUSTER") {
        config.cluster = v;
    }
    if let Some(v) = var("ENV") {
        config.env = v;
    }
    if let Some(v) = var("NAMESPACES") {
        let namespaces: Vec<String> = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if !namespaces.is_empty() {
            config.namespaces = namespaces;
        }
    }
    if let Some(v) = var("IP") {
        config.ip = Some(v);
    }
    if let Some(v) = var("TIMEOUT") {
        match v.parse() {
            Ok(secs) => config.timeout_secs = secs,
            Err(_) => tracing::warn!(value = %v, "Ignoring invalid APOLLO_TIMEOUT"),
        }
    }
    if let Some(v) = var("CYCLE_TIME") {
        match v.parse() {
            Ok(secs) => config.cycle_time_secs = secs,
            Err(_) => tracing::warn!(value = %v, "Ignoring invalid APOLLO_CYCLE_TIME"),
        }
    }
    if let Some(v) = var("CACHE_FILE_DIR_PATH") {
        config.cache_directory = Some(v.into());
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
