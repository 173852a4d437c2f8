//! Config-server wire types.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Body of `GET /configs/{app_id}/{cluster}/{namespace}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub namespace_name: Option<String>,
    #[serde(default)]
    pub configurations: HashMap<String, String>,
    #[serde(default)]
    pub release_key: Option<String>,
}

impl ConfigResponse {
    /// Release fingerprint, synthesized from the clock when the server sent none.
    pub fn fingerprint(&self) -> String {
        match self.release_key.as_deref() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => synthesized_fingerprint(),
        }
    }
}

fn synthesized_fingerprint() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .to_string()
}

/// Result of one namespace's fetch step within a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fresh data applied from the config server.
    Updated { release_key: String, persisted: bool },
    /// Config server rejected the request; disk data served.
    Rejected { status: u16 },
    /// Config server could not be reached; disk data served.
    Unreachable,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Updated { .. })
    }

    pub fn is_connectivity_failure(&self) -> bool {
        matches!(self, FetchOutcome::Unreachable)
    }
}

/// Summary of a full cycle over every configured namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub updated: usize,
    pub rejected: usize,
    pub unreachable: usize,
    /// Whether connectivity loss caused a full reload from disk.
    pub reloaded_from_disk: bool,
}

impl CycleReport {
    pub fn failures(&self) -> usize {
        self.rejected + self.unreachable
    }

    pub(crate) fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Updated { .. } => self.updated += 1,
            FetchOutcome::Rejected { .. } => self.rejected += 1,
            FetchOutcome::Unreachable => self.unreachable += 1,
        }
    }
}
