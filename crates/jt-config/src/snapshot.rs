//! Configuration snapshots for reproducibility.
//!
//! A snapshot captures the exact configuration a run used, so learned
//! parameters and inference results can be traced back to their settings.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::engine::EngineConfig;
use crate::resolve::ConfigSource;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the configuration was loaded from.
    #[serde(default)]
    pub path: Option<String>,

    /// Source of the configuration.
    pub source: String,

    /// SHA-256 of the raw file content, or of the effective settings when
    /// running on defaults.
    pub hash: String,

    /// Effective settings.
    pub effective: EngineConfig,
}

impl ConfigSnapshot {
    /// Create a new snapshot from loaded configuration.
    pub fn new(
        config: &EngineConfig,
        path: Option<&Path>,
        source: &ConfigSource,
        raw: Option<&str>,
    ) -> Self {
        let hash = match raw {
            Some(content) => hash_content(content),
            None => hash_content(&serde_json::to_string(config).unwrap_or_default()),
        };
        ConfigSnapshot {
            schema_version: config.schema_version.clone(),
            path: path.map(|p| p.display().to_string()),
            source: source.to_string(),
            hash,
            effective: config.clone(),
        }
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check if this snapshot matches another (same config).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.hash == other.hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.hash[..12.min(self.hash.len())]
    }
}

fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
