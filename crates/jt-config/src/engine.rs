//! Engine configuration types and loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::resolve::{resolve_config, ConfigSource};
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_config, ValidationError, ValidationResult};

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Schema version of the file.
    pub schema_version: String,
    /// Junction-tree inference settings.
    pub inference: InferenceConfig,
    /// EM learning settings.
    pub learning: LearningConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            inference: InferenceConfig::default(),
            learning: LearningConfig::default(),
        }
    }
}

/// Settings for a single inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// IPFP stops once no cell changes by more than this in an iteration.
    pub ipfp_epsilon: f64,
    /// Hard cap on IPFP iterations.
    pub ipfp_max_iterations: usize,
    /// Rounding digits for `infer_all` results.
    pub precision: u32,
    /// Maximum number of propagated results kept per engine; 0 disables.
    pub potential_cache_capacity: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            ipfp_epsilon: 1e-4,
            ipfp_max_iterations: 100,
            precision: 8,
            potential_cache_capacity: 256,
        }
    }
}

impl InferenceConfig {
    /// Tight IPFP convergence for reference computations.
    pub fn strict() -> Self {
        Self {
            ipfp_epsilon: 1e-8,
            ipfp_max_iterations: 1000,
            ..Default::default()
        }
    }

    /// Same settings with the potential cache turned off.
    pub fn uncached() -> Self {
        Self {
            potential_cache_capacity: 0,
            ..Default::default()
        }
    }
}

/// Settings for EM parameter learning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Stop once the relative log-likelihood change falls below this.
    pub stop_ratio: f64,
    /// Hard cap on EM iterations.
    pub max_iterations: usize,
    /// Symmetric Dirichlet pseudo-count added to every expected count.
    pub pseudo_count: f64,
    /// Worker threads for the expectation step.
    pub workers: usize,
    /// Log-likelihood drop tolerated before the run counts as decreasing.
    pub likelihood_tolerance: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            stop_ratio: 1e-5,
            max_iterations: 100,
            pseudo_count: 0.0,
            workers: 1,
            likelihood_tolerance: 1e-9,
        }
    }
}

impl LearningConfig {
    /// Maximum a posteriori estimation under a uniform Dirichlet prior.
    pub fn smoothed() -> Self {
        Self {
            pseudo_count: 1.0,
            ..Default::default()
        }
    }

    /// Default settings with a custom stop ratio.
    pub fn with_stop_ratio(stop_ratio: f64) -> Self {
        Self {
            stop_ratio,
            ..Default::default()
        }
    }
}

impl EngineConfig {
    /// Load and validate a configuration file (TOML or JSON by extension).
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content, is_toml(path))?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration text without validating it.
    pub fn parse(content: &str, toml_format: bool) -> ValidationResult<Self> {
        if toml_format {
            toml::from_str(content)
                .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
        } else {
            serde_json::from_str(content)
                .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
        }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("toml")
}

/// A resolved configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: EngineConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
    pub snapshot: ConfigSnapshot,
}

/// Resolve, read, and validate the engine configuration.
///
/// An explicit `cli_path` must exist; the other sources fall through to
/// built-in defaults.
pub fn load_config(cli_path: Option<&Path>) -> ValidationResult<LoadedConfig> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ValidationError::IoError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
    }

    let (path, source) = resolve_config(cli_path);
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let config = EngineConfig::parse(&content, is_toml(&path))?;
            validate_config(&config)?;
            let snapshot = ConfigSnapshot::new(&config, Some(&path), &source, Some(&content));
            Ok(LoadedConfig {
                config,
                path: Some(path),
                source,
                snapshot,
            })
        }
        None => {
            let config = EngineConfig::default();
            let snapshot = ConfigSnapshot::new(&config, None, &source, None);
            Ok(LoadedConfig {
                config,
                path: None,
                source,
                snapshot,
            })
        }
    }
}
