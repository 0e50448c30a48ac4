//! Junction-tree engine configuration loading and validation.
//!
//! This crate provides:
//! - Typed structs for the engine configuration (inference and learning)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots for reproducibility

pub mod engine;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use engine::{load_config, EngineConfig, InferenceConfig, LearningConfig, LoadedConfig};
pub use resolve::{resolve_config, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
