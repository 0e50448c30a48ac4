//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG paths → defaults.

use std::path::{Path, PathBuf};

/// Where a configuration file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "JT_CONFIG";
pub const ENV_CONFIG_DIR: &str = "JT_CONFIG_DIR";

/// Config file names, in lookup order.
const CONFIG_FILENAMES: [&str; 2] = ["engine.toml", "engine.json"];

/// Application name for XDG directories.
const APP_NAME: &str = "jtree";

/// Resolve the engine configuration path.
///
/// Resolution order:
/// 1. Explicit CLI path (if provided and present)
/// 2. `JT_CONFIG` environment variable
/// 3. `JT_CONFIG_DIR` environment variable + file name
/// 4. XDG config directory (`~/.config/jtree/`)
/// 5. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = cli_path {
        if path.exists() {
            return (Some(path.to_path_buf()), ConfigSource::CliArgument);
        }
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        if let Some(path) = find_in_dir(&PathBuf::from(config_dir)) {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Some(xdg_config) = dirs::config_dir() {
        if let Some(path) = find_in_dir(&xdg_config.join(APP_NAME)) {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}
