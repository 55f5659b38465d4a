//! Configuration loading
//!
//! A small YAML configuration file controls defaults that are annoying to
//! pass as flags every run. Missing file means built-in defaults; a file
//! that exists but fails to parse is a real error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory export files land in
    #[serde(default = "default_export_dir")]
    pub export_dir: String,

    /// Hide the per-pod table in analyze output (large clusters)
    #[serde(default)]
    pub skip_pod_table: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            export_dir: default_export_dir(),
            skip_pod_table: false,
        }
    }
}

fn default_export_dir() -> String {
    crate::export::DEFAULT_EXPORT_DIR.to_string()
}

/// Get the configuration directory path
///
/// Checks CLUSTERLENS_CONFIG_DIR first, then the platform config dir
/// (XDG on Unix, AppData on Windows).
pub fn config_dir() -> PathBuf {
    std::env::var("CLUSTERLENS_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            use directories::ProjectDirs;
            ProjectDirs::from("", "", "clusterlens")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".").join(".config").join("clusterlens"))
        })
}

/// Path of the config file
pub fn config_path() -> PathBuf {
    config_dir().join("config.yaml")
}

/// Load configuration, falling back to defaults when no file exists
pub fn load() -> Result<Config> {
    let path = config_path();
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}
