//! Configuration file support for deptrace.
//!
//! Provides YAML-based configuration through `deptrace.config.yml` files
//! in the project directory, including data structures, file loading, and
//! validation. CLI flags override file values.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::shared::Result;

const CONFIG_FILENAME: &str = "deptrace.config.yml";

/// Default number of repository-query worker threads.
pub const DEFAULT_THREADS: usize = 3;
/// Default per-query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Target repository name for checksum queries.
    pub repository: Option<String>,
    /// Artifact server base URL.
    pub server_url: Option<String>,
    /// Access token for the artifact server.
    pub access_token: Option<String>,
    /// Worker threads for repository queries.
    pub threads: Option<usize>,
    /// Per-query timeout in seconds.
    pub query_timeout_secs: Option<u64>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if config.threads == Some(0) {
        bail!("Invalid config: threads must be at least 1.");
    }
    if config.query_timeout_secs == Some(0) {
        bail!("Invalid config: query_timeout_secs must be at least 1.");
    }
    if let Some(url) = &config.server_url {
        if url.trim().is_empty() {
            bail!("Invalid config: server_url must not be empty.");
        }
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        log::warn!("Unknown config field '{}' will be ignored.", key);
    }
}
