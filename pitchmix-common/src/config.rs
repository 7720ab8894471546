//! Configuration loading and API base URL resolution

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Environment variable carrying the analytics API base URL
pub const API_URL_ENV_VAR: &str = "PITCHMIX_API_URL";

/// Compiled default when no configuration source provides a base URL
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// TOML configuration file schema (`~/.config/pitchmix/config.toml`)
///
/// All fields optional; a missing or unparsable file falls back to defaults
/// rather than aborting startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Analytics API base URL, e.g. "http://127.0.0.1:8000"
    pub api_base_url: Option<String>,
    /// Log level override ("trace".."error")
    pub log_level: Option<String>,
}

/// Resolve the analytics API base URL by priority:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable `PITCHMIX_API_URL`
/// 3. TOML config file
/// 4. Compiled default (fallback)
///
/// Trailing slashes are trimmed so path joining stays uniform.
pub fn resolve_api_base_url(cli_arg: Option<&str>) -> String {
    // Priority 1: Command-line argument
    if let Some(url) = cli_arg {
        debug!("API base URL from command line: {}", url);
        return normalize_base_url(url);
    }

    // Priority 2: Environment variable
    if let Ok(url) = std::env::var(API_URL_ENV_VAR) {
        if !url.trim().is_empty() {
            debug!("API base URL from {}: {}", API_URL_ENV_VAR, url);
            return normalize_base_url(&url);
        }
    }

    // Priority 3: TOML config file
    match load_toml_config() {
        Ok(config) => {
            if let Some(url) = config.api_base_url {
                debug!("API base URL from config file: {}", url);
                return normalize_base_url(&url);
            }
        }
        Err(Error::NotFound(_)) => {}
        Err(e) => {
            warn!("Ignoring unreadable config file: {}", e);
        }
    }

    // Priority 4: Compiled default
    debug!("API base URL defaulting to {}", DEFAULT_API_BASE_URL);
    DEFAULT_API_BASE_URL.to_string()
}

/// Load the TOML config file if one exists
///
/// Returns `Error::NotFound` when no file is present (a normal condition),
/// `Error::Config` when a file exists but cannot be read or parsed.
pub fn load_toml_config() -> Result<TomlConfig> {
    let path = config_file_path()?;
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read config failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse config failed: {}", e)))
}

/// Parse TOML config from an explicit path (used by tests and `--config`)
pub fn load_toml_config_from(path: &std::path::Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read config failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse config failed: {}", e)))
}

/// Platform config file path: `<config_dir>/pitchmix/config.toml`
fn config_file_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("pitchmix").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
