//! Host configuration helpers.
//!
//! The core itself is configuration-free; these settings only shape how the
//! `casework` host reaches the case service and what it logs.
use crate::profile::ProfileMethodology;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const CONFIG_ENV: &str = "CASEWORK_CONFIG";
pub const BASE_URL_ENV: &str = "CASEWORK_BASE_URL";
const CONFIG_DIR_NAME: &str = "casework";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CaseworkConfig {
    pub schema_version: u32,
    pub base_url: String,
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub default_methodology: ProfileMethodology,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl CaseworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Build the default config used when no file is present.
pub fn default_config() -> CaseworkConfig {
    CaseworkConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        base_url: "http://127.0.0.1:3000".to_string(),
        request_timeout_ms: 15_000,
        default_methodology: ProfileMethodology::default(),
        log_filter: None,
    }
}

/// Render a pretty JSON config stub.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&default_config()).context("serialize config stub")
}

/// Platform config location (`<config dir>/casework/config.json`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Where to read config from, and whether the file must exist.
///
/// Precedence: explicit path, then `CASEWORK_CONFIG`, then the platform path.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    platform_path: Option<PathBuf>,
) -> Option<(PathBuf, bool)> {
    if let Some(path) = explicit {
        return Some((path.to_path_buf(), true));
    }
    if let Some(path) = env_path.filter(|path| !path.as_os_str().is_empty()) {
        return Some((path, true));
    }
    platform_path.map(|path| (path, false))
}

pub fn load_config(path: &Path) -> Result<CaseworkConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: CaseworkConfig =
        serde_json::from_slice(&bytes).context("parse casework config JSON")?;
    Ok(config)
}

/// Persist a config to disk in a stable JSON format.
pub fn write_config(path: &Path, config: &CaseworkConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize casework config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn validate_config(config: &CaseworkConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported casework config schema_version {}",
            config.schema_version
        ));
    }
    let base_url = config.base_url.trim();
    if base_url.is_empty() {
        return Err(anyhow!("base_url must be non-empty"));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(anyhow!(
            "base_url must start with http:// or https:// (got {base_url:?})"
        ));
    }
    if config.request_timeout_ms == 0 {
        return Err(anyhow!("request_timeout_ms must be greater than zero"));
    }
    if let Some(filter) = config.log_filter.as_deref() {
        if filter.trim().is_empty() {
            return Err(anyhow!("log_filter must be non-empty when set"));
        }
    }
    Ok(())
}

/// Load, apply the base URL override, and validate.
///
/// A missing platform config file falls back to defaults; a missing explicit
/// or `CASEWORK_CONFIG` file is an error.
pub fn load_effective_config(
    source: Option<(PathBuf, bool)>,
    base_url_override: Option<String>,
) -> Result<CaseworkConfig> {
    let mut config = match source {
        Some((path, required)) if required || path.is_file() => {
            let config = load_config(&path)?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        _ => default_config(),
    };
    if let Some(base_url) = base_url_override
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        config.base_url = base_url;
    }
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
