//! # Configuration Loading
//!
//! TOML configuration for the dashboard. Everything has a default; running
//! with no config file at all talks to `http://localhost:8000`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Root configuration schema.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashConfig {
    #[serde(default)]
    pub backend: BackendInfo,
    #[serde(default)]
    pub data: DataInfo,
}

/// Routing backend endpoint settings.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendInfo {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BackendInfo {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Where decision payloads come from.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DataInfo {
    #[serde(default)]
    pub source: SourceKind,

    /// JSONL decision log, required when `source = "file"`.
    pub decisions_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Http,
    File,
}

impl DashConfig {
    /// Load configuration from `path`. A missing file yields the defaults;
    /// a present but malformed file is an error naming the path.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }

        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("could not read config file {}: {}", path, e))?;

        toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("failed to parse config {}: {}", path, e))
    }
}
