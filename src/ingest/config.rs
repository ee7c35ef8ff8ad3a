// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "DEMOCRACY_CONFIG_PATH";
pub const ENV_PROPUBLICA_KEY: &str = "PROPUBLICA_API_KEY";
pub const ENV_OPENSTATES_KEY: &str = "OPENSTATES_API_KEY";

pub const DEFAULT_DATA_PATH: &str = "data/events.json";
pub const DEFAULT_WEIGHTS_PATH: &str = "config/weights.json";

/// Ingest + serving configuration. Every field has a default, so an empty
/// or missing file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub refresh_interval_secs: u64,
    pub http_timeout_secs: u64,
    pub data_path: PathBuf,
    pub weights_path: PathBuf,
    pub propublica: SourceCfg,
    pub openstates: SourceCfg,
    pub courtlistener: SourceCfg,
    pub gdelt: SourceCfg,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 3600,
            http_timeout_secs: 20,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            propublica: SourceCfg::default(),
            openstates: SourceCfg::default(),
            courtlistener: SourceCfg::default(),
            gdelt: SourceCfg::default(),
        }
    }
}

/// Per-source switches. `url` / `keywords` fall back to the provider's built-ins.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceCfg {
    pub enabled: bool,
    pub url: Option<String>,
    pub keywords: Option<Vec<String>>,
}

impl Default for SourceCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            keywords: None,
        }
    }
}

impl SourceCfg {
    pub fn url_or(&self, default: &str) -> String {
        self.url.clone().unwrap_or_else(|| default.to_string())
    }
}

/// API keys for sources that need them; read from the environment only.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub propublica: Option<String>,
    pub openstates: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            propublica: read(ENV_PROPUBLICA_KEY),
            openstates: read(ENV_OPENSTATES_KEY),
        }
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<IngestConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading ingest config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing ingest config {}", path.display()))
}

/// Load config using env var + fallbacks:
/// 1) $DEMOCRACY_CONFIG_PATH
/// 2) config/ingest.toml
/// 3) config/ingest.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<IngestConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/ingest.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/ingest.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(IngestConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<IngestConfig> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    match toml::from_str::<IngestConfig>(s) {
        Ok(cfg) => Ok(cfg),
        Err(toml_err) => serde_json::from_str(s)
            .map_err(|_| anyhow!("unsupported config format: {toml_err}")),
    }
}
