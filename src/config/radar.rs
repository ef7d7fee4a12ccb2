// src/config/radar.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::error::RadarError;

pub const ENV_RADAR_CONFIG_PATH: &str = "RADAR_CONFIG_PATH";
pub const DEFAULT_RADAR_CONFIG_PATH: &str = "config/radar.toml";
pub const ENV_ORACLE_MODEL: &str = "GROQ_MODEL";

pub const DEFAULT_SITES: &[&str] = &[
    "https://www.seneweb.com",
    "https://www.dakaractu.com",
    "https://www.xalaattv.net",
    "https://www.pressafrik.com",
    "https://www.senenews.com",
    "https://www.leral.net",
    "http://www.aps.sn",
    "https://www.lequotidien.sn",
    "https://www.sudquotidien.sn",
    "https://www.lobservateur.sn",
];

fn default_sites() -> Vec<String> {
    DEFAULT_SITES.iter().map(|s| s.to_string()).collect()
}
fn default_per_site_limit() -> usize {
    10
}
fn default_global_limit() -> usize {
    30
}
fn default_feed_entry_scan() -> usize {
    20
}
fn default_site_delay_ms() -> u64 {
    300
}
fn default_feed_timeout_secs() -> u64 {
    5
}
fn default_html_timeout_secs() -> u64 {
    8
}
fn default_cache_ttl_secs() -> u64 {
    600
}

/// Pipeline settings. Every field has a default, so an empty TOML file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RadarConfig {
    /// News site roots, visited in order.
    #[serde(default = "default_sites")]
    pub sites: Vec<String>,
    #[serde(default = "default_per_site_limit")]
    pub per_site_limit: usize,
    #[serde(default = "default_global_limit")]
    pub global_limit: usize,
    /// Feed entries examined per site before filtering.
    #[serde(default = "default_feed_entry_scan")]
    pub feed_entry_scan: usize,
    #[serde(default = "default_site_delay_ms")]
    pub site_delay_ms: u64,
    #[serde(default = "default_feed_timeout_secs")]
    pub feed_timeout_secs: u64,
    #[serde(default = "default_html_timeout_secs")]
    pub html_timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub oracle: OracleConfig,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            sites: default_sites(),
            per_site_limit: default_per_site_limit(),
            global_limit: default_global_limit(),
            feed_entry_scan: default_feed_entry_scan(),
            site_delay_ms: default_site_delay_ms(),
            feed_timeout_secs: default_feed_timeout_secs(),
            html_timeout_secs: default_html_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            oracle: OracleConfig::default(),
        }
    }
}

impl RadarConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading radar config from {}", path.display()))?;
        let mut cfg: RadarConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// 1) $RADAR_CONFIG_PATH (must exist)
    /// 2) config/radar.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_RADAR_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("RADAR_CONFIG_PATH points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_RADAR_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        let mut cfg = Self::default();
        cfg.sanitize();
        Ok(cfg)
    }

    fn sanitize(&mut self) {
        self.sites = self
            .sites
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if self.per_site_limit == 0 {
            self.per_site_limit = default_per_site_limit();
        }
        if self.global_limit == 0 {
            self.global_limit = default_global_limit();
        }
        if let Ok(model) = env::var(ENV_ORACLE_MODEL) {
            if !model.trim().is_empty() {
                self.oracle.model = model.trim().to_string();
            }
        }
    }

    pub fn site_delay(&self) -> Duration {
        Duration::from_millis(self.site_delay_ms)
    }
    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }
    pub fn html_timeout(&self) -> Duration {
        Duration::from_secs(self.html_timeout_secs)
    }
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}
fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_oracle_timeout_secs() -> u64 {
    120
}

/// Chat-completions oracle settings. The key itself never lives in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OracleConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_oracle_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_oracle_timeout_secs(),
        }
    }
}

impl OracleConfig {
    /// Read the credential from the environment.
    pub fn resolve_api_key(&self) -> Result<String, RadarError> {
        match env::var(&self.api_key_env) {
            Ok(k) if !k.trim().is_empty() => Ok(k.trim().to_string()),
            _ => Err(RadarError::Configuration(format!(
                "{} is missing: set it in .env or in the process environment",
                self.api_key_env
            ))),
        }
    }
}
