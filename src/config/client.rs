// src/config/client.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const ENV_CONFIG_PATH: &str = "COUPON_FEED_CONFIG";
pub const ENV_TOKEN: &str = "MCD_MCP_TOKEN";
pub const ENV_ENDPOINT: &str = "MCD_MCP_ENDPOINT";

pub const DEFAULT_ENDPOINT: &str = "https://mcp.mcd.cn/mcp-servers/mcd-mcp";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_freshness_secs() -> u64 {
    300
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_connect_timeout_secs() -> u64 {
    4
}
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer token. "ENV" means: read from MCD_MCP_TOKEN.
    #[serde(default)]
    pub api_key: String,
    /// Cache entries younger than this are served without a tool call.
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            freshness_secs: default_freshness_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl ClientConfig {
    /// Load from an explicit path. TOML or JSON, chosen by extension then content.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading client config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mut cfg = parse_config(&content, ext.as_str())?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Env var + fallbacks:
    /// 1) $COUPON_FEED_CONFIG
    /// 2) config/client.toml
    /// 3) config/client.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for candidate in ["config/client.toml", "config/client.json"] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        let mut cfg = Self::default();
        cfg.apply_env();
        Ok(cfg)
    }

    /// Resolve `api_key = "ENV"` and apply MCD_MCP_TOKEN / MCD_MCP_ENDPOINT overrides.
    /// A missing token is left empty; the tool client reports it on first use.
    fn apply_env(&mut self) {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key.clear();
        }
        if let Ok(token) = env::var(ENV_TOKEN) {
            if !token.trim().is_empty() {
                self.api_key = token.trim().to_string();
            }
        }
        if let Ok(endpoint) = env::var(ENV_ENDPOINT) {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint.trim().to_string();
            }
        }
        if self.freshness_secs == 0 {
            self.freshness_secs = default_freshness_secs();
        }
    }

    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<ClientConfig> {
    let looks_json = s.trim_start().starts_with('{');
    if hint_ext == "json" || (hint_ext != "toml" && looks_json) {
        return serde_json::from_str(s).context("parsing client config as JSON");
    }
    toml::from_str(s).context("parsing client config as TOML")
}
