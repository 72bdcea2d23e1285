use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use sure_api::client::DEFAULT_TIMEOUT;
use sure_api::{ClientConfig, Credential};
use sure_core::{CliError, ErrorCode};

use crate::state;

/// `~/.sure-cli/config.toml`, every key optional:
///
/// ```toml
/// api_url = "https://sure.example.com"
/// api_key = "..."        # or: token = "..."
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub fn load_config() -> Result<Config> {
    let p = state::config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    read_config(&p)
}

pub fn read_config(path: &Path) -> Result<Config> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

impl Config {
    /// Environment wins over the file: SURE_API_URL, SURE_API_KEY, SURE_TOKEN.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty("SURE_API_URL") {
            self.api_url = Some(v);
        }
        if let Some(v) = non_empty("SURE_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = non_empty("SURE_TOKEN") {
            self.token = Some(v);
        }
        self
    }

    /// `--api-url` wins over everything
    pub fn with_api_url(mut self, api_url: Option<&str>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = Some(url.to_string());
        }
        self
    }

    /// Resolve into a client config. An API key is preferred over a bearer token.
    pub fn client_config(&self) -> Result<ClientConfig, CliError> {
        let api_url = present(&self.api_url).ok_or_else(|| {
            CliError::new(
                ErrorCode::ConfigMissing,
                "api_url is not configured (set SURE_API_URL or api_url in ~/.sure-cli/config.toml)",
            )
        })?;
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(CliError::new(
                ErrorCode::ConfigInvalid,
                format!("api_url must start with http:// or https:// (got {api_url})"),
            ));
        }

        let credential = match (present(&self.api_key), present(&self.token)) {
            (Some(key), _) => Credential::ApiKey(key.to_string()),
            (None, Some(token)) => Credential::Bearer(token.to_string()),
            (None, None) => {
                return Err(CliError::new(
                    ErrorCode::AuthRequired,
                    "no credentials configured (set SURE_API_KEY or SURE_TOKEN)",
                ));
            }
        };

        let timeout = self
            .timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(ClientConfig::new(api_url, credential).with_timeout(timeout))
    }
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
