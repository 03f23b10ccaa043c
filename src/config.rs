use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Comment to open on start instead of a random one.
    #[serde(default)]
    pub start_comment: Option<String>,
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_api_base_url() -> String {
    "https://pubpeerclassifierapi.onrender.com".to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_log_file() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("peerclass")
        .join("peerclass.log")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            theme: default_theme(),
            start_comment: None,
            log_file: default_log_file(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// A missing file means defaults; an unreadable or malformed one is an
    /// error naming the path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("peerclass")
            .join("config.toml")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Treat a blank start comment as "random".
    pub fn normalize(&mut self) {
        if self
            .start_comment
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            self.start_comment = None;
        }
        if self.api_base_url.trim().is_empty() {
            self.api_base_url = default_api_base_url();
        }
    }
}
