//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tgscrape_core::sink::DEFAULT_GZIP_LEVEL;
use tgscrape_core::window::DEFAULT_MAX_SLEEP;
use tgscrape_telegram::TelegramConfig;
use tgscrape_telegram::config::{
    DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_BACKOFF, DEFAULT_MAX_RETRIES,
    DEFAULT_READ_TIMEOUT, DEFAULT_USER_AGENT,
};

/// Global configuration for tgscrape
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub harvest: HarvestConfig,
    pub telegram: TelegramSection,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_dir: PathBuf,
    /// Gzip level for Parquet pages (0-10)
    pub compression_level: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("."),
            compression_level: DEFAULT_GZIP_LEVEL,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Ceiling of the random delay after each accepted post, in seconds
    pub max_sleep: f64,
    /// Keep post contents; `false` stores the redaction marker instead
    pub verbose: bool,
    /// Consecutive posts older than the window needed to stop
    pub stop_after: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_sleep: DEFAULT_MAX_SLEEP,
            verbose: true,
            stop_after: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Seconds without a response before a request counts as stalled
    pub read_timeout: u64,
    pub connect_timeout: u64,
    pub max_retries: u32,
    /// Longest single wait between retries, in seconds
    pub max_backoff: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT.as_secs(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT.as_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
            max_backoff: DEFAULT_MAX_BACKOFF.as_secs(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./tgscrape.toml (current directory)
    /// 2. ~/.config/tgscrape/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("tgscrape.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "tgscrape") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Override HTTP settings from the command line
    pub fn with_http_overrides(mut self, read_timeout: Option<u64>, max_retries: Option<u32>) -> Self {
        if let Some(secs) = read_timeout {
            self.http.read_timeout = secs;
        }
        if let Some(n) = max_retries {
            self.http.max_retries = n;
        }
        self
    }

    /// Settings for the web preview client
    pub fn telegram_config(&self) -> TelegramConfig {
        TelegramConfig {
            base_url: self.telegram.base_url.clone(),
            user_agent: self.telegram.user_agent.clone(),
            read_timeout: Duration::from_secs(self.http.read_timeout),
            connect_timeout: Duration::from_secs(self.http.connect_timeout),
            max_retries: self.http.max_retries,
            max_backoff: Duration::from_secs(self.http.max_backoff),
            ..TelegramConfig::default()
        }
    }
}
