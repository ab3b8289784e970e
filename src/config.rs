//! Application configuration management.
//!
//! This module handles loading and saving the client configuration,
//! which covers the service base URL, an optional cache directory
//! override, and the last used username for login prefill.
//!
//! Configuration is stored at `~/.config/callsheet/config.json`; the
//! `CALLSHEET_API_BASE_URL` and `CALLSHEET_CACHE_DIR` environment
//! variables (or a `.env` file) override the stored values.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "callsheet";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default service base URL when neither config nor environment set one
const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Environment variable overriding the service base URL
const ENV_BASE_URL: &str = "CALLSHEET_API_BASE_URL";

/// Environment variable overriding the cache directory
const ENV_CACHE_DIR: &str = "CALLSHEET_CACHE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub cache_dir: Option<PathBuf>,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: None,
            last_username: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment variable overrides on top of the stored values
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(dir) = std::env::var(ENV_CACHE_DIR) {
            if !dir.is_empty() {
                self.cache_dir = Some(PathBuf::from(dir));
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the durable session record and offline cache
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
