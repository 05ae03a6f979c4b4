//! Application configuration management.
//!
//! `Config` is the user-editable file stored at
//! `~/.config/sugarnail/config.json`. `WorkerConfig` is the validated subset
//! injected into a worker at construction; the cache version in particular is
//! never global state.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::booking::DEFAULT_ADMIN_NUMBER;
use crate::net::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::net::RequestKey;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "sugarnail";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_ORIGIN: &str = "http://localhost:8080/";

/// Current asset set. Bump whenever the asset manifest changes.
pub const DEFAULT_CACHE_VERSION: &str = "sugar-nail-art-v2";

pub const DEFAULT_OFFLINE_FALLBACK: &str = "/offline.html";

pub const ORIGIN_ENV: &str = "SUGARNAIL_ORIGIN";
pub const CACHE_VERSION_ENV: &str = "SUGARNAIL_CACHE_VERSION";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub origin: String,
    pub cache_version: String,
    pub offline_fallback: String,
    pub skip_waiting: bool,
    pub request_timeout_secs: u64,
    pub admin_number: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            offline_fallback: DEFAULT_OFFLINE_FALLBACK.to_string(),
            skip_waiting: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            admin_number: DEFAULT_ADMIN_NUMBER.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
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

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Root of the offline asset cache.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Directory holding cart and order history.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join("storage"))
    }

    /// Apply `SUGARNAIL_ORIGIN` / `SUGARNAIL_CACHE_VERSION` from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ORIGIN_ENV).ok(),
            std::env::var(CACHE_VERSION_ENV).ok(),
        )
    }

    fn with_overrides(mut self, origin: Option<String>, cache_version: Option<String>) -> Self {
        if let Some(origin) = origin.filter(|s| !s.trim().is_empty()) {
            self.origin = origin;
        }
        if let Some(version) = cache_version.filter(|s| !s.trim().is_empty()) {
            self.cache_version = version;
        }
        self
    }

    pub fn worker_config(&self) -> Result<WorkerConfig> {
        let origin = Url::parse(&self.origin)
            .with_context(|| format!("Invalid origin in config: {}", self.origin))?;
        let version = CacheVersion::new(&self.cache_version)?;
        if !self.offline_fallback.starts_with('/') {
            anyhow::bail!(
                "Offline fallback must be an absolute path, got {:?}",
                self.offline_fallback
            );
        }

        Ok(WorkerConfig::new(origin, version)
            .with_offline_fallback(self.offline_fallback.as_str())
            .with_skip_waiting(self.skip_waiting)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs)))
    }
}

/// Name of a cache generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheVersion(String);

impl CacheVersion {
    pub fn new(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Cache version must not be empty");
        }
        if name.starts_with('.') || name.contains(['/', '\\']) {
            anyhow::bail!("Cache version {:?} must not start with '.' or contain path separators", name);
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CacheVersion {
    fn default() -> Self {
        Self(DEFAULT_CACHE_VERSION.to_string())
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Settings a worker is built with.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Origin the page shell is served from. Manifest paths resolve against it.
    pub origin: Url,
    pub version: CacheVersion,
    pub offline_fallback: RequestKey,
    /// Activate right after install instead of waiting for old pages to close.
    pub skip_waiting: bool,
    pub request_timeout: Duration,
}

impl WorkerConfig {
    pub fn new(origin: Url, version: CacheVersion) -> Self {
        Self {
            origin,
            version,
            offline_fallback: RequestKey::from(DEFAULT_OFFLINE_FALLBACK),
            skip_waiting: true,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_offline_fallback(mut self, path: &str) -> Self {
        self.offline_fallback = RequestKey::from(path);
        self
    }

    pub fn with_skip_waiting(mut self, skip_waiting: bool) -> Self {
        self.skip_waiting = skip_waiting;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
