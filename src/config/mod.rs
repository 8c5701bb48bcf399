//! Configuration management for Deck GW
//!
//! YAML file with every field defaulted; a missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub obs: ObsConfig,
    pub sessions: SessionConfig,
    pub hub: HubConfig,
    pub storage: StorageConfig,
    /// Create the starter buttons and layout when no configuration exists
    pub seed_defaults: bool,
}

/// HTTP listener
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// OBS WebSocket configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObsConfig {
    /// `host`, `host:port` or `ws://host:port`
    #[serde(default = "default_obs_url")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_true")]
    pub auto_connect: bool,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HubConfig {
    /// Messages buffered per watcher before it is dropped
    #[serde(default = "default_watcher_queue")]
    pub watcher_queue: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sled,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Overrides the detected data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            obs: ObsConfig::default(),
            sessions: SessionConfig::default(),
            hub: HubConfig::default(),
            storage: StorageConfig::default(),
            seed_defaults: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            url: default_obs_url(),
            password: None,
            auto_connect: true,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            watcher_queue: default_watcher_queue(),
        }
    }
}

impl ObsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl AppConfig {
    /// Load configuration from a YAML file, or defaults if it does not exist
    pub async fn load(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port cannot be 0");
        }
        if self.server.host.trim().is_empty() {
            anyhow::bail!("server.host cannot be empty");
        }
        if self.obs.url.trim().is_empty() {
            anyhow::bail!("obs.url cannot be empty");
        }
        if self.obs.request_timeout_ms == 0 {
            anyhow::bail!("obs.request_timeout_ms must be greater than 0");
        }
        if self.sessions.idle_timeout_secs == 0 {
            anyhow::bail!("sessions.idle_timeout_secs must be greater than 0");
        }
        if self.sessions.sweep_interval_secs == 0 {
            anyhow::bail!("sessions.sweep_interval_secs must be greater than 0");
        }
        if self.hub.watcher_queue == 0 {
            anyhow::bail!("hub.watcher_queue must be greater than 0");
        }
        Ok(())
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { crate::api::DEFAULT_API_PORT }
fn default_obs_url() -> String { format!("localhost:{}", crate::obs::DEFAULT_PORT) }
fn default_true() -> bool { true }
fn default_request_timeout_ms() -> u64 { 5_000 }
fn default_idle_timeout_secs() -> u64 { 30 * 60 }
fn default_sweep_interval_secs() -> u64 { 5 * 60 }
fn default_watcher_queue() -> usize { 256 }
