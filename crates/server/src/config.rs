use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use gorev_core::{LanguageSetting, StorageMode, WatcherConfig, WorkspaceRegistry};
use gorev_mcp::Dispatcher;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::websocket::HubHandle;

/// Directory under the home directory holding the lock file, config and shared database
pub const DAEMON_DIR: &str = ".gorev-daemon";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModeSetting {
    #[default]
    Local,
    Centralized,
}

impl std::str::FromStr for ModeSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "centralized" => Ok(Self::Centralized),
            other => Err(format!("invalid mode '{}' (expected local or centralized)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub host: String,
    pub port: u16,
    pub mode: ModeSetting,
    /// Shared database file, only used in centralized mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
    pub shutdown_timeout_secs: u64,
    pub workspaces: WorkspacesConfig,
    pub websocket: WebSocketConfig,
    pub watcher: FileWatcherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspacesConfig {
    pub max_idle_secs: u64,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Capacity of the hub's inbound event queue
    pub event_buffer: usize,
    /// Capacity of each subscriber's outbound queue
    pub subscriber_buffer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWatcherConfig {
    /// Turn `gorev_file_watch` paths into live task updates
    pub enabled: bool,
    pub debounce_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: gorev_client::DEFAULT_PORT,
            mode: ModeSetting::Local,
            db_path: None,
            shutdown_timeout_secs: 30,
            workspaces: WorkspacesConfig::default(),
            websocket: WebSocketConfig::default(),
            watcher: FileWatcherConfig::default(),
        }
    }
}

impl Default for FileWatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 500,
        }
    }
}

impl Default for WorkspacesConfig {
    fn default() -> Self {
        Self {
            max_idle_secs: 86_400,
            cleanup_interval_secs: 600,
        }
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            event_buffer: 256,
            subscriber_buffer: 256,
        }
    }
}

impl DaemonConfig {
    /// Defaults overlaid with the config file and the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    tracing::debug!("No configuration file, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))
    }

    /// `GOREV_API_PORT`, `GOREV_MODE` and `GOREV_DB_PATH` overrides.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("GOREV_API_PORT").filter(|v| !v.trim().is_empty()) {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid GOREV_API_PORT '{}'", port))?;
        }
        if let Some(mode) = lookup("GOREV_MODE").filter(|v| !v.trim().is_empty()) {
            self.mode = mode.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(db_path) = lookup("GOREV_DB_PATH").filter(|v| !v.trim().is_empty()) {
            self.db_path = Some(PathBuf::from(db_path));
        }
        Ok(())
    }

    /// The daemon only ever listens on loopback.
    pub fn validate(&self) -> Result<()> {
        let loopback = self.host == "localhost"
            || self
                .host
                .parse::<IpAddr>()
                .map(|ip| ip.is_loopback())
                .unwrap_or(false);
        if !loopback {
            bail!("host '{}' is not a loopback address", self.host);
        }
        if self.websocket.event_buffer == 0 || self.websocket.subscriber_buffer == 0 {
            bail!("websocket buffers must be greater than zero");
        }
        if self.workspaces.cleanup_interval_secs == 0 {
            bail!("workspaces.cleanup_interval_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn storage_mode(&self) -> Result<StorageMode> {
        Ok(match self.mode {
            ModeSetting::Local => StorageMode::Local,
            ModeSetting::Centralized => {
                let db_path = match &self.db_path {
                    Some(path) => path.clone(),
                    None => daemon_dir()?.join("gorev.db"),
                };
                StorageMode::Centralized { db_path }
            }
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_idle(&self) -> Duration {
        Duration::from_secs(self.workspaces.max_idle_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.workspaces.cleanup_interval_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn file_watcher(&self) -> Option<WatcherConfig> {
        self.watcher.enabled.then(|| WatcherConfig {
            debounce: Duration::from_millis(self.watcher.debounce_ms),
        })
    }
}

pub fn daemon_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home.join(DAEMON_DIR))
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DAEMON_DIR).join(CONFIG_FILE))
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<WorkspaceRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub hub: HubHandle,
    pub lang: Arc<LanguageSetting>,
    pub started_at: DateTime<Utc>,
    started: Instant,
}

impl AppState {
    pub fn new(
        registry: Arc<WorkspaceRegistry>,
        dispatcher: Arc<Dispatcher>,
        hub: HubHandle,
    ) -> Self {
        Self {
            lang: registry.language().clone(),
            registry,
            dispatcher,
            hub,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}
