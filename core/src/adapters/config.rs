//! JSON file persistence for favorites, watched ports and settings.
//!
//! Stored at `~/.portwatch/config.json`:
//!
//! ```json
//! {
//!   "favorites": [3000, 8080],
//!   "watchedPorts": [
//!     { "id": "…uuid…", "port": 5432, "notifyOnStart": true, "notifyOnStop": false }
//!   ],
//!   "refreshInterval": 5
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::WatchedPort;
use crate::error::{Error, Result};
use crate::ports::ConfigRepository;

/// Default scan interval in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;

/// On-disk configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Favorite port numbers, kept sorted.
    #[serde(default)]
    pub favorites: Vec<u16>,

    #[serde(default, rename = "watchedPorts")]
    pub watched_ports: Vec<WatchedPort>,

    /// Port scan refresh interval in seconds.
    #[serde(default = "default_refresh_interval", rename = "refreshInterval")]
    pub refresh_interval: u64,
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            favorites: Vec::new(),
            watched_ports: Vec::new(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

/// File-backed [`ConfigRepository`].
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Config store at the default path, `~/.portwatch/config.json`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".portwatch").join("config.json"),
        })
    }

    /// Config store with a custom path.
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk. A missing file yields the defaults.
    pub async fn load(&self) -> Result<Config> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration atomically (temp file, fsync, rename).
    pub async fn save(&self, config: &Config) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        debug!(path = %self.config_path.display(), "Saved config");
        Ok(())
    }

    async fn update(&self, apply: impl FnOnce(&mut Config)) -> Result<()> {
        let mut config = self.load().await?;
        apply(&mut config);
        self.save(&config).await
    }
}

impl ConfigRepository for ConfigStore {
    async fn get_favorites(&self) -> Result<HashSet<u16>> {
        Ok(self.load().await?.favorites.into_iter().collect())
    }

    async fn set_favorites(&self, favorites: &HashSet<u16>) -> Result<()> {
        let mut sorted: Vec<u16> = favorites.iter().copied().collect();
        sorted.sort_unstable();
        self.update(move |config| config.favorites = sorted).await
    }

    async fn get_watched_ports(&self) -> Result<Vec<WatchedPort>> {
        Ok(self.load().await?.watched_ports)
    }

    async fn set_watched_ports(&self, watched: &[WatchedPort]) -> Result<()> {
        let watched = watched.to_vec();
        self.update(move |config| config.watched_ports = watched).await
    }

    async fn get_refresh_interval(&self) -> Result<u64> {
        Ok(self.load().await?.refresh_interval)
    }

    async fn set_refresh_interval(&self, interval: u64) -> Result<()> {
        self.update(move |config| config.refresh_interval = interval)
            .await
    }
}
