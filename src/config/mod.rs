//! Configuration management for deltagen

pub mod schema;

pub use schema::Config;

use crate::error::{DeltagenError, DeltagenResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deltagen")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deltagen")
    }

    /// Get the default cache root
    pub fn cache_dir() -> PathBuf {
        Self::state_dir().join("cache")
    }

    /// Get the default workspace root
    pub fn work_dir() -> PathBuf {
        Self::state_dir().join("work")
    }

    /// Load configuration, creating default if not exists
    pub async fn load(&self) -> DeltagenResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> DeltagenResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| DeltagenError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| DeltagenError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> DeltagenResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            DeltagenError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> DeltagenResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DeltagenError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure the state directories for a given config exist
    pub async fn ensure_state_dirs(config: &Config) -> DeltagenResult<()> {
        let dirs = [config.cache_root(), config.workspace_root()];

        for dir in &dirs {
            fs::create_dir_all(dir).await.map_err(|e| {
                DeltagenError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }

        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
