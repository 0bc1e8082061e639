//! Configuration schema for deltagen
//!
//! Configuration is stored at `~/.config/deltagen/config.toml`

use crate::config::ConfigManager;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External tool settings
    pub tools: ToolsConfig,

    /// Cache store settings
    pub cache: CacheConfig,

    /// Build pipeline defaults
    pub build: BuildConfig,
}

impl Config {
    /// Directory holding the external unpack/diff tools
    pub fn tools_dir(&self) -> PathBuf {
        self.tools
            .dir
            .clone()
            .unwrap_or_else(|| ConfigManager::state_dir().join("tools"))
    }

    /// Root directory of the content cache
    pub fn cache_root(&self) -> PathBuf {
        self.cache
            .root
            .clone()
            .unwrap_or_else(ConfigManager::cache_dir)
    }

    /// Root directory under which per-build workspaces are allocated
    pub fn workspace_root(&self) -> PathBuf {
        self.build
            .workspace_root
            .clone()
            .unwrap_or_else(ConfigManager::work_dir)
    }
}

/// External tool settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Directory containing mar, mbsdiff and the unwrap/diff scripts
    /// (defaults to the state directory's tools/ subdirectory)
    pub dir: Option<PathBuf>,
}

/// Cache store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory (defaults to the state directory's cache/)
    pub root: Option<PathBuf>,
}

/// Build pipeline defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Update channel identifier passed to the tools
    pub channel_id: String,

    /// Product version passed to the tools
    pub product_version: String,

    /// Where per-build workspaces are allocated
    pub workspace_root: Option<PathBuf>,

    /// Keep the workspace of a failed build for diagnosis
    pub keep_failed_workspaces: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            channel_id: "nightly".to_string(),
            product_version: "0.0".to_string(),
            workspace_root: None,
            keep_failed_workspaces: true,
        }
    }
}
