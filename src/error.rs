//! Error types for deltagen
//!
//! All modules use `DeltagenResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for deltagen operations
pub type DeltagenResult<T> = Result<T, DeltagenError>;

/// All errors that can occur in deltagen
#[derive(Error, Debug)]
pub enum DeltagenError {
    // Fetch errors
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Hash mismatch for {url}: expected {expected}, got {actual}")]
    HashMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    // Cache errors
    #[error("Cache miss: no {category} entry for key {key}")]
    CacheMiss { key: String, category: String },

    #[error("Cache store failure for key {key}: {reason}")]
    CacheStore { key: String, reason: String },

    // Workspace errors
    #[error("Workspace error at {path}: {reason}")]
    Workspace { path: PathBuf, reason: String },

    // Tool errors
    #[error("Tool {tool} exited with code {code}: {stderr}")]
    ToolExecution {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("Tool {tool} terminated by signal")]
    ToolSignaled { tool: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(PathBuf),

    #[error("Failed to spawn {tool}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tool {tool} exited successfully but produced no output at {path}")]
    ToolOutputMissing { tool: String, path: PathBuf },

    // Build errors
    #[error("Build cancelled")]
    Cancelled,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeltagenError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a fetch error
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a cache miss error
    pub fn cache_miss(key: impl Into<String>, category: impl Into<String>) -> Self {
        Self::CacheMiss {
            key: key.into(),
            category: category.into(),
        }
    }

    /// Create a workspace error
    pub fn workspace(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Workspace {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a cache miss (an expected "not yet built"
    /// signal rather than a failure of the system itself)
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::CacheMiss { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ToolNotFound(_) => Some("Check tools.dir in config.toml"),
            Self::HashMismatch { .. } => Some("Verify the expected hash, or re-publish the artifact"),
            _ => None,
        }
    }
}
