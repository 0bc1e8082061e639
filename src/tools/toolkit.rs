//! External tool discovery and environment contract
//!
//! The pipeline drives four external programs living in one tools
//! directory: the low-level `mar` archiver, the `mbsdiff` binary differ,
//! and the unwrap/make-incremental wrapper scripts that orchestrate them.

use crate::error::{DeltagenError, DeltagenResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Paths to the external tools under one directory
#[derive(Debug, Clone)]
pub struct Toolkit {
    dir: PathBuf,
    mar: PathBuf,
    mbsdiff: PathBuf,
    unwrap: PathBuf,
    make_incremental: PathBuf,
}

impl Toolkit {
    /// Resolve tool paths under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            mar: dir.join("mar"),
            mbsdiff: dir.join("mbsdiff"),
            unwrap: dir.join("unwrap_full_update.pl"),
            make_incremental: dir.join("make_incremental_update.sh"),
            dir,
        }
    }

    /// The tools directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The unpack tool (extracts a complete artifact into the cwd)
    pub fn unwrap_tool(&self) -> &Path {
        &self.unwrap
    }

    /// The diff tool (produces a partial artifact from two unpacked trees)
    pub fn diff_tool(&self) -> &Path {
        &self.make_incremental
    }

    /// All tools with display names, for health reporting
    pub fn tools(&self) -> [(&'static str, &Path); 4] {
        [
            ("mar", self.mar.as_path()),
            ("mbsdiff", self.mbsdiff.as_path()),
            ("unwrap_full_update.pl", self.unwrap.as_path()),
            ("make_incremental_update.sh", self.make_incremental.as_path()),
        ]
    }

    /// Fail with `ToolNotFound` if any tool is missing
    pub fn ensure_available(&self) -> DeltagenResult<()> {
        for (_, path) in self.tools() {
            if !path.is_file() {
                return Err(DeltagenError::ToolNotFound(path.to_path_buf()));
            }
        }
        Ok(())
    }

    /// Environment overlay for every tool invocation
    ///
    /// The wrapper scripts locate `mar`/`mbsdiff` through these variables;
    /// the fixed C locale keeps tool output deterministic.
    pub fn env(&self, channel_id: &str, product_version: &str) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("MAR".to_string(), self.mar.display().to_string());
        env.insert("MBSDIFF".to_string(), self.mbsdiff.display().to_string());
        env.insert("MOZ_CHANNEL_ID".to_string(), channel_id.to_string());
        env.insert(
            "MOZ_PRODUCT_VERSION".to_string(),
            product_version.to_string(),
        );
        env.insert("LC_ALL".to_string(), "C".to_string());
        env
    }
}
