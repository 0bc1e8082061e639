//! Isolated per-build working directories
//!
//! Each build gets a uniquely named directory tree under the workspace
//! root: an input slot for the downloaded artifacts and a working area for
//! the unpack/diff tools. Workspaces are never reused across builds.

use crate::error::{DeltagenError, DeltagenResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Directory tree for one build
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    mar_dir: PathBuf,
    work_dir: PathBuf,
}

impl Workspace {
    /// Workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Input slot for downloaded complete artifacts
    pub fn mar_dir(&self) -> &Path {
        &self.mar_dir
    }

    /// Working area for unpacked trees and the diff output
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

/// Allocates and cleans up build workspaces
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    /// Create a manager allocating under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Allocate a fresh, uniquely named workspace
    pub async fn allocate(&self, prefix: &str) -> DeltagenResult<Workspace> {
        let name = format!("{}-{}", prefix, Uuid::new_v4().simple());
        let root = self.root.join(name);
        let mar_dir = root.join("mar");
        let work_dir = root.join("work");

        for dir in [&mar_dir, &work_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| DeltagenError::workspace(dir.clone(), e.to_string()))?;
        }

        debug!("Allocated workspace {}", root.display());
        Ok(Workspace {
            root,
            mar_dir,
            work_dir,
        })
    }

    /// Create `path` if absent; succeed silently if it already is a directory
    pub async fn ensure_dir(path: &Path) -> DeltagenResult<()> {
        match fs::create_dir(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if path.is_dir() {
                    Ok(())
                } else {
                    Err(DeltagenError::workspace(
                        path,
                        "path exists but is not a directory",
                    ))
                }
            }
            Err(e) => Err(DeltagenError::workspace(path, e.to_string())),
        }
    }

    /// Remove a workspace tree; an already-removed workspace is not an error
    pub async fn remove(&self, workspace: &Workspace) -> DeltagenResult<()> {
        match fs::remove_dir_all(workspace.root()).await {
            Ok(()) => {
                debug!("Removed workspace {}", workspace.root().display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DeltagenError::workspace(
                workspace.root(),
                e.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn allocate_creates_subdirs() {
        let dir = TempDir::new().unwrap();
        let manager = WorkspaceManager::new(dir.path());

        let ws = manager.allocate("build").await.unwrap();
        assert!(ws.mar_dir().is_dir());
        assert!(ws.work_dir().is_dir());
        assert!(ws.root().starts_with(dir.path()));
    }

    #[tokio::test]
    async fn allocations_never_collide() {
        let dir = TempDir::new().unwrap();
        let manager = WorkspaceManager::new(dir.path());

        let a = manager.allocate("build").await.unwrap();
        let b = manager.allocate("build").await.unwrap();
        assert_ne!(a.root(), b.root());
    }

    #[tokio::test]
    async fn ensure_dir_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("unpacked");

        WorkspaceManager::ensure_dir(&path).await.unwrap();
        WorkspaceManager::ensure_dir(&path).await.unwrap();
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn ensure_dir_rejects_non_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("occupied");
        std::fs::write(&path, b"file").unwrap();

        let err = WorkspaceManager::ensure_dir(&path).await.unwrap_err();
        assert!(matches!(err, DeltagenError::Workspace { .. }));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let manager = WorkspaceManager::new(dir.path());

        let ws = manager.allocate("build").await.unwrap();
        manager.remove(&ws).await.unwrap();
        manager.remove(&ws).await.unwrap();
        assert!(!ws.root().exists());
    }
}
