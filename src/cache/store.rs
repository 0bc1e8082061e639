//! Blob store backends
//!
//! The cache persists blobs through a minimal key/value interface so the
//! filesystem backend can be swapped for an object store without touching
//! the cache logic.

use crate::error::{DeltagenError, DeltagenResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Size and modification time of a stored blob
#[derive(Debug, Clone)]
pub struct BlobMetadata {
    /// Blob size in bytes
    pub size_bytes: u64,
    /// Last modification time
    pub modified: DateTime<Utc>,
}

/// Key/value blob storage interface
///
/// Keys may contain `/` as a namespace separator. Implementations must
/// publish blobs atomically: a concurrent `get` sees either the previous
/// blob or the complete new one, never a partial write.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the file at `source` under `key`, replacing any existing blob
    async fn put(&self, key: &str, source: &Path) -> DeltagenResult<()>;

    /// Copy the blob at `key` to `dest`; returns false if the key is absent
    async fn get(&self, key: &str, dest: &Path) -> DeltagenResult<bool>;

    /// Remove the blob at `key`; absent keys are not an error
    async fn delete(&self, key: &str) -> DeltagenResult<()>;

    /// Whether a blob exists at `key`
    async fn contains(&self, key: &str) -> DeltagenResult<bool>;

    /// Metadata for the blob at `key`, if present
    async fn metadata(&self, key: &str) -> DeltagenResult<Option<BlobMetadata>>;

    /// All stored keys
    async fn keys(&self) -> DeltagenResult<Vec<String>>;
}

/// Filesystem-backed blob store
///
/// Blobs live at `<root>/<key>`. Writes land in `<root>/tmp` first and are
/// renamed into place, so publication is atomic on the same filesystem.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, source: &Path) -> DeltagenResult<()> {
        let target = self.blob_path(key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                DeltagenError::io(format!("creating blob directory {}", parent.display()), e)
            })?;
        }

        let tmp_dir = self.tmp_dir();
        fs::create_dir_all(&tmp_dir)
            .await
            .map_err(|e| DeltagenError::io("creating blob staging directory", e))?;
        let staged = tmp_dir.join(Uuid::new_v4().simple().to_string());

        if let Err(e) = fs::copy(source, &staged).await {
            let _ = fs::remove_file(&staged).await;
            return Err(DeltagenError::io(
                format!("staging blob from {}", source.display()),
                e,
            ));
        }

        if let Err(e) = fs::rename(&staged, &target).await {
            let _ = fs::remove_file(&staged).await;
            return Err(DeltagenError::io(
                format!("publishing blob {}", target.display()),
                e,
            ));
        }

        debug!("Stored blob {} from {}", key, source.display());
        Ok(())
    }

    async fn get(&self, key: &str, dest: &Path) -> DeltagenResult<bool> {
        let path = self.blob_path(key);
        if !path.is_file() {
            return Ok(false);
        }

        fs::copy(&path, dest)
            .await
            .map_err(|e| DeltagenError::io(format!("reading blob {}", key), e))?;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> DeltagenResult<()> {
        match fs::remove_file(self.blob_path(key)).await {
            Ok(()) => {
                debug!("Deleted blob {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DeltagenError::io(format!("deleting blob {}", key), e)),
        }
    }

    async fn contains(&self, key: &str) -> DeltagenResult<bool> {
        Ok(self.blob_path(key).is_file())
    }

    async fn metadata(&self, key: &str) -> DeltagenResult<Option<BlobMetadata>> {
        let path = self.blob_path(key);
        let meta = match fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DeltagenError::io(format!("stat blob {}", key), e)),
        };

        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Some(BlobMetadata {
            size_bytes: meta.len(),
            modified,
        }))
    }

    async fn keys(&self) -> DeltagenResult<Vec<String>> {
        let mut keys = Vec::new();

        let mut top = match fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(DeltagenError::io("reading blob store root", e)),
        };

        while let Some(entry) = top
            .next_entry()
            .await
            .map_err(|e| DeltagenError::io("reading blob store root", e))?
        {
            let namespace = entry.file_name().to_string_lossy().to_string();
            if namespace == "tmp" || !entry.path().is_dir() {
                continue;
            }

            let mut inner = fs::read_dir(entry.path())
                .await
                .map_err(|e| DeltagenError::io(format!("reading namespace {}", namespace), e))?;
            while let Some(blob) = inner
                .next_entry()
                .await
                .map_err(|e| DeltagenError::io(format!("reading namespace {}", namespace), e))?
            {
                if blob.path().is_file() {
                    keys.push(format!("{}/{}", namespace, blob.file_name().to_string_lossy()));
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
