//! Content-addressed cache over a blob store
//!
//! Maps `(key, category)` pairs onto blob keys. Categories separate full
//! update artifacts from the partial artifacts built from them.

use crate::cache::store::{BlobStore, FsBlobStore};
use crate::error::{DeltagenError, DeltagenResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Artifact category within the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Full update artifact, keyed by content hash
    Complete,
    /// Generated partial artifact, keyed by build identifier
    Partial,
}

impl Category {
    /// Namespace component used in blob keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
        }
    }

    /// Parse from a namespace string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "complete" => Some(Self::Complete),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cache entry listing for inspection commands
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    /// Entry key (content hash or build identifier)
    pub key: String,
    /// Entry category
    pub category: Category,
    /// Blob size in bytes
    pub size_bytes: u64,
    /// Last modification time
    pub modified: DateTime<Utc>,
}

/// Content cache keyed by `(key, category)`
///
/// Entries are atomic from a reader's perspective: once `save` returns,
/// `retrieve` succeeds with the full blob until a matching `delete`.
#[derive(Clone)]
pub struct ContentCache {
    store: Arc<dyn BlobStore>,
}

impl ContentCache {
    /// Create a cache over an arbitrary blob store
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Create a filesystem-backed cache rooted at `root`
    pub fn on_disk(root: impl Into<std::path::PathBuf>) -> Self {
        Self::new(Arc::new(FsBlobStore::new(root)))
    }

    fn blob_key(key: &str, category: Category) -> DeltagenResult<String> {
        if key.is_empty()
            || key == "."
            || key == ".."
            || key.contains('/')
            || key.contains('\\')
        {
            return Err(DeltagenError::CacheStore {
                key: key.to_string(),
                reason: "invalid cache key".to_string(),
            });
        }
        Ok(format!("{}/{}", category, key))
    }

    /// Store the file at `source` under `(key, category)`
    pub async fn save(&self, source: &Path, key: &str, category: Category) -> DeltagenResult<()> {
        let blob_key = Self::blob_key(key, category)?;
        self.store.put(&blob_key, source).await?;
        debug!("Cached {} entry {}", category, key);
        Ok(())
    }

    /// Copy the entry at `(key, category)` to `dest`
    pub async fn retrieve(
        &self,
        key: &str,
        category: Category,
        dest: &Path,
    ) -> DeltagenResult<()> {
        let blob_key = Self::blob_key(key, category)?;
        if self.store.get(&blob_key, dest).await? {
            debug!("Cache hit for {} entry {}", category, key);
            Ok(())
        } else {
            Err(DeltagenError::cache_miss(key, category.as_str()))
        }
    }

    /// Remove the entry at `(key, category)`; absent entries are not an error
    pub async fn delete(&self, key: &str, category: Category) -> DeltagenResult<()> {
        let blob_key = Self::blob_key(key, category)?;
        self.store.delete(&blob_key).await
    }

    /// Whether an entry exists at `(key, category)`
    pub async fn contains(&self, key: &str, category: Category) -> DeltagenResult<bool> {
        let blob_key = Self::blob_key(key, category)?;
        self.store.contains(&blob_key).await
    }

    /// List all entries with sizes and modification times
    pub async fn entries(&self) -> DeltagenResult<Vec<CacheEntry>> {
        let mut entries = Vec::new();

        for blob_key in self.store.keys().await? {
            let Some((namespace, key)) = blob_key.split_once('/') else {
                continue;
            };
            let Some(category) = Category::parse(namespace) else {
                continue;
            };
            let Some(meta) = self.store.metadata(&blob_key).await? else {
                // Deleted between listing and stat
                continue;
            };

            entries.push(CacheEntry {
                key: key.to_string(),
                category,
                size_bytes: meta.size_bytes,
                modified: meta.modified,
            });
        }

        Ok(entries)
    }
}
