//! Artifact resolution
//!
//! Resolves an artifact reference into a local file: network locations are
//! downloaded, hash-verified and written through to the cache; bare cache
//! keys are pure cache retrievals.

use crate::build::{ArtifactLocation, ArtifactReference};
use crate::cache::ContentCache;
use crate::error::{DeltagenError, DeltagenResult};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::Path;
use tokio::fs;
use tokio::task;
use tracing::{debug, info};
use uuid::Uuid;

/// Resolves artifact references into local files
#[derive(Clone)]
pub struct ArtifactFetcher {
    cache: ContentCache,
}

impl ArtifactFetcher {
    /// Create a fetcher backed by `cache`
    pub fn new(cache: ContentCache) -> Self {
        Self { cache }
    }

    /// Resolve `artifact` into a file at `dest`
    ///
    /// Fails with `Fetch`/`HashMismatch` for unreachable or corrupt remote
    /// artifacts and `CacheMiss` for unknown cache keys. Mismatched
    /// downloads are never written through to the cache.
    pub async fn resolve(&self, artifact: &ArtifactReference, dest: &Path) -> DeltagenResult<()> {
        match &artifact.location {
            ArtifactLocation::Url(url) => self.resolve_remote(url, artifact, dest).await,
            ArtifactLocation::CacheKey(key) => {
                debug!("Resolving artifact {} from cache", key);
                self.cache.retrieve(key, artifact.category, dest).await
            }
        }
    }

    async fn resolve_remote(
        &self,
        url: &str,
        artifact: &ArtifactReference,
        dest: &Path,
    ) -> DeltagenResult<()> {
        // A prior download of the same content satisfies the request
        if self
            .cache
            .contains(&artifact.content_hash, artifact.category)
            .await?
        {
            info!(
                "Artifact {} already cached, skipping download",
                artifact.content_hash
            );
            return self
                .cache
                .retrieve(&artifact.content_hash, artifact.category, dest)
                .await;
        }

        info!("Downloading {} (expected hash {})", url, artifact.content_hash);
        let staged = dest.with_file_name(format!(".download-{}", Uuid::new_v4().simple()));

        let url_owned = url.to_string();
        let staged_path = staged.clone();
        let actual = task::spawn_blocking(move || download_to(&url_owned, &staged_path))
            .await
            .map_err(|e| DeltagenError::Internal(format!("download task failed: {}", e)))??;

        if !actual.eq_ignore_ascii_case(&artifact.content_hash) {
            let _ = fs::remove_file(&staged).await;
            return Err(DeltagenError::HashMismatch {
                url: url.to_string(),
                expected: artifact.content_hash.clone(),
                actual,
            });
        }

        fs::rename(&staged, dest)
            .await
            .map_err(|e| DeltagenError::io(format!("placing download at {}", dest.display()), e))?;

        // Write-through: future requests for this content short-circuit
        self.cache
            .save(dest, &artifact.content_hash, artifact.category)
            .await?;
        info!("Downloaded and cached artifact {}", artifact.content_hash);
        Ok(())
    }
}

/// Download `url` into `dest`, returning the SHA-256 of the bytes (blocking)
fn download_to(url: &str, dest: &Path) -> DeltagenResult<String> {
    let mut response = ureq::get(url)
        .call()
        .map_err(|e| DeltagenError::fetch(url, e.to_string()))?;

    let mut file = std::fs::File::create(dest)
        .map_err(|e| DeltagenError::io(format!("creating {}", dest.display()), e))?;
    let mut reader = response.body_mut().as_reader();
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| DeltagenError::fetch(url, e.to_string()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n])
            .map_err(|e| DeltagenError::io(format!("writing {}", dest.display()), e))?;
    }

    Ok(hex::encode(hasher.finalize()))
}

/// SHA-256 of a file, hex-encoded (blocking)
pub fn hash_file(path: &Path) -> DeltagenResult<String> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| DeltagenError::io(format!("opening {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| DeltagenError::io(format!("reading {}", path.display()), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Category;
    use std::net::TcpListener;
    use tempfile::TempDir;

    /// Serve one canned HTTP response on a local port
    fn serve_once(body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = std::io::Read::read(&mut stream, &mut buf);
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(header.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
        });

        format!("http://{}/artifact.mar", addr)
    }

    fn sha256_hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    #[tokio::test]
    async fn download_verifies_and_caches() {
        let dir = TempDir::new().unwrap();
        let cache = ContentCache::on_disk(dir.path().join("cache"));
        let fetcher = ArtifactFetcher::new(cache.clone());

        let url = serve_once(b"complete artifact");
        let artifact = ArtifactReference::complete(&url, sha256_hex(b"complete artifact"));

        let dest = dir.path().join("new.mar");
        fetcher.resolve(&artifact, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"complete artifact");
        // Write-through happened
        assert!(cache
            .contains(&artifact.content_hash, Category::Complete)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn hash_mismatch_caches_nothing() {
        let dir = TempDir::new().unwrap();
        let cache = ContentCache::on_disk(dir.path().join("cache"));
        let fetcher = ArtifactFetcher::new(cache.clone());

        let url = serve_once(b"tampered bytes");
        let expected = sha256_hex(b"original bytes");
        let artifact = ArtifactReference::complete(&url, expected.clone());

        let dest = dir.path().join("new.mar");
        let err = fetcher.resolve(&artifact, &dest).await.unwrap_err();

        assert!(matches!(err, DeltagenError::HashMismatch { .. }));
        assert!(!dest.exists());
        assert!(!cache.contains(&expected, Category::Complete).await.unwrap());
    }

    #[tokio::test]
    async fn cached_content_short_circuits_download() {
        let dir = TempDir::new().unwrap();
        let cache = ContentCache::on_disk(dir.path().join("cache"));
        let fetcher = ArtifactFetcher::new(cache.clone());

        let seed = dir.path().join("seed");
        std::fs::write(&seed, b"already here").unwrap();
        let hash = sha256_hex(b"already here");
        cache.save(&seed, &hash, Category::Complete).await.unwrap();

        // Unreachable URL: resolution must come from the cache
        let artifact = ArtifactReference::complete("http://127.0.0.1:1/never.mar", hash);
        let dest = dir.path().join("new.mar");
        fetcher.resolve(&artifact, &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"already here");
    }

    #[tokio::test]
    async fn cache_key_location_is_pure_retrieval() {
        let dir = TempDir::new().unwrap();
        let cache = ContentCache::on_disk(dir.path().join("cache"));
        let fetcher = ArtifactFetcher::new(cache.clone());

        let seed = dir.path().join("seed");
        std::fs::write(&seed, b"seeded").unwrap();
        cache.save(&seed, "h-old", Category::Complete).await.unwrap();

        let hit = ArtifactReference::complete("h-old", sha256_hex(b"seeded"));
        let dest = dir.path().join("old.mar");
        fetcher.resolve(&hit, &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"seeded");

        let miss = ArtifactReference::complete("h-unknown", "0".repeat(64));
        let err = fetcher
            .resolve(&miss, &dir.path().join("none.mar"))
            .await
            .unwrap_err();
        assert!(err.is_cache_miss());
    }

    #[tokio::test]
    async fn unreachable_source_is_fetch_error() {
        let dir = TempDir::new().unwrap();
        let cache = ContentCache::on_disk(dir.path().join("cache"));
        let fetcher = ArtifactFetcher::new(cache);

        let artifact =
            ArtifactReference::complete("http://127.0.0.1:1/absent.mar", "0".repeat(64));
        let err = fetcher
            .resolve(&artifact, &dir.path().join("new.mar"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeltagenError::Fetch { .. }));
    }

    #[test]
    fn hash_file_matches_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data");
        std::fs::write(&path, b"some artifact data").unwrap();

        assert_eq!(hash_file(&path).unwrap(), sha256_hex(b"some artifact data"));
    }
}
