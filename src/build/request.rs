//! Build request types

use crate::cache::Category;
use sha2::{Digest, Sha256};
use std::fmt;

/// Where an artifact can be resolved from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    /// Remote artifact, downloaded and hash-verified
    Url(String),
    /// Previously cached artifact, looked up by key
    CacheKey(String),
}

impl ArtifactLocation {
    /// Classify a location string by scheme prefix
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Self::Url(s.to_string())
        } else {
            Self::CacheKey(s.to_string())
        }
    }

    /// The underlying location string
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(s) | Self::CacheKey(s) => s,
        }
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single binary update artifact, immutable once created
#[derive(Debug, Clone)]
pub struct ArtifactReference {
    /// Where to resolve the artifact from
    pub location: ArtifactLocation,
    /// Expected SHA-256 of the artifact contents (hex)
    pub content_hash: String,
    /// Cache category the artifact belongs to
    pub category: Category,
}

impl ArtifactReference {
    /// Reference a complete update artifact
    pub fn complete(location: &str, content_hash: impl Into<String>) -> Self {
        Self {
            location: ArtifactLocation::parse(location),
            content_hash: content_hash.into(),
            category: Category::Complete,
        }
    }
}

/// One partial-build request
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// The newer complete artifact
    pub new_artifact: ArtifactReference,
    /// The older complete artifact
    pub old_artifact: ArtifactReference,
    /// Cache key for the resulting partial artifact
    pub identifier: String,
    /// Update channel passed to the tools
    pub channel_id: String,
    /// Product version passed to the tools
    pub product_version: String,
}

impl BuildRequest {
    /// Derive a collision-free identifier from the request inputs
    ///
    /// Callers supplying their own identifiers own collision avoidance;
    /// this derivation ties the cache slot to the exact input pair and
    /// build parameters instead.
    pub fn derive_identifier(
        old_hash: &str,
        new_hash: &str,
        channel_id: &str,
        product_version: &str,
    ) -> String {
        let mut hasher = Sha256::new();
        for part in [old_hash, new_hash, channel_id, product_version] {
            hasher.update(part.as_bytes());
            hasher.update(b"\0");
        }
        let digest = hasher.finalize();

        hex::encode(&digest[..6])
    }
}
