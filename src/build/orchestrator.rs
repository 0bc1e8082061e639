//! Partial build orchestration
//!
//! Drives one build request through the pipeline: resolve both complete
//! artifacts, unpack each into the workspace, diff the unpacked trees, and
//! commit the result to the cache. A failure after the fetch phase clears
//! the identifier's cache slot so a stale partial artifact can never be
//! served for a request that just failed to rebuild.

use crate::build::request::BuildRequest;
use crate::cache::{Category, ContentCache};
use crate::config::Config;
use crate::error::{DeltagenError, DeltagenResult};
use crate::fetch::ArtifactFetcher;
use crate::tools::{ToolInvocation, ToolRunner, Toolkit};
use crate::workspace::{Workspace, WorkspaceManager};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Pipeline phase, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Fetching,
    UnpackingOld,
    UnpackingNew,
    Diffing,
    Caching,
    Done,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetching => "fetching",
            Self::UnpackingOld => "unpacking-old",
            Self::UnpackingNew => "unpacking-new",
            Self::Diffing => "diffing",
            Self::Caching => "caching",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Cooperative cancellation signal, checked between phases
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the build holding this flag
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn ensure_active(&self) -> DeltagenResult<()> {
        if self.is_cancelled() {
            Err(DeltagenError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Top-level pipeline for one build request
pub struct PartialBuildOrchestrator {
    fetcher: ArtifactFetcher,
    cache: ContentCache,
    workspaces: WorkspaceManager,
    runner: ToolRunner,
    toolkit: Toolkit,
    keep_failed_workspaces: bool,
}

impl PartialBuildOrchestrator {
    /// Build an orchestrator from configuration
    pub fn new(config: &Config) -> Self {
        let cache = ContentCache::on_disk(config.cache_root());
        Self {
            fetcher: ArtifactFetcher::new(cache.clone()),
            cache,
            workspaces: WorkspaceManager::new(config.workspace_root()),
            runner: ToolRunner::new(),
            toolkit: Toolkit::new(config.tools_dir()),
            keep_failed_workspaces: config.build.keep_failed_workspaces,
        }
    }

    /// The cache this orchestrator commits results to
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Run the pipeline to completion, returning the cache key of the
    /// generated partial artifact
    pub async fn build_partial(&self, request: &BuildRequest) -> DeltagenResult<String> {
        self.build_partial_with_cancel(request, &CancelFlag::new())
            .await
    }

    /// Run the pipeline with a cancellation signal
    ///
    /// A cancelled build is treated like any other post-fetch failure,
    /// including the cache-entry cleanup.
    pub async fn build_partial_with_cancel(
        &self,
        request: &BuildRequest,
        cancel: &CancelFlag,
    ) -> DeltagenResult<String> {
        info!(
            "Building partial artifact {} ({} -> {})",
            request.identifier,
            request.old_artifact.content_hash,
            request.new_artifact.content_hash
        );
        self.toolkit.ensure_available()?;

        let workspace = self.workspaces.allocate("build").await?;
        let mut phase = BuildPhase::Fetching;

        let result = self
            .run_pipeline(request, &workspace, cancel, &mut phase)
            .await;

        match &result {
            Ok(_) => {
                if let Err(e) = self.workspaces.remove(&workspace).await {
                    warn!("Failed to remove workspace: {}", e);
                }
            }
            Err(e) => {
                warn!(
                    "Build {} failed during {} phase: {}",
                    request.identifier, phase, e
                );
                if self.keep_failed_workspaces {
                    info!(
                        "Keeping workspace {} for diagnosis",
                        workspace.root().display()
                    );
                } else if let Err(e) = self.workspaces.remove(&workspace).await {
                    warn!("Failed to remove workspace: {}", e);
                }
            }
        }

        result
    }

    async fn run_pipeline(
        &self,
        request: &BuildRequest,
        workspace: &Workspace,
        cancel: &CancelFlag,
        phase: &mut BuildPhase,
    ) -> DeltagenResult<String> {
        // Fetch failures leave the cache untouched: nothing was committed
        // for this identifier yet
        *phase = BuildPhase::Fetching;
        info!("Resolving complete artifacts");
        let old_path = workspace.mar_dir().join("old.mar");
        let new_path = workspace.mar_dir().join("new.mar");
        tokio::try_join!(
            self.fetcher.resolve(&request.old_artifact, &old_path),
            self.fetcher.resolve(&request.new_artifact, &new_path),
        )?;

        // From here on, any failure must clear the identifier's cache slot
        match self
            .generate(request, workspace, &old_path, &new_path, cancel, phase)
            .await
        {
            Ok(()) => {
                *phase = BuildPhase::Done;
                info!("Partial artifact {} built and cached", request.identifier);
                Ok(request.identifier.clone())
            }
            Err(e) => {
                if let Err(del) = self
                    .cache
                    .delete(&request.identifier, Category::Partial)
                    .await
                {
                    warn!(
                        "Failed to clear cache entry {}: {}",
                        request.identifier, del
                    );
                }
                Err(e)
            }
        }
    }

    async fn generate(
        &self,
        request: &BuildRequest,
        workspace: &Workspace,
        old_path: &Path,
        new_path: &Path,
        cancel: &CancelFlag,
        phase: &mut BuildPhase,
    ) -> DeltagenResult<()> {
        let env = self.toolkit.env(&request.channel_id, &request.product_version);

        cancel.ensure_active()?;
        *phase = BuildPhase::UnpackingOld;
        let old_unpacked = self.unpack(&env, old_path, workspace).await?;

        cancel.ensure_active()?;
        *phase = BuildPhase::UnpackingNew;
        let new_unpacked = self.unpack(&env, new_path, workspace).await?;

        cancel.ensure_active()?;
        *phase = BuildPhase::Diffing;
        let output = workspace.work_dir().join(format!(
            "{}-{}",
            file_name(old_path)?,
            file_name(new_path)?
        ));
        info!("Generating partial artifact at {}", output.display());

        let invocation = ToolInvocation::new(self.toolkit.diff_tool(), workspace.work_dir(), env)
            .arg_path(&output)
            .arg_path(&old_unpacked)
            .arg_path(&new_unpacked);
        self.runner.run(&invocation).await?;

        if !output.is_file() {
            return Err(DeltagenError::ToolOutputMissing {
                tool: invocation.tool_name(),
                path: output,
            });
        }

        cancel.ensure_active()?;
        *phase = BuildPhase::Caching;
        info!("Caching partial artifact under {}", request.identifier);
        self.cache
            .save(&output, &request.identifier, Category::Partial)
            .await
    }

    /// Unpack one complete artifact into a per-artifact subdirectory
    async fn unpack(
        &self,
        env: &HashMap<String, String>,
        archive: &Path,
        workspace: &Workspace,
    ) -> DeltagenResult<PathBuf> {
        let dest = workspace.work_dir().join(file_name(archive)?);
        WorkspaceManager::ensure_dir(&dest).await?;

        info!("Unpacking {}", archive.display());
        let invocation =
            ToolInvocation::new(self.toolkit.unwrap_tool(), &dest, env.clone()).arg_path(archive);
        self.runner.run(&invocation).await?;
        Ok(dest)
    }
}

fn file_name(path: &Path) -> DeltagenResult<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            DeltagenError::Internal(format!("artifact path {} has no file name", path.display()))
        })
}
