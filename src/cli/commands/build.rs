//! Build command - run one partial build to completion

use crate::build::{ArtifactReference, BuildRequest, PartialBuildOrchestrator};
use crate::cli::args::BuildArgs;
use crate::config::Config;
use crate::error::DeltagenResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> DeltagenResult<()> {
    let channel_id = args
        .channel
        .clone()
        .unwrap_or_else(|| config.build.channel_id.clone());
    let product_version = args
        .product_version
        .clone()
        .unwrap_or_else(|| config.build.product_version.clone());

    let identifier = args.identifier.clone().unwrap_or_else(|| {
        let derived = BuildRequest::derive_identifier(
            &args.old_hash,
            &args.new_hash,
            &channel_id,
            &product_version,
        );
        debug!("No identifier given, derived {}", derived);
        derived
    });

    let request = BuildRequest {
        new_artifact: ArtifactReference::complete(&args.new_location, &args.new_hash),
        old_artifact: ArtifactReference::complete(&args.old_location, &args.old_hash),
        identifier,
        channel_id,
        product_version,
    };

    let pb = create_progress_bar(&format!(
        "Building partial artifact {}...",
        request.identifier
    ));

    let orchestrator = PartialBuildOrchestrator::new(config);
    let result = orchestrator.build_partial(&request).await;
    pb.finish_and_clear();

    let key = result?;
    println!(
        "{} Partial artifact cached under {}",
        style("✓").green(),
        style(&key).cyan()
    );
    println!("  Inspect with: deltagen cache list");
    Ok(())
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
