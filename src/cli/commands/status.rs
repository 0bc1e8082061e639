//! Status command - check tools and state directories

use crate::cache::ContentCache;
use crate::config::Config;
use crate::error::DeltagenResult;
use crate::tools::Toolkit;
use console::style;

/// Execute the status command
pub async fn execute(config: &Config) -> DeltagenResult<()> {
    let toolkit = Toolkit::new(config.tools_dir());
    let mut healthy = true;

    println!("Tools ({})", toolkit.dir().display());
    for (name, path) in toolkit.tools() {
        if path.is_file() {
            println!("  {} {}", style("✓").green(), name);
        } else {
            println!("  {} {} (missing)", style("✗").red(), name);
            healthy = false;
        }
    }

    println!();
    let cache_root = config.cache_root();
    if cache_root.is_dir() {
        let cache = ContentCache::on_disk(&cache_root);
        let entries = cache.entries().await?;
        println!(
            "Cache: {} ({} entries)",
            cache_root.display(),
            entries.len()
        );
    } else {
        println!(
            "Cache: {} (not yet created)",
            cache_root.display()
        );
    }
    println!("Workspaces: {}", config.workspace_root().display());

    if !healthy {
        println!();
        println!(
            "{} Install the mar tools into the tools directory, or set tools.dir in config.toml",
            style("!").yellow()
        );
    }

    Ok(())
}
