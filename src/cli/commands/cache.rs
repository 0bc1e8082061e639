//! Cache command - inspect and maintain the artifact cache

use crate::cache::{CacheEntry, Category, ContentCache};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::DeltagenResult;
use console::style;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> DeltagenResult<()> {
    let cache = ContentCache::on_disk(config.cache_root());

    match args.action {
        CacheAction::List { format } => list_entries(&cache, format).await,
        CacheAction::Delete { key, category } => {
            cache.delete(&key, category.into()).await?;
            println!("{} Deleted cache entry {}", style("✓").green(), key);
            Ok(())
        }
        CacheAction::Clear => clear_entries(&cache).await,
    }
}

async fn list_entries(cache: &ContentCache, format: OutputFormat) -> DeltagenResult<()> {
    let mut entries = cache.entries().await?;
    entries.sort_by(|a, b| b.modified.cmp(&a.modified));

    if entries.is_empty() {
        println!("No cache entries found.");
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_entry_table(&entries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }

    Ok(())
}

fn print_entry_table(entries: &[CacheEntry]) {
    println!(
        "{:<44} {:<10} {:>12} {:<20}",
        "KEY", "CATEGORY", "SIZE", "MODIFIED"
    );
    println!("{}", "-".repeat(88));

    for entry in entries {
        let category = match entry.category {
            Category::Complete => style("complete").green().to_string(),
            Category::Partial => style("partial").cyan().to_string(),
        };
        let modified = entry.modified.format("%Y-%m-%d %H:%M").to_string();

        println!(
            "{:<44} {:<10} {:>12} {:<20}",
            entry.key,
            category,
            format_bytes(entry.size_bytes),
            modified
        );
    }

    println!();
    println!("Total: {} entries", entries.len());
}

async fn clear_entries(cache: &ContentCache) -> DeltagenResult<()> {
    let entries = cache.entries().await?;
    let count = entries.len();

    for entry in entries {
        cache.delete(&entry.key, entry.category).await?;
    }

    println!("{} Removed {} cache entries", style("✓").green(), count);
    Ok(())
}

/// Format bytes as human-readable size (e.g., "1.5 MB")
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
