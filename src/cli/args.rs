//! CLI argument definitions using clap derive

use crate::cache::Category;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// deltagen - Partial update artifact builder
///
/// Builds partial binary update artifacts from two complete ones by
/// driving external unpack/diff tools, caching results by identifier.
#[derive(Parser, Debug)]
#[command(name = "deltagen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DELTAGEN_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a partial update artifact from two complete ones
    Build(BuildArgs),

    /// Inspect and maintain the artifact cache
    Cache(CacheArgs),

    /// Check tool availability and state directories
    Status,

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// URL or cache key of the older complete artifact
    #[arg(long)]
    pub old_location: String,

    /// Expected SHA-256 of the older artifact (hex)
    #[arg(long)]
    pub old_hash: String,

    /// URL or cache key of the newer complete artifact
    #[arg(long)]
    pub new_location: String,

    /// Expected SHA-256 of the newer artifact (hex)
    #[arg(long)]
    pub new_hash: String,

    /// Cache key for the resulting partial artifact
    /// (derived from the inputs if not given)
    #[arg(short, long)]
    pub identifier: Option<String>,

    /// Update channel passed to the tools (overrides config)
    #[arg(long)]
    pub channel: Option<String>,

    /// Product version passed to the tools (overrides config)
    #[arg(long)]
    pub product_version: Option<String>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cache entries
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete one cache entry
    Delete {
        /// Entry key (content hash or build identifier)
        key: String,

        /// Entry category
        #[arg(long, default_value = "partial")]
        category: CategoryArg,
    },

    /// Delete all cache entries
    Clear,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,
}

/// Output format for listings
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Cache category, as a CLI value
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum CategoryArg {
    Complete,
    Partial,
}

impl From<CategoryArg> for Category {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::Complete => Category::Complete,
            CategoryArg::Partial => Category::Partial,
        }
    }
}
