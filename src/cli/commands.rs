//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Conditional-caching, link-paginating client for git-hosting REST APIs
#[derive(Parser, Debug)]
#[command(name = "gitrest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Access configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one resource through the conditional cache
    Get {
        /// Absolute URI, or a path relative to `http.base_url`
        uri: String,

        /// Skip revalidation and fetch unconditionally
        #[arg(long)]
        no_cache: bool,

        /// Extra request header, `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },

    /// Walk a link-paginated collection
    Pages {
        /// URI of the first page
        uri: String,

        /// Emit the elements of every page instead of whole pages
        #[arg(long)]
        items: bool,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,

        /// Extra request header, `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },

    /// Validate the access configuration
    CheckConfig,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
