//! CLI module
//!
//! Command-line interface over the access layer.
//!
//! # Commands
//!
//! - `get` - Fetch one resource through the conditional cache
//! - `pages` - Walk a link-paginated collection
//! - `check-config` - Validate the access configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
