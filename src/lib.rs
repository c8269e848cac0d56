// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # gitrest
//!
//! A resource access layer for git-hosting REST APIs: a composable
//! transport chain that adds validator-based conditional caching to GET
//! requests, and a lazy paginator that follows `Link` headers.
//!
//! ## Features
//!
//! - **Raw transport**: reqwest client with retries, backoff and rate limiting
//! - **Conditional cache**: `ETag` / `If-None-Match` revalidation over a
//!   pluggable validator store (memory, JSON file, DuckDB)
//! - **Link pagination**: forward-only page sessions and item streams
//! - **YAML config**: the whole chain from one file, secrets from env vars
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gitrest::{CachingTransport, Credentials, HttpClient, MemoryStore, Paginator, Result};
//! use futures::TryStreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = HttpClient::new()?;
//!     let cached = CachingTransport::new(Arc::new(client), Arc::new(MemoryStore::new()));
//!     let github = cached.authenticated(Credentials::token("ghp_..."));
//!
//!     // Second fetch revalidates with If-None-Match and costs no quota on 304
//!     let repo = github.get("https://api.github.com/repos/o/r", gitrest::no_headers()).await?;
//!
//!     let issues = Paginator::new(github, "https://api.github.com/repos/o/r/issues");
//!     let all: Vec<_> = issues.items().try_collect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │   Paginator   │──▶│ CachingTransport │──▶│  HttpClient  │──▶ network
//! │ (Link: next)  │   │ (ETag / 304)     │   │ retry, quota │
//! └───────────────┘   └────────┬─────────┘   └──────────────┘
//!                              │
//!                     ┌────────▼─────────┐
//!                     │  ValidatorStore  │
//!                     │ memory/file/duck │
//!                     └──────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Credentials
pub mod auth;

/// Transport abstraction and the reqwest-backed client
pub mod http;

/// Validator store and conditional cache decorator
pub mod cache;

/// Link-header pagination
pub mod pagination;

/// YAML access configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::Credentials;
pub use cache::{CachingTransport, FileStore, MemoryStore, ValidatorStore};
pub use config::AccessConfig;
pub use error::{Error, Result};
pub use http::{no_headers, Headers, HttpClient, Request, Resource, StatusClasses, Transport};
pub use pagination::{Pages, Paginator};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
