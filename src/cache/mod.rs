//! Conditional caching module
//!
//! Supports: in-memory, JSON file and DuckDB validator stores
//!
//! # Overview
//!
//! The cache remembers, per URI, the last validator (ETag) and body the
//! server sent. [`CachingTransport`] replays the validator as a conditional
//! header and substitutes the cached body when the server answers "not
//! modified". Entries are never expired or evicted: validity is decided by
//! the server on every read.

mod decorator;
mod duckdb_store;
mod entry;
mod file;
mod store;

pub use decorator::{CachingTransport, ValidatorHeaders};
pub use duckdb_store::DuckDbStore;
pub use entry::CacheEntry;
pub use file::FileStore;
pub use store::{MemoryStore, SharedStore, ValidatorStore};
