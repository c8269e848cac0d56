//! Validator store abstraction and the in-memory implementation

use super::entry::CacheEntry;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-URI persistence of the last validator and body.
///
/// `put` always writes the validator and body together, so a concurrent
/// reader sees either the old pair or the new one. Races on the same URI
/// resolve last-write-wins.
#[async_trait]
pub trait ValidatorStore: Send + Sync + fmt::Debug {
    /// Entry for a URI, if any
    async fn get(&self, uri: &str) -> Result<Option<CacheEntry>>;

    /// Insert or overwrite the entry for a URI
    async fn put(&self, uri: &str, validator: &str, body: &str) -> Result<CacheEntry>;
}

/// Shared handle to a store, passed to every decorator instance
pub type SharedStore = Arc<dyn ValidatorStore>;

/// Map-backed store, shared by clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with entries
    pub fn with_entries(entries: impl IntoIterator<Item = CacheEntry>) -> Self {
        let map = entries
            .into_iter()
            .map(|entry| (entry.uri.clone(), entry))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(map)),
        }
    }

    /// Number of cached URIs
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ValidatorStore for MemoryStore {
    async fn get(&self, uri: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(uri).cloned())
    }

    async fn put(&self, uri: &str, validator: &str, body: &str) -> Result<CacheEntry> {
        let entry = CacheEntry::new(uri, validator, body);
        self.entries
            .write()
            .await
            .insert(uri.to_string(), entry.clone());
        Ok(entry)
    }
}
