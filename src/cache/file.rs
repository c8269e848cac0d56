//! JSON-file validator store
//!
//! Keeps the entries in memory and rewrites the whole document on every
//! `put` (temp file + rename, so a crash never leaves a half-written file).

use super::entry::CacheEntry;
use super::store::ValidatorStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// On-disk document layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    entries: HashMap<String, CacheEntry>,
}

/// File-backed store, shared by clones
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl FileStore {
    /// Open a store, loading existing entries if the file is present.
    ///
    /// An unreadable document is logged and replaced on the next write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| Error::Store {
                message: format!("Failed to read cache file {}: {e}", path.display()),
            })?;
            match serde_json::from_str::<CacheDocument>(&contents) {
                Ok(document) => document.entries,
                Err(e) => {
                    warn!("Ignoring unreadable cache file {}: {e}", path.display());
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        debug!("Opened cache file {} with {} entries", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of cached URIs
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn save(&self, entries: &HashMap<String, CacheEntry>) -> Result<()> {
        let document = CacheDocument {
            entries: entries.clone(),
        };
        let contents = serde_json::to_string_pretty(&document).map_err(|e| Error::Store {
            message: format!("Failed to serialize cache: {e}"),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Store {
                    message: format!("Failed to create cache directory: {e}"),
                })?;
        }

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::Store {
                message: format!("Failed to write cache file: {e}"),
            })?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::Store {
                message: format!("Failed to rename cache file: {e}"),
            })?;

        Ok(())
    }
}

#[async_trait]
impl ValidatorStore for FileStore {
    async fn get(&self, uri: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(uri).cloned())
    }

    async fn put(&self, uri: &str, validator: &str, body: &str) -> Result<CacheEntry> {
        let entry = CacheEntry::new(uri, validator, body);
        // Held across the write so two puts never interleave their files.
        let mut entries = self.entries.write().await;
        let mut updated = entries.clone();
        updated.insert(uri.to_string(), entry.clone());
        // Memory only follows once the document is on disk.
        self.save(&updated).await?;
        *entries = updated;
        Ok(entry)
    }
}
