//! DuckDB-backed validator store
//!
//! One row per URI in `validator_cache`. The database can live in a file
//! shared between runs, or in memory.

use super::entry::CacheEntry;
use super::store::ValidatorStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS validator_cache (
    uri VARCHAR PRIMARY KEY,
    validator VARCHAR NOT NULL,
    body VARCHAR,
    stored_at VARCHAR NOT NULL
)";

/// DuckDB store, shared by clones
#[derive(Clone)]
pub struct DuckDbStore {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl DuckDbStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        Self::init(conn, path.display().to_string())
    }

    /// In-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, ":memory:".to_string())
    }

    fn init(conn: Connection, location: String) -> Result<Self> {
        conn.execute_batch(CREATE_TABLE)?;
        debug!("Validator cache table ready in {location}");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        })
    }

    /// Where the database lives
    pub fn location(&self) -> &str {
        &self.location
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::store("DuckDB connection lock poisoned"))
    }

    fn select(&self, uri: &str) -> Result<Option<CacheEntry>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT validator, body, stored_at FROM validator_cache WHERE uri = ?")?;
        let mut rows = stmt.query(params![uri])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let validator: String = row.get(0)?;
        let body: Option<String> = row.get(1)?;
        let stored_at: String = row.get(2)?;

        Ok(Some(CacheEntry {
            uri: uri.to_string(),
            validator,
            body,
            stored_at: parse_timestamp(&stored_at),
        }))
    }

    fn upsert(&self, entry: &CacheEntry) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO validator_cache (uri, validator, body, stored_at) VALUES (?, ?, ?, ?)",
            params![
                entry.uri,
                entry.validator,
                entry.body,
                entry.stored_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Number of cached URIs
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM validator_cache", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}

#[async_trait]
impl ValidatorStore for DuckDbStore {
    async fn get(&self, uri: &str) -> Result<Option<CacheEntry>> {
        self.select(uri)
    }

    async fn put(&self, uri: &str, validator: &str, body: &str) -> Result<CacheEntry> {
        let entry = CacheEntry::new(uri, validator, body);
        self.upsert(&entry)?;
        Ok(entry)
    }
}

impl std::fmt::Debug for DuckDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

// The timestamp is informational; an unreadable one falls back to the epoch.
fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_default()
}
