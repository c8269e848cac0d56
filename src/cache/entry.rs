//! Cache entry persisted per URI

use crate::types::JsonValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last known validator and body for one URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key
    pub uri: String,
    /// Opaque validator token (e.g. an ETag), stored verbatim
    pub validator: String,
    /// Serialized JSON body; `None` for a partial entry
    #[serde(default)]
    pub body: Option<String>,
    /// Time of the last write (informational only)
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time
    pub fn new(uri: impl Into<String>, validator: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            validator: validator.into(),
            body: Some(body.into()),
            stored_at: Utc::now(),
        }
    }

    /// Parsed body, or `None` when the body is missing or not valid JSON
    pub fn json_body(&self) -> Option<JsonValue> {
        let body = self.body.as_deref()?;
        if body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_body() {
        let entry = CacheEntry::new("/r", "\"abc\"", r#"{"v":1}"#);
        assert_eq!(entry.json_body(), Some(json!({"v": 1})));
    }

    #[test]
    fn test_corrupt_or_partial_body() {
        let mut entry = CacheEntry::new("/r", "\"abc\"", "{not json");
        assert!(entry.json_body().is_none());

        entry.body = None;
        assert!(entry.json_body().is_none());

        entry.body = Some(String::new());
        assert!(entry.json_body().is_none());
    }

    #[test]
    fn test_null_body_is_usable() {
        let entry = CacheEntry::new("/r", "x", "null");
        assert_eq!(entry.json_body(), Some(JsonValue::Null));
    }
}
