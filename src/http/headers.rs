//! Case-insensitive header multimap
//!
//! Servers and intermediaries vary header casing (`ETag`, `etag`, `Etag`), so
//! every lookup goes through lower-cased keys. Values keep their original
//! text and order.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Standard header names used by the access layer
pub mod names {
    pub const ETAG: &str = "ETag";
    pub const IF_NONE_MATCH: &str = "If-None-Match";
    pub const CACHE_CONTROL: &str = "Cache-Control";
    pub const LINK: &str = "Link";
    pub const RETRY_AFTER: &str = "Retry-After";
}

/// Lazily evaluated header producer, re-run for every request attempt
pub type HeaderSupplier = Arc<dyn Fn() -> Headers + Send + Sync>;

/// Header supplier that always produces the given headers
pub fn static_headers(headers: Headers) -> HeaderSupplier {
    Arc::new(move || headers.clone())
}

/// Header supplier producing no headers
pub fn no_headers() -> HeaderSupplier {
    Arc::new(Headers::new)
}

/// Mapping from case-insensitive header name to ordered values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, Vec<String>>,
}

impl Headers {
    /// Create an empty header map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append
    #[must_use]
    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    /// Add a value, keeping values already present under the same name
    pub fn append(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .entry(normalize(name.as_ref()))
            .or_default()
            .push(value.into());
    }

    /// Replace all values of a header
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(normalize(name.as_ref()), vec![value.into()]);
    }

    /// Remove a header, returning its values
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.entries.remove(&normalize(name))
    }

    /// All values of a header
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries.get(&normalize(name)).map(Vec::as_slice)
    }

    /// First value of a header
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)?.first().map(String::as_str)
    }

    /// Whether a header is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize(name))
    }

    /// Append every value of `other`; existing values are kept
    pub fn merge(&mut self, other: &Headers) {
        for (name, values) in &other.entries {
            self.entries
                .entry(name.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }

    /// Whether any `Cache-Control` value carries a `no-cache` directive
    pub fn requests_no_cache(&self) -> bool {
        self.get(names::CACHE_CONTROL).is_some_and(|values| {
            values
                .iter()
                .any(|v| v.to_ascii_lowercase().contains("no-cache"))
        })
    }

    /// Iterate over `(lower-cased name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }

    /// Number of distinct header names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no header is present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert into a reqwest header map
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in self.iter() {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_header(name, e.to_string()))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| Error::invalid_header(name, e.to_string()))?;
            map.append(header, value);
        }
        Ok(map)
    }
}

impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Self {
        let mut headers = Headers::new();
        for (name, value) in map {
            // Non-UTF-8 values are kept lossily; no header we interpret carries them.
            headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        headers
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("etag" ; "lower")]
    #[test_case("ETag" ; "canonical")]
    #[test_case("ETAG" ; "upper")]
    fn test_lookup_ignores_case(name: &str) {
        let headers = Headers::new().with(name, "\"abc\"");
        assert_eq!(headers.first("ETag"), Some("\"abc\""));
        assert_eq!(headers.first("etag"), Some("\"abc\""));
        assert!(headers.contains("ETAG"));
    }

    #[test]
    fn test_append_keeps_order() {
        let mut headers = Headers::new();
        headers.append("Accept", "application/json");
        headers.append("accept", "text/plain");
        assert_eq!(
            headers.get("ACCEPT").unwrap(),
            &["application/json".to_string(), "text/plain".to_string()]
        );
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_insert_replaces() {
        let mut headers = Headers::new().with("X-Token", "a").with("x-token", "b");
        headers.insert("X-TOKEN", "c");
        assert_eq!(headers.get("x-token").unwrap(), &["c".to_string()]);
    }

    #[test]
    fn test_merge_is_additive() {
        let mut headers = Headers::new().with("Accept", "application/json");
        headers.merge(&Headers::new().with("If-None-Match", "\"v1\"").with("accept", "*/*"));
        assert_eq!(headers.get("accept").unwrap().len(), 2);
        assert_eq!(headers.first("if-none-match"), Some("\"v1\""));
    }

    #[test_case("no-cache", true ; "plain")]
    #[test_case("No-Cache", true ; "mixed case")]
    #[test_case("max-age=0, NO-CACHE", true ; "among directives")]
    #[test_case("max-age=60", false ; "other directive")]
    fn test_requests_no_cache(value: &str, expected: bool) {
        let headers = Headers::new().with("cache-control", value);
        assert_eq!(headers.requests_no_cache(), expected);
    }

    #[test]
    fn test_no_cache_absent() {
        assert!(!Headers::new().requests_no_cache());
    }

    #[test]
    fn test_header_map_conversion() {
        let headers = Headers::new()
            .with("Link", "<https://x/p?page=2>; rel=\"next\"")
            .with("ETag", "W/\"1\"");
        let map = headers.to_header_map().unwrap();
        assert_eq!(map.get("etag").unwrap(), "W/\"1\"");

        let back = Headers::from(&map);
        assert_eq!(back, headers);
    }

    #[test]
    fn test_invalid_header_name() {
        let headers = Headers::new().with("bad header", "x");
        assert!(matches!(
            headers.to_header_map(),
            Err(Error::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_static_supplier_reevaluates() {
        let supplier = static_headers(Headers::new().with("A", "1"));
        assert_eq!(supplier().first("a"), Some("1"));
        assert_eq!(supplier().first("a"), Some("1"));
        assert!(no_headers()().is_empty());
    }
}
