//! Common types used throughout gitrest
//!
//! Shared type definitions and aliases used by the transport, cache and
//! pagination layers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl Method {
    /// Whether the method can modify server state
    pub fn is_write(self) -> bool {
        !matches!(self, Method::GET)
    }

    /// Upper-case method name
    pub fn as_str(self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::PATCH => reqwest::Method::PATCH,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_conversion() {
        let get: reqwest::Method = Method::GET.into();
        assert_eq!(reqwest::Method::GET, get);
        let patch: reqwest::Method = Method::PATCH.into();
        assert_eq!(reqwest::Method::PATCH, patch);
    }

    #[test]
    fn test_method_default() {
        assert_eq!(Method::default(), Method::GET);
    }

    #[test]
    fn test_method_is_write() {
        assert!(!Method::GET.is_write());
        assert!(Method::POST.is_write());
        assert!(Method::DELETE.is_write());
    }

    #[test]
    fn test_backoff_serde() {
        let backoff: BackoffType = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(backoff, BackoffType::Linear);

        let json = serde_json::to_string(&Method::PUT).unwrap();
        assert_eq!(json, "\"PUT\"");
    }
}
