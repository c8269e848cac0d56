//! Error types for gitrest
//!
//! This module defines the error hierarchy for the whole access layer.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Non-success HTTP statuses are *not* errors at the transport or cache
//! level: they come back as a [`crate::http::Resource`] carrying the status.
//! Only the paginator turns an unexpected status into an error.

use thiserror::Error;

/// The main error type for gitrest
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Undefined environment variable in config: {variable}")]
    UndefinedVariable { variable: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    // ============================================================================
    // Validator Store Errors
    // ============================================================================
    #[error("Validator store error: {message}")]
    Store { message: String },

    #[error("DuckDB error: {0}")]
    Database(#[from] duckdb::Error),

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error("Unexpected HTTP {status} while paginating {uri}")]
    UnexpectedStatus { uri: String, status: u16 },

    #[error("Pagination loop: next link of {uri} points back to itself")]
    PaginationLoop { uri: String },

    #[error("No such element: the page sequence is exhausted")]
    NoSuchElement,

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create an invalid header error
    pub fn invalid_header(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a validator store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an unexpected status error
    pub fn unexpected_status(uri: impl Into<String>, status: u16) -> Self {
        Self::UnexpectedStatus {
            uri: uri.into(),
            status,
        }
    }

    /// Check if this error is retryable by the raw transport
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Check if this is the "no such element" condition of an exhausted sequence
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, Error::NoSuchElement)
    }
}

/// Result type alias for gitrest
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::unexpected_status("https://api.github.com/repos/a/b/issues", 404);
        assert_eq!(
            err.to_string(),
            "Unexpected HTTP 404 while paginating https://api.github.com/repos/a/b/issues"
        );

        let err = Error::store("disk full");
        assert_eq!(err.to_string(), "Validator store error: disk full");
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::Timeout { timeout_ms: 1000 }.is_retryable());

        assert!(!Error::NoSuchElement.is_retryable());
        assert!(!Error::unexpected_status("/p", 500).is_retryable());
        assert!(!Error::config("test").is_retryable());
    }

    #[test]
    fn test_no_such_element() {
        assert!(Error::NoSuchElement.is_no_such_element());
        assert!(!Error::store("x").is_no_such_element());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
