//! Transport abstraction
//!
//! Every layer (raw client, conditional cache, any future decorator)
//! implements [`Transport`] and wraps another `Arc<dyn Transport>`.

use super::headers::{names, no_headers, static_headers, HeaderSupplier, Headers};
use super::resource::Resource;
use super::status::StatusClasses;
use crate::auth::Credentials;
use crate::error::Result;
use crate::types::{JsonValue, Method};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Outbound request
#[derive(Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Target URI (absolute, or relative to the client's base URL)
    pub uri: String,
    /// Header producer, evaluated per attempt
    pub headers: HeaderSupplier,
    /// Optional JSON body
    pub body: Option<JsonValue>,
}

impl Request {
    /// Create a request without headers or body
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: no_headers(),
            body: None,
        }
    }

    /// Create a GET request
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Set the header producer
    #[must_use]
    pub fn headers(mut self, headers: HeaderSupplier) -> Self {
        self.headers = headers;
        self
    }

    /// Set fixed headers
    #[must_use]
    pub fn static_headers(self, headers: Headers) -> Self {
        self.headers(static_headers(headers))
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header on top of whatever the current producer yields.
    ///
    /// The original producer is still evaluated lazily; the extra header is
    /// appended to its output on every evaluation.
    #[must_use]
    pub fn with_extra_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let inner = Arc::clone(&self.headers);
        let name = name.to_string();
        let value = value.into();
        self.headers = Arc::new(move || {
            let mut headers = inner();
            headers.append(&name, value.clone());
            headers
        });
        self
    }

    /// Mark the request as no-cache
    #[must_use]
    pub fn no_cache(self) -> Self {
        self.with_extra_header(names::CACHE_CONTROL, "no-cache")
    }

    /// Evaluate the header producer
    pub fn evaluate_headers(&self) -> Headers {
        (self.headers)()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("has_body", &self.body.is_some())
            .finish_non_exhaustive()
    }
}

/// JSON-over-HTTP transport
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Perform a request and return the response, whatever its status
    async fn execute(&self, request: Request) -> Result<Resource>;

    /// Status binding used to interpret responses of this transport
    fn statuses(&self) -> &StatusClasses;

    /// Same transport bound to another credential
    fn authenticated(&self, credentials: Credentials) -> Arc<dyn Transport>;

    /// GET a resource
    async fn get(&self, uri: &str, headers: HeaderSupplier) -> Result<Resource> {
        self.execute(Request::get(uri).headers(headers)).await
    }

    /// POST a JSON body
    async fn post(&self, uri: &str, headers: HeaderSupplier, body: JsonValue) -> Result<Resource> {
        self.execute(Request::new(Method::POST, uri).headers(headers).json(body))
            .await
    }

    /// PUT a JSON body
    async fn put(&self, uri: &str, headers: HeaderSupplier, body: JsonValue) -> Result<Resource> {
        self.execute(Request::new(Method::PUT, uri).headers(headers).json(body))
            .await
    }

    /// PATCH with a JSON body
    async fn patch(&self, uri: &str, headers: HeaderSupplier, body: JsonValue) -> Result<Resource> {
        self.execute(Request::new(Method::PATCH, uri).headers(headers).json(body))
            .await
    }

    /// DELETE a resource
    async fn delete(&self, uri: &str, headers: HeaderSupplier) -> Result<Resource> {
        self.execute(Request::new(Method::DELETE, uri).headers(headers))
            .await
    }
}
