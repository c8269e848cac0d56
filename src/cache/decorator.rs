//! Conditional cache decorator
//!
//! Wraps a transport and revalidates GET requests against the last known
//! validator:
//!
//! ```text
//! caller ──GET /r──▶ CachingTransport ──GET /r + If-None-Match──▶ inner
//!                         │   ▲                                     │
//!                 lookup  │   │ put (fresh 2xx with validator)      │
//!                         ▼   │                                     │
//!                    ValidatorStore ◀── not modified: cached body ◀─┘
//! ```
//!
//! Writes pass through untouched and never invalidate entries; callers that
//! need a fresh read after a write send `Cache-Control: no-cache`.
//!
//! Entries are keyed by the request URI exactly as the caller wrote it, before
//! the inner transport resolves it against any base URL. `/r`, `r` and
//! `https://host/r` are three separate entries.

use super::store::SharedStore;
use crate::auth::Credentials;
use crate::error::Result;
use crate::http::{names, Request, Resource, StatusClass, StatusClasses, Transport};
use crate::types::JsonValue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Header names carrying the validator in each direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorHeaders {
    /// Response header holding the validator
    pub validator: String,
    /// Request header echoing it back
    pub conditional: String,
}

impl Default for ValidatorHeaders {
    fn default() -> Self {
        Self {
            validator: names::ETAG.to_string(),
            conditional: names::IF_NONE_MATCH.to_string(),
        }
    }
}

/// Transport decorator adding validator-based conditional GETs
#[derive(Debug, Clone)]
pub struct CachingTransport {
    inner: Arc<dyn Transport>,
    store: SharedStore,
    headers: ValidatorHeaders,
}

impl CachingTransport {
    /// Wrap a transport, caching into the given store
    pub fn new(inner: Arc<dyn Transport>, store: SharedStore) -> Self {
        Self {
            inner,
            store,
            headers: ValidatorHeaders::default(),
        }
    }

    /// Use other validator header names
    #[must_use]
    pub fn with_validator_headers(mut self, headers: ValidatorHeaders) -> Self {
        self.headers = headers;
        self
    }

    /// The shared store
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// The wrapped transport
    pub fn inner(&self) -> &Arc<dyn Transport> {
        &self.inner
    }

    /// Usable `(validator, body)` for a URI.
    ///
    /// Read failures and entries without a parsable body are misses.
    async fn usable_entry(&self, uri: &str) -> Option<(String, JsonValue)> {
        let entry = match self.store.get(uri).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!("Validator store read failed for {uri}, fetching unconditionally: {e}");
                return None;
            }
        };

        match entry.json_body() {
            Some(body) => Some((entry.validator, body)),
            None => {
                warn!("Ignoring cache entry for {uri} without a usable body");
                None
            }
        }
    }

    async fn conditional_get(&self, request: Request) -> Result<Resource> {
        if request.evaluate_headers().requests_no_cache() {
            debug!("GET {} bypasses the cache (no-cache)", request.uri);
            return self.inner.execute(request).await;
        }

        // Key is the caller's URI, unresolved.
        let uri = request.uri.clone();
        let cached = self.usable_entry(&uri).await;
        let request = match &cached {
            Some((validator, _)) => {
                debug!("GET {uri} revalidating {validator}");
                request.with_extra_header(&self.headers.conditional, validator.clone())
            }
            None => request,
        };

        let resource = self.inner.execute(request).await?;
        let statuses = self.inner.statuses();

        match statuses.classify(resource.status()) {
            StatusClass::NotModified => match cached {
                Some((_, body)) => {
                    debug!("GET {uri} not modified, serving cached body");
                    Ok(resource.revalidated(statuses.ok, body))
                }
                // Nothing of ours was revalidated; hand the reply back as-is.
                None => Ok(resource),
            },
            StatusClass::Success => {
                self.remember(&uri, &resource).await;
                Ok(resource)
            }
            StatusClass::Other => Ok(resource),
        }
    }

    async fn remember(&self, uri: &str, resource: &Resource) {
        let Some(validator) = resource.headers().first(&self.headers.validator) else {
            return;
        };

        match self
            .store
            .put(uri, validator, &resource.body_text())
            .await
        {
            Ok(_) => debug!("GET {uri} stored validator {validator}"),
            Err(e) => warn!("Failed to store validator for {uri}: {e}"),
        }
    }
}

#[async_trait]
impl Transport for CachingTransport {
    async fn execute(&self, request: Request) -> Result<Resource> {
        if request.method.is_write() {
            return self.inner.execute(request).await;
        }
        self.conditional_get(request).await
    }

    fn statuses(&self) -> &StatusClasses {
        self.inner.statuses()
    }

    fn authenticated(&self, credentials: Credentials) -> Arc<dyn Transport> {
        Arc::new(Self {
            inner: self.inner.authenticated(credentials),
            store: Arc::clone(&self.store),
            headers: self.headers.clone(),
        })
    }
}
