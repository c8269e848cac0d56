//! Raw JSON-over-HTTP transport
//!
//! Provides the reqwest-backed [`Transport`] at the bottom of the decorator
//! chain. It handles:
//! - Retries with configurable backoff for throttling and server errors
//! - Rate limiting to stay inside the API quota
//! - Credential application
//! - Response body parsing into [`Resource`]
//!
//! Every status is returned as a resource; interpreting it is the caller's job.

use super::headers::{names, Headers};
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::resource::Resource;
use super::status::StatusClasses;
use super::transport::{Request, Transport};
use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::types::{BackoffType, JsonValue, Method};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for relative request URIs
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests (request headers win on conflict)
    pub default_headers: Headers,
    /// User agent string
    pub user_agent: String,
    /// Status binding for this transport
    pub statuses: StatusClasses,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: Headers::new(),
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
            statuses: StatusClasses::default(),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.config.default_headers.append(key, value);
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set the status binding
    pub fn statuses(mut self, statuses: StatusClasses) -> Self {
        self.config.statuses = statuses;
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// reqwest-backed transport with retry and rate limiting
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: Arc<HttpClientConfig>,
    credentials: Credentials,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config: Arc::new(config),
            credentials: Credentials::None,
            rate_limiter,
        })
    }

    /// Create a client bound to a credential
    pub fn with_credentials(config: HttpClientConfig, credentials: Credentials) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.credentials = credentials;
        Ok(client)
    }

    /// Client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Bound credential
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff * factor
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }

    /// Request headers first, then defaults for names the request did not set
    fn outgoing_headers(&self, request: &Request) -> Headers {
        let mut headers = self.config.default_headers.clone();
        let requested = request.evaluate_headers();
        for (name, _) in requested.iter() {
            headers.remove(name);
        }
        headers.merge(&requested);
        headers
    }

    fn should_retry_status(&self, method: Method, status: StatusCode, attempt: u32) -> bool {
        if attempt >= self.config.max_retries {
            return false;
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return true;
        }
        // A write that reached the server may have been applied; only reads retry on 5xx.
        !method.is_write() && is_retryable_status(status)
    }

    fn retry_delay(&self, response: &Response, attempt: u32) -> Duration {
        match extract_retry_after(response) {
            Some(seconds) => std::cmp::min(Duration::from_secs(seconds), self.config.max_backoff),
            None => self.calculate_backoff(attempt),
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: Request) -> Result<Resource> {
        let url = self.build_url(&request.uri);
        let method: reqwest::Method = request.method.into();
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let headers = self.outgoing_headers(&request).to_header_map()?;
            let mut req = self
                .client
                .request(method.clone(), &url)
                .headers(headers)
                .timeout(self.config.timeout);

            if let Some(ref body) = request.body {
                req = req.json(body);
            }

            req = self.credentials.apply(req);

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if self.should_retry_status(request.method, status, attempt) {
                        let delay = self.retry_delay(&response, attempt);
                        warn!(
                            "{} {} returned {}, attempt {}/{}, retrying in {:?}",
                            request.method,
                            url,
                            status.as_u16(),
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    debug!("{} {} -> {}", request.method, url, status.as_u16());
                    return read_resource(response).await;
                }
                Err(e) => {
                    // A write that never connected cannot have been applied.
                    let unsent = e.is_connect();
                    let err = if e.is_timeout() {
                        Error::Timeout {
                            timeout_ms: self.config.timeout.as_millis() as u64,
                        }
                    } else {
                        Error::Http(e)
                    };

                    let retryable =
                        err.is_retryable() && (unsent || !request.method.is_write());
                    if retryable && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "{} {} failed ({}), attempt {}/{}, retrying in {:?}",
                            request.method,
                            url,
                            err,
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(err);
                }
            }
        }
    }

    fn statuses(&self) -> &StatusClasses {
        &self.config.statuses
    }

    fn authenticated(&self, credentials: Credentials) -> Arc<dyn Transport> {
        // Quotas are per credential, so the new binding gets its own bucket.
        Arc::new(Self {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            credentials,
            rate_limiter: self.config.rate_limit.as_ref().map(RateLimiter::new),
        })
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Read a response into a resource
async fn read_resource(response: Response) -> Result<Resource> {
    let status = response.status().as_u16();
    let headers = Headers::from(response.headers());
    let text = response.text().await?;
    Ok(Resource::new(status, headers, parse_body(&text)))
}

/// Parse a response body; empty is `null`, non-JSON is kept as a string
pub(crate) fn parse_body(text: &str) -> JsonValue {
    if text.trim().is_empty() {
        return JsonValue::Null;
    }
    match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            debug!("Response body is not JSON ({e}), keeping raw text");
            JsonValue::String(text.to_string())
        }
    }
}

/// Check if an HTTP status is retryable
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status.as_u16(),
        429 | 500 | 502 | 503 | 504 | 520 | 521 | 522 | 523 | 524
    )
}

/// Extract retry-after header value in seconds
fn extract_retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(names::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
