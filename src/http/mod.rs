//! HTTP resource access
//!
//! Provides the transport abstraction and the raw reqwest-backed client at
//! the bottom of the decorator chain.
//!
//! # Features
//!
//! - **Resource**: immutable response value (status, headers, JSON body)
//! - **Headers**: case-insensitive multimap with lazy per-attempt suppliers
//! - **Transport**: trait implemented by the raw client and every decorator
//! - **Status classes**: configurable success / not-modified / other binding
//! - **Rate Limiting**: Token bucket rate limiter using governor

mod client;
mod headers;
mod rate_limit;
mod resource;
mod status;
mod transport;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use headers::{names, no_headers, static_headers, HeaderSupplier, Headers};
pub use rate_limit::{QuotaPeriod, RateLimiter, RateLimiterConfig};
pub use resource::Resource;
pub use status::{StatusClass, StatusClasses};
pub use transport::{Request, Transport};

#[cfg(test)]
pub(crate) mod fake;
