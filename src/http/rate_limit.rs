//! Client-side request throttling
//!
//! Git-hosting APIs enforce quotas per credential (GitHub: 5000 requests per
//! hour for a token). The raw transport waits on this token bucket before
//! every attempt so a long pagination run does not burn the quota in bursts.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Period over which the request quota is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaPeriod {
    /// Requests per second
    #[default]
    Second,
    /// Requests per minute
    Minute,
    /// Requests per hour
    Hour,
}

/// Configuration for rate limiting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Requests allowed per period
    pub requests: u32,
    /// Quota period
    #[serde(default)]
    pub per: QuotaPeriod,
    /// Burst size (max tokens in bucket)
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests: 10,
            per: QuotaPeriod::Second,
            burst_size: 10,
        }
    }
}

impl RateLimiterConfig {
    /// Per-second quota
    pub fn per_second(requests: u32, burst_size: u32) -> Self {
        Self {
            requests,
            per: QuotaPeriod::Second,
            burst_size,
        }
    }

    /// Per-hour quota
    pub fn per_hour(requests: u32, burst_size: u32) -> Self {
        Self {
            requests,
            per: QuotaPeriod::Hour,
            burst_size,
        }
    }

    /// Authenticated GitHub REST quota
    pub fn github() -> Self {
        Self::per_hour(5000, 100)
    }

    fn quota(&self) -> Quota {
        let requests = NonZeroU32::new(self.requests).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(NonZeroU32::MIN);
        let quota = match self.per {
            QuotaPeriod::Second => Quota::per_second(requests),
            QuotaPeriod::Minute => Quota::per_minute(requests),
            QuotaPeriod::Hour => Quota::per_hour(requests),
        };
        quota.allow_burst(burst)
    }
}

/// Token bucket rate limiter, shared by clones
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            limiter: Arc::new(Governor::direct(config.quota())),
        }
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to acquire a permit, returning immediately
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Wait with a timeout
    pub async fn wait_with_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.limiter.until_ready())
            .await
            .is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}
