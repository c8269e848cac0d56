//! Status classification
//!
//! The cache and the paginator only need to know which of three disjoint
//! classes a status falls in. The numeric binding lives here, per transport.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Class of a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Fresh, usable response
    Success,
    /// Cached representation is still current
    NotModified,
    /// Anything else (client/server errors, redirects, ...)
    Other,
}

/// Numeric binding of the status classes for one transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusClasses {
    /// First success status (inclusive)
    pub success_min: u16,
    /// Last success status (inclusive)
    pub success_max: u16,
    /// "Not modified" status
    pub not_modified: u16,
    /// Status reported for a resource served from the cache
    pub ok: u16,
}

impl Default for StatusClasses {
    fn default() -> Self {
        Self {
            success_min: 200,
            success_max: 299,
            not_modified: 304,
            ok: 200,
        }
    }
}

impl StatusClasses {
    /// Create a status binding
    pub fn new(success: RangeInclusive<u16>, not_modified: u16, ok: u16) -> Self {
        Self {
            success_min: *success.start(),
            success_max: *success.end(),
            not_modified,
            ok,
        }
    }

    /// Only `200` counts as success
    pub fn strict() -> Self {
        Self::new(200..=200, 304, 200)
    }

    /// Classify a status
    pub fn classify(&self, status: u16) -> StatusClass {
        if status == self.not_modified {
            StatusClass::NotModified
        } else if (self.success_min..=self.success_max).contains(&status) {
            StatusClass::Success
        } else {
            StatusClass::Other
        }
    }

    /// Whether the status is in the success class
    pub fn is_success(&self, status: u16) -> bool {
        self.classify(status) == StatusClass::Success
    }
}
