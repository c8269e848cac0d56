//! Immutable HTTP response value

use super::headers::Headers;
use crate::types::JsonValue;

/// One HTTP response: status, headers and parsed JSON body
#[derive(Debug, Clone)]
pub struct Resource {
    status: u16,
    headers: Headers,
    body: JsonValue,
}

impl Resource {
    /// Create a new resource
    pub fn new(status: u16, headers: Headers, body: JsonValue) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Resource with no headers
    pub fn with_body(status: u16, body: JsonValue) -> Self {
        Self::new(status, Headers::new(), body)
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Parsed body
    pub fn body(&self) -> &JsonValue {
        &self.body
    }

    /// Body serialized back to JSON text
    pub fn body_text(&self) -> String {
        self.body.to_string()
    }

    /// Consume into the body
    pub fn into_body(self) -> JsonValue {
        self.body
    }

    /// Consume into the elements of the body: an array is flattened,
    /// `null` yields nothing, anything else is a single element
    pub fn into_items(self) -> Vec<JsonValue> {
        match self.body {
            JsonValue::Array(items) => items,
            JsonValue::Null => Vec::new(),
            other => vec![other],
        }
    }

    /// Same headers, substituted status and body.
    ///
    /// Used to turn a "not modified" reply into the usable resource the caller
    /// asked for.
    #[must_use]
    pub fn revalidated(&self, status: u16, body: JsonValue) -> Self {
        Self {
            status,
            headers: self.headers.clone(),
            body,
        }
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status
            && self.headers == other.headers
            && self.body_text() == other.body_text()
    }
}

impl Eq for Resource {}
