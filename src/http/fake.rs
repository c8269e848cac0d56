//! Scripted in-process transport for unit tests

use super::headers::Headers;
use super::resource::Resource;
use super::status::StatusClasses;
use super::transport::{Request, Transport};
use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::types::{JsonValue, Method};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Reply {
    Resource(Resource),
    Timeout,
}

/// A request as the transport saw it
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: Method,
    pub uri: String,
    pub headers: Headers,
    pub body: Option<JsonValue>,
    pub credentials: Credentials,
}

#[derive(Debug, Default)]
struct Script {
    routes: HashMap<String, VecDeque<Reply>>,
    calls: Vec<RecordedCall>,
}

/// Replies are queued per URI; the last reply of a queue repeats forever.
/// Unknown URIs answer 404.
#[derive(Debug, Clone)]
pub(crate) struct FakeTransport {
    script: Arc<Mutex<Script>>,
    statuses: StatusClasses,
    credentials: Credentials,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            statuses: StatusClasses::default(),
            credentials: Credentials::None,
        }
    }

    pub fn with_statuses(mut self, statuses: StatusClasses) -> Self {
        self.statuses = statuses;
        self
    }

    pub fn reply(&self, uri: &str, resource: Resource) -> &Self {
        self.push(uri, Reply::Resource(resource));
        self
    }

    pub fn timeout(&self, uri: &str) -> &Self {
        self.push(uri, Reply::Timeout);
        self
    }

    fn push(&self, uri: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .routes
            .entry(uri.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().unwrap().calls.len()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls().pop().expect("no call recorded")
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: Request) -> Result<Resource> {
        let headers = request.evaluate_headers();
        let mut script = self.script.lock().unwrap();
        script.calls.push(RecordedCall {
            method: request.method,
            uri: request.uri.clone(),
            headers,
            body: request.body.clone(),
            credentials: self.credentials.clone(),
        });

        let reply = match script.routes.get_mut(&request.uri) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match reply {
            Some(Reply::Resource(resource)) => Ok(resource),
            Some(Reply::Timeout) => Err(Error::Timeout { timeout_ms: 30_000 }),
            None => Ok(Resource::with_body(
                404,
                serde_json::json!({"message": "Not Found"}),
            )),
        }
    }

    fn statuses(&self) -> &StatusClasses {
        &self.statuses
    }

    fn authenticated(&self, credentials: Credentials) -> Arc<dyn Transport> {
        Arc::new(Self {
            script: Arc::clone(&self.script),
            statuses: self.statuses.clone(),
            credentials,
        })
    }
}
