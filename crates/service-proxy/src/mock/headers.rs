//! Request and response header layers.
//!
//! Request headers are composed from three layers, later layers winning:
//! JSON defaults, instance-global request headers, per-call headers.
//! Response headers start from the global response headers and let the
//! response's own headers override them.

use crate::service::{HttpHeaders, ServiceResponse};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

const CONTENT_TYPE: &str = "content-type";
const ACCEPT: &str = "accept";
const APPLICATION_JSON: &str = "application/json";

/// Static header value or a producer evaluated on every response.
#[derive(Clone)]
pub enum HeaderValueSource {
    Static(String),
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl HeaderValueSource {
    pub fn dynamic<F>(producer: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        HeaderValueSource::Dynamic(Arc::new(producer))
    }

    pub fn resolve(&self) -> String {
        match self {
            HeaderValueSource::Static(value) => value.clone(),
            HeaderValueSource::Dynamic(producer) => producer(),
        }
    }
}

impl From<&str> for HeaderValueSource {
    fn from(value: &str) -> Self {
        HeaderValueSource::Static(value.to_string())
    }
}

impl From<String> for HeaderValueSource {
    fn from(value: String) -> Self {
        HeaderValueSource::Static(value)
    }
}

impl std::fmt::Debug for HeaderValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderValueSource::Static(value) => f.debug_tuple("Static").field(value).finish(),
            HeaderValueSource::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Headers merged into every produced response.
#[derive(Debug, Default)]
pub struct GlobalResponseHeaders {
    headers: RwLock<HashMap<String, HeaderValueSource>>,
}

impl GlobalResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, name: impl Into<String>, value: impl Into<HeaderValueSource>) {
        self.headers.write().insert(name.into(), value.into());
    }

    /// Entries as they stand now. Later `add` calls do not reach the copy.
    pub fn snapshot(&self) -> ResponseHeaderSet {
        ResponseHeaderSet {
            entries: self.headers.read().clone(),
        }
    }

    pub fn resolve(&self) -> HttpHeaders {
        self.snapshot().resolve()
    }

    pub fn apply(&self, response: &mut ServiceResponse) {
        self.snapshot().apply(response);
    }
}

/// Point-in-time copy of the global response headers for one dispatch.
#[derive(Debug, Clone, Default)]
pub struct ResponseHeaderSet {
    entries: HashMap<String, HeaderValueSource>,
}

impl ResponseHeaderSet {
    /// Evaluate every header, calling producers once each.
    pub fn resolve(&self) -> HttpHeaders {
        self.entries
            .iter()
            .map(|(name, value)| (name.clone(), value.resolve()))
            .collect()
    }

    /// Merge into `response`, keeping the response's own values on conflict.
    pub fn apply(&self, response: &mut ServiceResponse) {
        let mut merged = self.resolve();
        merged.extend(response.headers.drain());
        response.headers = merged;
    }
}

/// Headers sent with every request made through a proxy instance.
#[derive(Debug, Default)]
pub struct GlobalRequestHeaders {
    headers: RwLock<HttpHeaders>,
}

impl GlobalRequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.write().insert(name.into(), value.into());
    }

    pub fn snapshot(&self) -> HttpHeaders {
        self.headers.read().clone()
    }
}

/// Effective request headers for one call.
///
/// `content-type` and `accept` default to JSON unless the per-call headers
/// name them (in any letter case).
pub fn compose_request_headers(global: &HttpHeaders, per_call: &HttpHeaders) -> HttpHeaders {
    let overridden = |wanted: &str| per_call.keys().any(|name| name.eq_ignore_ascii_case(wanted));

    let mut headers = HttpHeaders::new();
    if !overridden(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
    }
    if !overridden(ACCEPT) {
        headers.insert(ACCEPT.to_string(), APPLICATION_JSON.to_string());
    }
    headers.extend(global.iter().map(|(k, v)| (k.clone(), v.clone())));
    headers.extend(per_call.iter().map(|(k, v)| (k.clone(), v.clone())));
    headers
}
