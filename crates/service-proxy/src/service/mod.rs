//! The service proxy contract.
//!
//! Real transport adapters and the mock engine implement [`ServiceProxy`];
//! callers usually go through the typed helpers on [`ServiceProxyExt`].
//!
//! ## Module Structure
//!
//! - `event`: multicast notification of completed calls
//! - `connectivity`: online/offline status collaborator

pub mod connectivity;
pub mod event;

use crate::error::ProxyError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub use connectivity::{ConnectionStatus, ConnectivityMonitor, MockConnectivityMonitor};
pub use event::{ResponseEvent, ResponseListener};

/// Header name to header value.
pub type HttpHeaders = HashMap<String, String>;

/// Operation type of a route, the CRUD dimension of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Create,
    Read,
    Update,
    Patch,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 5] = [
        Verb::Create,
        Verb::Read,
        Verb::Update,
        Verb::Patch,
        Verb::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Read => "read",
            Verb::Update => "update",
            Verb::Patch => "patch",
            Verb::Delete => "delete",
        }
    }

    /// HTTP method a transport would use for this verb.
    pub fn http_method(&self) -> &'static str {
        match self {
            Verb::Create => "POST",
            Verb::Read => "GET",
            Verb::Update => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    /// Accepts verb names and their HTTP methods, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" | "post" => Ok(Verb::Create),
            "read" | "get" => Ok(Verb::Read),
            "update" | "put" => Ok(Verb::Update),
            "patch" => Ok(Verb::Patch),
            "delete" => Ok(Verb::Delete),
            _ => Err(format!("Unknown operation type: {s}")),
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceCallOptions {
    /// Request headers for this call only; they win over every other layer.
    pub headers: HttpHeaders,
    /// When false the resolved body is handed back as raw text.
    pub deserialize_response: bool,
    /// When false transports send the body without encoding it first.
    pub serialize_request: bool,
}

impl Default for ServiceCallOptions {
    fn default() -> Self {
        Self {
            headers: HttpHeaders::new(),
            deserialize_response: true,
            serialize_request: true,
        }
    }
}

impl ServiceCallOptions {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn raw_response(mut self) -> Self {
        self.deserialize_response = false;
        self
    }
}

/// A completed call as seen by observers and the call log.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub status: u16,
    pub response_body: Value,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HttpHeaders,
}

impl ServiceResponse {
    pub fn new(status: u16, response_body: Value) -> Self {
        Self {
            status,
            response_body,
            headers: HttpHeaders::new(),
        }
    }

    pub fn ok(response_body: Value) -> Self {
        Self::new(200, response_body)
    }

    pub fn no_content() -> Self {
        Self::new(204, Value::Null)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Statuses of 400 and above are failures, everything below is success.
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Abstract dispatch contract shared by transports and the mock engine.
#[async_trait]
pub trait ServiceProxy: Send + Sync {
    /// Perform one call and resolve with the response body.
    async fn dispatch(
        &self,
        verb: Verb,
        path: &str,
        body: Option<Value>,
        options: &ServiceCallOptions,
    ) -> Result<Value, ProxyError>;

    /// Observers of every completed call.
    fn response_event(&self) -> &ResponseEvent;
}

/// Typed helpers over [`ServiceProxy::dispatch`].
#[async_trait]
pub trait ServiceProxyExt: ServiceProxy {
    /// Dispatch with explicit options and decode the resolved body into `T`.
    async fn call<T>(
        &self,
        verb: Verb,
        path: &str,
        body: Option<Value>,
        options: &ServiceCallOptions,
    ) -> Result<T, ProxyError>
    where
        T: DeserializeOwned + Send,
    {
        let value = self.dispatch(verb, path, body, options).await?;
        serde_json::from_value(value).map_err(|source| ProxyError::Serialization {
            path: path.to_string(),
            source,
        })
    }

    async fn create<D, T>(&self, path: &str, data: &D) -> Result<T, ProxyError>
    where
        D: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        let body = encode_body(path, data)?;
        self.call(Verb::Create, path, Some(body), &ServiceCallOptions::default())
            .await
    }

    async fn read<T>(&self, path: &str) -> Result<T, ProxyError>
    where
        T: DeserializeOwned + Send,
    {
        self.call(Verb::Read, path, None, &ServiceCallOptions::default())
            .await
    }

    async fn update<D, T>(&self, path: &str, data: &D) -> Result<T, ProxyError>
    where
        D: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        let body = encode_body(path, data)?;
        self.call(Verb::Update, path, Some(body), &ServiceCallOptions::default())
            .await
    }

    async fn patch<D, T>(&self, path: &str, data: &D) -> Result<T, ProxyError>
    where
        D: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        let body = encode_body(path, data)?;
        self.call(Verb::Patch, path, Some(body), &ServiceCallOptions::default())
            .await
    }

    async fn delete<T>(&self, path: &str) -> Result<T, ProxyError>
    where
        T: DeserializeOwned + Send,
    {
        self.call(Verb::Delete, path, None, &ServiceCallOptions::default())
            .await
    }

    /// Delete carrying a request body.
    async fn delete_with<D, T>(&self, path: &str, data: &D) -> Result<T, ProxyError>
    where
        D: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        self.send(Verb::Delete, path, Some(data), &ServiceCallOptions::default())
            .await
    }

    /// Typed dispatch for any verb with an optional body and explicit options.
    async fn send<D, T>(
        &self,
        verb: Verb,
        path: &str,
        data: Option<&D>,
        options: &ServiceCallOptions,
    ) -> Result<T, ProxyError>
    where
        D: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        let body = data.map(|data| encode_body(path, data)).transpose()?;
        self.call(verb, path, body, options).await
    }
}

impl<P: ServiceProxy + ?Sized> ServiceProxyExt for P {}

fn encode_body<D: Serialize + ?Sized>(path: &str, data: &D) -> Result<Value, ProxyError> {
    serde_json::to_value(data).map_err(|source| ProxyError::Serialization {
        path: path.to_string(),
        source,
    })
}
