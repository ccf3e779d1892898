//! Error types shared by every service proxy implementation.
//!
//! `ServiceProxyError` is what callers see for any response with a status of
//! 400 or above. `ProxyError` wraps it together with the configuration
//! failures the mock engine detects before a response is ever produced.

use crate::service::{ServiceResponse, Verb};
use serde_json::{json, Value};
use thiserror::Error;

/// Failure produced by a completed service call with an error status.
///
/// The body is kept in two forms: `response_text` always holds the raw text,
/// `details` holds structured data when the body was (or parsed as) JSON.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Service call to {resource_path} resulted in an error with status code {http_status}. See the details and responseText properties for more info.")]
pub struct ServiceProxyError {
    pub resource_path: String,
    pub http_status: u16,
    pub response_text: String,
    pub details: Option<Value>,
}

impl ServiceProxyError {
    /// Build an error from a response body.
    ///
    /// A textual body is stored verbatim and parsed opportunistically; parse
    /// failures leave `details` unset. Any other body is stringified into
    /// `response_text` and kept as-is in `details`, except `null`, which
    /// has no details.
    pub fn new(resource_path: impl Into<String>, http_status: u16, response_body: &Value) -> Self {
        match response_body {
            Value::String(text) => Self::from_text(resource_path, http_status, text.clone()),
            Value::Null => Self {
                resource_path: resource_path.into(),
                http_status,
                response_text: Value::Null.to_string(),
                details: None,
            },
            other => Self {
                resource_path: resource_path.into(),
                http_status,
                response_text: other.to_string(),
                details: Some(other.clone()),
            },
        }
    }

    /// Build an error from raw response text.
    pub fn from_text(
        resource_path: impl Into<String>,
        http_status: u16,
        response_text: impl Into<String>,
    ) -> Self {
        let response_text = response_text.into();
        let details = serde_json::from_str::<Value>(&response_text)
            .ok()
            .filter(|parsed| parsed.is_object() || parsed.is_array());

        Self {
            resource_path: resource_path.into(),
            http_status,
            response_text,
            details,
        }
    }

    /// `details.message`, when the body carried one.
    pub fn message(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|details| details.get("message"))
            .and_then(Value::as_str)
    }
}

/// Invalid route template.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error("Unbalanced '{{' or '}}' in route template '{0}'")]
    UnbalancedBrace(String),
    #[error("Invalid placeholder name '{name}' in route template '{template}'")]
    InvalidPlaceholder { template: String, name: String },
    #[error("Placeholder '{name}' appears more than once in route template '{template}'")]
    DuplicatePlaceholder { template: String, name: String },
    #[error("Invalid route pattern '{pattern}': {message}")]
    Regex { pattern: String, message: String },
}

/// Every way a dispatch through a service proxy can fail.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Simulated offline state.
    #[error("Could not call service operation for '{path}' because there is no connectivity")]
    Connectivity { path: String },

    /// No registered operation accepted the path for the verb.
    #[error("The URL '{path}' was not found for the operation type {verb}")]
    RouteNotFound { verb: Verb, path: String },

    /// More than one registered operation accepted the path for the verb.
    #[error("More than 1 matching service operation found for URL '{path}' ({count} matches for {verb})")]
    AmbiguousRoute {
        verb: Verb,
        path: String,
        count: usize,
    },

    /// The call completed with an error status.
    #[error(transparent)]
    Service(#[from] ServiceProxyError),

    /// A typed request or response body could not be converted.
    #[error("Failed to convert body for '{path}': {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProxyError {
    /// HTTP-like status for the failure. Configuration failures report 400.
    pub fn status(&self) -> u16 {
        match self {
            ProxyError::Service(err) => err.http_status,
            ProxyError::Serialization { .. } => 500,
            ProxyError::Connectivity { .. }
            | ProxyError::RouteNotFound { .. }
            | ProxyError::AmbiguousRoute { .. } => 400,
        }
    }

    /// Structured detail, where the failure carries any.
    pub fn details(&self) -> Option<&Value> {
        match self {
            ProxyError::Service(err) => err.details.as_ref(),
            _ => None,
        }
    }

    /// Raw response text for service failures, the error message otherwise.
    pub fn response_text(&self) -> String {
        match self {
            ProxyError::Service(err) => err.response_text.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ProxyError::Connectivity { .. }
                | ProxyError::RouteNotFound { .. }
                | ProxyError::AmbiguousRoute { .. }
        )
    }
}

/// A response function failed instead of producing a response.
///
/// Never reaches callers as-is: the engine turns it into a 500 response so
/// the failure travels the normal response pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("An error occurred when executing a {verb} request to {path}: {cause}")]
pub struct HandlerFault {
    pub verb: Verb,
    pub path: String,
    pub cause: String,
}

impl HandlerFault {
    pub fn new(verb: Verb, path: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
            cause: cause.into(),
        }
    }

    /// Synthesized server error response carrying the fault message.
    pub fn into_response(self) -> ServiceResponse {
        ServiceResponse::new(500, json!({ "message": self.to_string() }))
    }
}
