//! Static route fixtures.

use crate::mock::{HandlerRequest, HandlerResponse, HandlerResult, ResponseFunction};
use crate::service::{HttpHeaders, ServiceResponse, Verb};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// A route answered with a fixed response.
///
/// - no `status`, `body` or `headers`: no handler, answers 204
/// - only `body`: plain body, answers 200
/// - `status` or `headers`: answered verbatim, status defaulting to 200
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteFixture {
    pub verb: Verb,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "HttpHeaders::is_empty")]
    pub headers: HttpHeaders,
}

impl RouteFixture {
    pub fn handler(&self) -> Option<Arc<dyn ResponseFunction>> {
        if self.status.is_none() && self.body.is_none() && self.headers.is_empty() {
            return None;
        }
        Some(Arc::new(FixtureResponse {
            status: self.status,
            body: self.body.clone().unwrap_or(Value::Null),
            headers: self.headers.clone(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixtureResponse {
    status: Option<u16>,
    body: Value,
    headers: HttpHeaders,
}

impl ResponseFunction for FixtureResponse {
    fn respond(&self, _request: &HandlerRequest<'_>) -> HandlerResult {
        if self.status.is_none() && self.headers.is_empty() {
            return Ok(HandlerResponse::Raw(self.body.clone()));
        }
        Ok(HandlerResponse::Structured(ServiceResponse {
            status: self.status.unwrap_or(200),
            response_body: self.body.clone(),
            headers: self.headers.clone(),
        }))
    }
}
