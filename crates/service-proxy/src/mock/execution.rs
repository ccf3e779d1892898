//! Dispatch pipeline of the mock engine.
//!
//! validate -> delay -> handler -> normalize -> log -> response headers ->
//! publish -> resolve or reject. Validation failures leave before the delay
//! and are neither logged nor published.

use super::delay::DelaySimulator;
use super::headers::{compose_request_headers, GlobalRequestHeaders, GlobalResponseHeaders};
use super::operations::{HandlerRequest, OperationRegistry, RouteMatch};
use super::parameters::GlobalParameters;
use super::validator::RequestValidator;
use crate::error::{HandlerFault, ProxyError, ServiceProxyError};
use crate::pattern::RouteParams;
use crate::service::{HttpHeaders, ResponseEvent, ServiceCallOptions, ServiceResponse, Verb};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// One completed dispatch, as recorded for assertions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedCall {
    pub verb: Verb,
    pub path: String,
    pub url_matches: RouteParams,
    pub response: ServiceResponse,
    pub request_body: Option<Value>,
    pub headers: HttpHeaders,
}

pub struct Execution {
    operations: Arc<OperationRegistry>,
    parameters: Arc<GlobalParameters>,
    request_headers: Arc<GlobalRequestHeaders>,
    response_headers: Arc<GlobalResponseHeaders>,
    response_event: Arc<ResponseEvent>,
    validator: RequestValidator,
    delay: DelaySimulator,
    logged_calls: RwLock<Vec<LoggedCall>>,
}

impl Execution {
    pub fn new(
        delay: DelaySimulator,
        operations: Arc<OperationRegistry>,
        parameters: Arc<GlobalParameters>,
        request_headers: Arc<GlobalRequestHeaders>,
        response_headers: Arc<GlobalResponseHeaders>,
        response_event: Arc<ResponseEvent>,
    ) -> Self {
        Self {
            operations,
            parameters,
            request_headers,
            response_headers,
            response_event,
            validator: RequestValidator::new(),
            delay,
            logged_calls: RwLock::new(Vec::new()),
        }
    }

    pub fn validator(&self) -> &RequestValidator {
        &self.validator
    }

    pub fn logged_calls(&self) -> Vec<LoggedCall> {
        self.logged_calls.read().clone()
    }

    pub fn logged_call_count(&self) -> usize {
        self.logged_calls.read().len()
    }

    pub async fn dispatch(
        &self,
        verb: Verb,
        path: &str,
        body: Option<Value>,
        options: &ServiceCallOptions,
    ) -> Result<Value, ProxyError> {
        // Configuration is read once; writes during the delay do not leak in.
        let globals = self.parameters.snapshot();
        let request_headers =
            compose_request_headers(&self.request_headers.snapshot(), &options.headers);
        let response_headers = self.response_headers.snapshot();

        let matches = self.operations.find_matches(verb, path);
        debug!("{} {}: {} matching operation(s)", verb, path, matches.len());
        let matched = self.validator.validate(verb, path, matches).await?;

        let delay = self.delay.wait().await;
        if !delay.is_zero() {
            debug!("{} {}: delayed {}ms", verb, path, delay.as_millis());
        }

        let RouteMatch { operation, params } = matched;
        let request = HandlerRequest {
            verb,
            path,
            params: &params,
            body: body.as_ref(),
            options,
            globals: &globals,
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| operation.respond(&request)));
        let mut response = match outcome {
            Ok(Ok(answer)) => answer.normalize(),
            Ok(Err(e)) => handler_fault(verb, path, format!("{e:#}")),
            Err(panic) => handler_fault(verb, path, panic_message(panic.as_ref())),
        };

        self.logged_calls.write().push(LoggedCall {
            verb,
            path: path.to_string(),
            url_matches: params.clone(),
            response: response.clone(),
            request_body: body.clone(),
            headers: request_headers,
        });

        response_headers.apply(&mut response);
        self.response_event.fire(&response, Some(path));

        debug!("{} {}: status {}", verb, path, response.status);
        if response.is_error() {
            return Err(ServiceProxyError::new(path, response.status, &response.response_body).into());
        }

        if options.deserialize_response {
            Ok(response.response_body)
        } else {
            Ok(Value::String(raw_text(response.response_body)))
        }
    }
}

fn handler_fault(verb: Verb, path: &str, cause: String) -> ServiceResponse {
    let fault = HandlerFault::new(verb, path, cause);
    warn!("{}", fault);
    fault.into_response()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Body as it would have arrived on the wire, undecoded.
fn raw_text(body: Value) -> String {
    match body {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
