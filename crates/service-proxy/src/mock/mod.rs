//! In-process mock of a CRUD service.
//!
//! This module provides:
//! - `MockServiceProxy`: registration, global configuration and dispatch
//! - `Execution`: the dispatch pipeline and its call log
//!
//! ## Module Structure
//!
//! - `operations`: registered operations, handlers and the route registry
//! - `parameters`: global parameters handed to handlers
//! - `headers`: request/response header layers
//! - `validator`: connectivity and route checks
//! - `delay`: simulated latency
//! - `execution`: the dispatch pipeline

mod delay;
mod execution;
mod headers;
mod operations;
mod parameters;
mod validator;


pub use delay::{DelaySimulator, DEFAULT_MAX_RANDOM_DELAY_MS};
pub use execution::{Execution, LoggedCall};
pub use headers::{
    compose_request_headers, GlobalRequestHeaders, GlobalResponseHeaders, HeaderValueSource,
    ResponseHeaderSet,
};
pub use operations::{
    HandlerRequest, HandlerResponse, HandlerResult, Operation, OperationRegistry,
    ResponseFunction, RouteMatch,
};
pub use parameters::GlobalParameters;
pub use validator::RequestValidator;

use crate::config::{MockConfig, MockServiceOptions};
use crate::error::{PatternError, ProxyError};
use crate::pattern::{PathPattern, RouteTemplate};
use crate::service::{
    ConnectionStatus, ConnectivityMonitor, MockConnectivityMonitor, ResponseEvent,
    ServiceCallOptions, ServiceProxy, Verb,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Stand-in for a remote service during tests.
pub struct MockServiceProxy {
    options: MockServiceOptions,
    operations: Arc<OperationRegistry>,
    parameters: Arc<GlobalParameters>,
    request_headers: Arc<GlobalRequestHeaders>,
    response_headers: Arc<GlobalResponseHeaders>,
    response_event: Arc<ResponseEvent>,
    execution: Execution,
}

impl MockServiceProxy {
    pub fn new(options: MockServiceOptions) -> Self {
        let operations = Arc::new(OperationRegistry::new());
        let parameters = Arc::new(GlobalParameters::new());
        let request_headers = Arc::new(GlobalRequestHeaders::new());
        let response_headers = Arc::new(GlobalResponseHeaders::new());
        let response_event = Arc::new(ResponseEvent::new());
        let execution = Execution::new(
            DelaySimulator::from_options(&options),
            operations.clone(),
            parameters.clone(),
            request_headers.clone(),
            response_headers.clone(),
            response_event.clone(),
        );

        Self {
            options,
            operations,
            parameters,
            request_headers,
            response_headers,
            response_event,
            execution,
        }
    }

    /// Build a mock from declarative configuration.
    pub fn from_config(config: &MockConfig) -> Result<Self, PatternError> {
        let proxy = Self::new(config.options);

        proxy.set_global_parameters(config.global_parameters.clone());
        for (name, value) in &config.global_request_headers {
            proxy.add_global_request_header(name, value);
        }
        for (name, value) in &config.global_response_headers {
            proxy.add_global_response_header(name, value.as_str());
        }
        for route in &config.routes {
            proxy.add_operation(route.verb, &route.path, route.handler())?;
        }
        if let Some(status) = config.connectivity {
            proxy.set_connection_status(status);
        }

        debug!(
            "Mock service proxy built from config with {} operation(s)",
            proxy.operation_count()
        );
        Ok(proxy)
    }

    pub fn options(&self) -> &MockServiceOptions {
        &self.options
    }

    /// Register an operation. `None` as handler answers 204 with no body.
    pub fn add_operation(
        &self,
        verb: Verb,
        template: impl Into<RouteTemplate>,
        handler: Option<Arc<dyn ResponseFunction>>,
    ) -> Result<(), PatternError> {
        let pattern = PathPattern::compile(template)?;
        let index = self.operations.register(verb, pattern, handler);
        debug!("Registered {} operation #{}", verb, index);
        Ok(())
    }

    pub fn add_create_operation<F>(
        &self,
        template: impl Into<RouteTemplate>,
        handler: F,
    ) -> Result<(), PatternError>
    where
        F: Fn(&HandlerRequest<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_operation(Verb::Create, template, Some(Arc::new(handler)))
    }

    pub fn add_read_operation<F>(
        &self,
        template: impl Into<RouteTemplate>,
        handler: F,
    ) -> Result<(), PatternError>
    where
        F: Fn(&HandlerRequest<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_operation(Verb::Read, template, Some(Arc::new(handler)))
    }

    pub fn add_update_operation<F>(
        &self,
        template: impl Into<RouteTemplate>,
        handler: F,
    ) -> Result<(), PatternError>
    where
        F: Fn(&HandlerRequest<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_operation(Verb::Update, template, Some(Arc::new(handler)))
    }

    pub fn add_patch_operation<F>(
        &self,
        template: impl Into<RouteTemplate>,
        handler: F,
    ) -> Result<(), PatternError>
    where
        F: Fn(&HandlerRequest<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_operation(Verb::Patch, template, Some(Arc::new(handler)))
    }

    pub fn add_delete_operation<F>(
        &self,
        template: impl Into<RouteTemplate>,
        handler: F,
    ) -> Result<(), PatternError>
    where
        F: Fn(&HandlerRequest<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_operation(Verb::Delete, template, Some(Arc::new(handler)))
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn set_global_parameter(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.parameters.set_param(name, value);
    }

    pub fn set_global_parameters(&self, params: Map<String, Value>) {
        self.parameters.set_params(params);
    }

    pub fn add_global_response_header(
        &self,
        name: impl Into<String>,
        value: impl Into<HeaderValueSource>,
    ) {
        self.response_headers.add(name, value);
    }

    pub fn add_global_request_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.request_headers.add(name, value);
    }

    /// Consult `monitor` before every dispatch.
    pub fn listen_to_connectivity_monitor(&self, monitor: Arc<dyn ConnectivityMonitor>) {
        self.execution.validator().attach(monitor);
    }

    /// Simulate going online or offline.
    pub fn set_connectivity_status(&self, is_online: bool) {
        self.set_connection_status(ConnectionStatus::from_online(is_online));
    }

    /// Update the attached monitor, attaching a mock one first if needed.
    pub fn set_connection_status(&self, status: ConnectionStatus) {
        let validator = self.execution.validator();
        match validator.monitor() {
            Some(monitor) => monitor.set_connection_status(status),
            None => validator.attach(Arc::new(MockConnectivityMonitor::with_status(status))),
        }
    }

    /// Every completed dispatch so far, oldest first.
    pub fn logged_calls(&self) -> Vec<LoggedCall> {
        self.execution.logged_calls()
    }
}

impl Default for MockServiceProxy {
    fn default() -> Self {
        Self::new(MockServiceOptions::default())
    }
}

#[async_trait]
impl ServiceProxy for MockServiceProxy {
    async fn dispatch(
        &self,
        verb: Verb,
        path: &str,
        body: Option<Value>,
        options: &ServiceCallOptions,
    ) -> Result<Value, ProxyError> {
        self.execution.dispatch(verb, path, body, options).await
    }

    fn response_event(&self) -> &ResponseEvent {
        &self.response_event
    }
}
