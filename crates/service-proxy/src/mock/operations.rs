//! Registered operations and the route registry.

use crate::pattern::{PathPattern, RouteParams};
use crate::service::{ServiceCallOptions, ServiceResponse, Verb};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Everything a response function gets to see about a call.
#[derive(Debug, Clone, Copy)]
pub struct HandlerRequest<'a> {
    pub verb: Verb,
    pub path: &'a str,
    pub params: &'a RouteParams,
    pub body: Option<&'a Value>,
    pub options: &'a ServiceCallOptions,
    /// Point-in-time copy of the global parameters.
    pub globals: &'a Map<String, Value>,
}

impl<'a> HandlerRequest<'a> {
    pub fn param(&self, name: &str) -> Option<&'a str> {
        self.params.get(name)
    }

    pub fn global(&self, name: &str) -> Option<&'a Value> {
        self.globals.get(name)
    }

    /// Decode the request body into `T`. A missing body decodes as `null`.
    pub fn body_as<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let body = self.body.cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(body)?)
    }
}

/// What a response function hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResponse {
    /// Plain body: 200, or 204 when the body is `null`.
    Raw(Value),
    /// Explicit status, body and headers, used verbatim.
    Structured(ServiceResponse),
}

impl HandlerResponse {
    pub fn status(status: u16, response_body: Value) -> Self {
        HandlerResponse::Structured(ServiceResponse::new(status, response_body))
    }

    /// Turn the handler's answer into the response the pipeline carries.
    pub fn normalize(self) -> ServiceResponse {
        match self {
            HandlerResponse::Structured(response) => response,
            HandlerResponse::Raw(Value::Null) => ServiceResponse::no_content(),
            HandlerResponse::Raw(value) => ServiceResponse::ok(value),
        }
    }
}

impl From<Value> for HandlerResponse {
    fn from(value: Value) -> Self {
        HandlerResponse::Raw(value)
    }
}

impl From<ServiceResponse> for HandlerResponse {
    fn from(response: ServiceResponse) -> Self {
        HandlerResponse::Structured(response)
    }
}

pub type HandlerResult = anyhow::Result<HandlerResponse>;

/// Produces the simulated response for a matched route. Returning `Err`
/// simulates an unhandled server-side exception.
pub trait ResponseFunction: Send + Sync {
    fn respond(&self, request: &HandlerRequest<'_>) -> HandlerResult;
}

impl<F> ResponseFunction for F
where
    F: Fn(&HandlerRequest<'_>) -> HandlerResult + Send + Sync,
{
    fn respond(&self, request: &HandlerRequest<'_>) -> HandlerResult {
        self(request)
    }
}

/// A registered route. Immutable once registered.
pub struct Operation {
    /// Registration order.
    pub index: usize,
    pub verb: Verb,
    pub pattern: PathPattern,
    handler: Option<Arc<dyn ResponseFunction>>,
}

impl Operation {
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Run the handler. Routes without one answer 204 with no body.
    pub fn respond(&self, request: &HandlerRequest<'_>) -> HandlerResult {
        match &self.handler {
            Some(handler) => handler.respond(request),
            None => Ok(HandlerResponse::Structured(ServiceResponse::no_content())),
        }
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("index", &self.index)
            .field("verb", &self.verb)
            .field("pattern", &self.pattern.source())
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

/// An operation that accepted a path, with the parameters it extracted.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub operation: Arc<Operation>,
    pub params: RouteParams,
}

/// Append-only, ordered collection of operations.
#[derive(Default)]
pub struct OperationRegistry {
    operations: RwLock<Vec<Arc<Operation>>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation and return its registration index.
    pub fn register(
        &self,
        verb: Verb,
        pattern: PathPattern,
        handler: Option<Arc<dyn ResponseFunction>>,
    ) -> usize {
        let mut operations = self.operations.write();
        let index = operations.len();
        operations.push(Arc::new(Operation {
            index,
            verb,
            pattern,
            handler,
        }));
        index
    }

    /// Every operation for `verb` whose pattern accepts `path`, in
    /// registration order.
    pub fn find_matches(&self, verb: Verb, path: &str) -> Vec<RouteMatch> {
        self.operations
            .read()
            .iter()
            .filter(|operation| operation.verb == verb)
            .filter_map(|operation| {
                operation.pattern.matches(path).map(|params| RouteMatch {
                    operation: operation.clone(),
                    params,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.operations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.read().is_empty()
    }

    pub fn operations(&self) -> Vec<Arc<Operation>> {
        self.operations.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> OperationRegistry {
        let registry = OperationRegistry::new();
        registry.register(
            Verb::Read,
            PathPattern::compile("/orders/{id}").unwrap(),
            None,
        );
        registry.register(Verb::Read, PathPattern::compile("/orders").unwrap(), None);
        registry.register(
            Verb::Update,
            PathPattern::compile("/orders/{id}").unwrap(),
            None,
        );
        registry.register(
            Verb::Read,
            PathPattern::compile("/orders/{order}").unwrap(),
            None,
        );
        registry
    }

    #[test]
    fn test_find_matches_filters_by_verb_and_path() {
        let registry = registry();

        let matches = registry.find_matches(Verb::Update, "/orders/1");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].operation.index, 2);
        assert_eq!(matches[0].params.get("id"), Some("1"));

        assert!(registry.find_matches(Verb::Delete, "/orders/1").is_empty());
        assert!(registry.find_matches(Verb::Read, "/customers").is_empty());
    }

    #[test]
    fn test_find_matches_keeps_registration_order() {
        let registry = registry();
        let indexes: Vec<usize> = registry
            .find_matches(Verb::Read, "/orders/9")
            .iter()
            .map(|m| m.operation.index)
            .collect();
        assert_eq!(indexes, vec![0, 3]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_operation_without_handler_answers_no_content() {
        let registry = registry();
        let matched = registry.find_matches(Verb::Read, "/orders").remove(0);
        let options = ServiceCallOptions::default();
        let globals = Map::new();
        let request = HandlerRequest {
            verb: Verb::Read,
            path: "/orders",
            params: &matched.params,
            body: None,
            options: &options,
            globals: &globals,
        };

        let response = matched.operation.respond(&request).unwrap().normalize();
        assert_eq!(response, ServiceResponse::no_content());
    }

    #[test]
    fn test_normalize_handler_responses() {
        assert_eq!(
            HandlerResponse::Raw(json!({"id": 1})).normalize(),
            ServiceResponse::ok(json!({"id": 1}))
        );
        assert_eq!(
            HandlerResponse::Raw(Value::Null).normalize(),
            ServiceResponse::no_content()
        );
        let structured = ServiceResponse::new(201, json!("made")).with_header("location", "/x/1");
        assert_eq!(
            HandlerResponse::from(structured.clone()).normalize(),
            structured
        );
        // Explicit status with a null body stays as given.
        assert_eq!(
            HandlerResponse::status(404, Value::Null).normalize().status,
            404
        );
    }

    #[test]
    fn test_handler_request_accessors() {
        let params = RouteParams::Named(vec![("id".into(), "5".into())]);
        let body = json!({"qty": 3});
        let options = ServiceCallOptions::default();
        let mut globals = Map::new();
        globals.insert("tenant".into(), json!("acme"));
        let request = HandlerRequest {
            verb: Verb::Create,
            path: "/orders/5",
            params: &params,
            body: Some(&body),
            options: &options,
            globals: &globals,
        };

        assert_eq!(request.param("id"), Some("5"));
        assert_eq!(request.global("tenant"), Some(&json!("acme")));

        #[derive(serde::Deserialize)]
        struct Line {
            qty: u32,
        }
        let line: Line = request.body_as().unwrap();
        assert_eq!(line.qty, 3);
    }
}
