// ===== Service contract =====
pub mod error;
pub mod service;

// ===== Mock engine =====
pub mod config;
pub mod mock;
pub mod pattern;

pub use config::{MockConfig, MockServiceOptions, RouteFixture};
pub use error::{HandlerFault, PatternError, ProxyError, ServiceProxyError};
pub use mock::{HandlerRequest, HandlerResponse, HandlerResult, LoggedCall, MockServiceProxy};
pub use pattern::{PathPattern, RouteParams, RouteTemplate};
pub use service::{
    ConnectionStatus, ConnectivityMonitor, HttpHeaders, MockConnectivityMonitor, ResponseEvent,
    ServiceCallOptions, ServiceProxy, ServiceProxyExt, ServiceResponse, Verb,
};
