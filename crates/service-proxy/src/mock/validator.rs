//! Pre-dispatch checks: connectivity first, then route ambiguity, then
//! route existence.

use super::operations::RouteMatch;
use crate::error::ProxyError;
use crate::service::{ConnectionStatus, ConnectivityMonitor, Verb};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

#[derive(Default)]
pub struct RequestValidator {
    monitor: RwLock<Option<Arc<dyn ConnectivityMonitor>>>,
}

impl RequestValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_monitor(monitor: Arc<dyn ConnectivityMonitor>) -> Self {
        Self {
            monitor: RwLock::new(Some(monitor)),
        }
    }

    /// Consult `monitor` on every subsequent validation.
    pub fn attach(&self, monitor: Arc<dyn ConnectivityMonitor>) {
        *self.monitor.write() = Some(monitor);
    }

    pub fn monitor(&self) -> Option<Arc<dyn ConnectivityMonitor>> {
        self.monitor.read().clone()
    }

    /// Current status; `Unknown` when no monitor is attached.
    pub async fn connection_status(&self) -> ConnectionStatus {
        match self.monitor() {
            Some(monitor) => monitor.connection_status().await,
            None => ConnectionStatus::Unknown,
        }
    }

    /// Gate a dispatch, yielding the single matching route.
    pub async fn validate(
        &self,
        verb: Verb,
        path: &str,
        mut matches: Vec<RouteMatch>,
    ) -> Result<RouteMatch, ProxyError> {
        if self.connection_status().await == ConnectionStatus::Disconnected {
            let error = ProxyError::Connectivity {
                path: path.to_string(),
            };
            warn!("{}", error);
            return Err(error);
        }

        if matches.len() > 1 {
            let error = ProxyError::AmbiguousRoute {
                verb,
                path: path.to_string(),
                count: matches.len(),
            };
            let candidates: Vec<&str> = matches
                .iter()
                .map(|m| m.operation.pattern.source())
                .collect();
            warn!("{} (candidates: {:?})", error, candidates);
            return Err(error);
        }

        match matches.pop() {
            Some(matched) => Ok(matched),
            None => {
                let error = ProxyError::RouteNotFound {
                    verb,
                    path: path.to_string(),
                };
                warn!("{}", error);
                Err(error)
            }
        }
    }
}
