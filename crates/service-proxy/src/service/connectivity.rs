//! Connectivity status sources.
//!
//! The mock engine consults a [`ConnectivityMonitor`] once per dispatch.
//! [`MockConnectivityMonitor`] is driven by tests; [`ProbingConnectivityMonitor`]
//! confirms connectivity by reading a known resource through a service proxy.

use super::{ServiceCallOptions, ServiceProxy, Verb};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Nothing has been reported yet. Never blocks a dispatch.
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn from_online(is_online: bool) -> Self {
        if is_online {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }
}

pub type ConnectionListener = Arc<dyn Fn(ConnectionStatus) + Send + Sync>;

#[async_trait]
pub trait ConnectivityMonitor: Send + Sync {
    async fn connection_status(&self) -> ConnectionStatus;

    fn set_connection_status(&self, status: ConnectionStatus);

    /// Register a callback for status changes.
    fn listen(&self, listener: ConnectionListener);
}

/// Listener bookkeeping shared by the monitors below.
#[derive(Default)]
struct StatusCell {
    status: RwLock<ConnectionStatus>,
    listeners: RwLock<Vec<ConnectionListener>>,
}

impl StatusCell {
    fn get(&self) -> ConnectionStatus {
        *self.status.read()
    }

    fn set(&self, status: ConnectionStatus) {
        *self.status.write() = status;
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            listener(status);
        }
    }

    fn listen(&self, listener: ConnectionListener) {
        self.listeners.write().push(listener);
    }
}

/// Test-controlled monitor: status changes are pushed to listeners immediately.
#[derive(Default)]
pub struct MockConnectivityMonitor {
    cell: StatusCell,
}

impl MockConnectivityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(status: ConnectionStatus) -> Self {
        let monitor = Self::new();
        *monitor.cell.status.write() = status;
        monitor
    }

    pub fn status(&self) -> ConnectionStatus {
        self.cell.get()
    }
}

#[async_trait]
impl ConnectivityMonitor for MockConnectivityMonitor {
    async fn connection_status(&self) -> ConnectionStatus {
        self.cell.get()
    }

    fn set_connection_status(&self, status: ConnectionStatus) {
        self.cell.set(status);
    }

    fn listen(&self, listener: ConnectionListener) {
        self.cell.listen(listener);
    }
}

/// Monitor that decides connectivity by reading `confirm_path` through a
/// service proxy. Any resolved read means connected, any failure means
/// disconnected.
pub struct ProbingConnectivityMonitor {
    proxy: Arc<dyn ServiceProxy>,
    confirm_path: String,
    cell: StatusCell,
}

impl ProbingConnectivityMonitor {
    pub fn new(proxy: Arc<dyn ServiceProxy>, confirm_path: impl Into<String>) -> Self {
        Self {
            proxy,
            confirm_path: confirm_path.into(),
            cell: StatusCell::default(),
        }
    }

    /// Probe once, record and broadcast the result.
    pub async fn confirm_connectivity(&self) -> ConnectionStatus {
        let status = match self
            .proxy
            .dispatch(
                Verb::Read,
                &self.confirm_path,
                None,
                &ServiceCallOptions::default(),
            )
            .await
        {
            Ok(_) => ConnectionStatus::Connected,
            Err(e) => {
                debug!("Connectivity probe to {} failed: {}", self.confirm_path, e);
                ConnectionStatus::Disconnected
            }
        };
        self.cell.set(status);
        status
    }
}

#[async_trait]
impl ConnectivityMonitor for ProbingConnectivityMonitor {
    async fn connection_status(&self) -> ConnectionStatus {
        self.cell.get()
    }

    fn set_connection_status(&self, status: ConnectionStatus) {
        self.cell.set(status);
    }

    fn listen(&self, listener: ConnectionListener) {
        self.cell.listen(listener);
    }
}
