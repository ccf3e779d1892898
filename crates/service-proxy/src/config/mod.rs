//! Declarative mock configuration.
//!
//! A mock can be built entirely in code, or from a YAML/JSON document:
//!
//! ```yaml
//! options:
//!   addRandomDelays: true
//!   maxRandomDelayMs: 200
//! globalParameters:
//!   tenant: acme
//! globalResponseHeaders:
//!   x-server: mock
//! routes:
//!   - verb: read
//!     path: /orders/{id}
//!     body: { id: 1 }
//!   - verb: delete
//!     path: /orders/{id}
//! ```

mod routes;

use crate::mock::DEFAULT_MAX_RANDOM_DELAY_MS;
use crate::pattern::PathPattern;
use crate::service::{ConnectionStatus, HttpHeaders};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

pub use routes::{FixtureResponse, RouteFixture};

/// Behavior switches for a mock instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MockServiceOptions {
    /// Delay every dispatch by a random duration.
    pub add_random_delays: bool,
    /// Upper bound for random delays. Defaults to 1500ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_random_delay_ms: Option<u64>,
}

impl MockServiceOptions {
    pub fn with_random_delays(max_random_delay_ms: u64) -> Self {
        Self {
            add_random_delays: true,
            max_random_delay_ms: Some(max_random_delay_ms),
        }
    }

    pub fn effective_max_delay_ms(&self) -> u64 {
        self.max_random_delay_ms
            .unwrap_or(DEFAULT_MAX_RANDOM_DELAY_MS)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MockConfig {
    pub options: MockServiceOptions,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub global_parameters: Map<String, Value>,
    #[serde(skip_serializing_if = "HttpHeaders::is_empty")]
    pub global_request_headers: HttpHeaders,
    #[serde(skip_serializing_if = "HttpHeaders::is_empty")]
    pub global_response_headers: HttpHeaders,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteFixture>,
    /// Initial connectivity. Omitted means no monitor is attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<ConnectionStatus>,
}

impl MockConfig {
    /// Load from a file; `.json` files are read as JSON, anything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mock config {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: MockConfig = if is_json {
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid JSON mock config {}", path.display()))?
        } else {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Invalid YAML mock config {}", path.display()))?
        };

        config.validate()?;
        info!(
            "Loaded mock config {} ({} route(s))",
            path.display(),
            config.routes.len()
        );
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, anyhow::Error> {
        let config: MockConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.options.add_random_delays && self.options.max_random_delay_ms == Some(0) {
            anyhow::bail!(
                "options.maxRandomDelayMs must be greater than 0 when addRandomDelays is enabled"
            );
        }

        for (index, route) in self.routes.iter().enumerate() {
            PathPattern::compile(&route.path)
                .with_context(|| format!("Invalid path in routes[{index}]"))?;
            if let Some(status) = route.status {
                if !(100..=599).contains(&status) {
                    anyhow::bail!("routes[{index}].status {status} is not a valid HTTP status");
                }
            }
        }

        Ok(())
    }
}
