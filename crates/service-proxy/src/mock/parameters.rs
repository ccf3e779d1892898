//! Global parameters handed to every response function.

use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Named values shared by all handlers (fixtures, tenant ids, ...).
#[derive(Debug, Default)]
pub struct GlobalParameters {
    params: RwLock<Map<String, Value>>,
}

impl GlobalParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_param(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.params.write().insert(name.into(), value.into());
    }

    /// Replace every parameter at once.
    pub fn set_params(&self, params: Map<String, Value>) {
        *self.params.write() = params;
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.params.read().get(name).cloned()
    }

    /// Copy taken at the start of a dispatch; later writes do not affect it.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.params.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_snapshot() {
        let params = GlobalParameters::new();
        params.set_param("tenant", "acme");
        params.set_param("limit", 10);

        let snapshot = params.snapshot();
        params.set_param("tenant", "globex");

        assert_eq!(snapshot.get("tenant"), Some(&json!("acme")));
        assert_eq!(params.get("tenant"), Some(json!("globex")));
        assert_eq!(params.get("limit"), Some(json!(10)));
    }

    #[test]
    fn test_set_params_replaces_everything() {
        let params = GlobalParameters::new();
        params.set_param("old", true);

        let mut replacement = Map::new();
        replacement.insert("new".into(), json!([1, 2]));
        params.set_params(replacement);

        assert!(params.get("old").is_none());
        assert_eq!(params.get("new"), Some(json!([1, 2])));
    }
}
