//! Response event bus.

use super::ServiceResponse;
use parking_lot::RwLock;
use std::sync::Arc;

/// Observer of completed calls. Receives the response and, when known, the
/// path that produced it.
pub type ResponseListener = Arc<dyn Fn(&ServiceResponse, Option<&str>) + Send + Sync>;

/// Append-only list of observers, notified in registration order.
#[derive(Default)]
pub struct ResponseEvent {
    listeners: RwLock<Vec<ResponseListener>>,
}

impl ResponseEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen<F>(&self, callback: F)
    where
        F: Fn(&ServiceResponse, Option<&str>) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(callback));
    }

    /// Notify every observer synchronously.
    pub fn fire(&self, response: &ServiceResponse, path: Option<&str>) {
        // Snapshot so a listener may register further listeners without deadlocking.
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            listener(response, path);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for ResponseEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseEvent")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn test_fire_in_registration_order() {
        let event = ResponseEvent::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let seen = seen.clone();
            event.listen(move |response, path| {
                seen.lock()
                    .push((id, response.status, path.map(str::to_string)));
            });
        }

        event.fire(&ServiceResponse::ok(json!(1)), Some("/a"));

        let seen = seen.lock();
        assert_eq!(
            *seen,
            vec![
                (0, 200, Some("/a".to_string())),
                (1, 200, Some("/a".to_string())),
                (2, 200, Some("/a".to_string())),
            ]
        );
    }

    #[test]
    fn test_fire_without_listeners_or_path() {
        let event = ResponseEvent::new();
        event.fire(&ServiceResponse::no_content(), None);
        assert_eq!(event.listener_count(), 0);

        let paths = Arc::new(Mutex::new(Vec::new()));
        let captured = paths.clone();
        event.listen(move |_, path| captured.lock().push(path.map(str::to_string)));
        event.fire(&ServiceResponse::no_content(), None);
        assert_eq!(*paths.lock(), vec![None]);
    }
}
