//! Integration tests for the mock service proxy public API.
//!
//! These tests build mocks the way a consumer would: in code, and from
//! YAML/JSON config files on disk.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use service_proxy::{
    ConnectionStatus, ConnectivityMonitor, HandlerResponse, MockConfig, MockConnectivityMonitor,
    MockServiceOptions, MockServiceProxy, ProxyError, ServiceCallOptions, ServiceProxy,
    ServiceProxyExt, Verb,
};
use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: String,
    qty: u32,
}

/// Consumer code written against the abstract contract only.
async fn load_order(proxy: &dyn ServiceProxy, id: &str) -> Result<Order, ProxyError> {
    proxy.read(&format!("/orders/{id}")).await
}

fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp config");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp config");
    file
}

#[tokio::test]
async fn test_consumer_against_trait_object() {
    let proxy = MockServiceProxy::default();
    proxy
        .add_read_operation("/orders/{id}", |req| {
            Ok(json!({ "id": req.param("id"), "qty": req.global("default_qty") }).into())
        })
        .unwrap();
    proxy.set_global_parameter("default_qty", 3);

    let order = load_order(&proxy, "A-1").await.unwrap();
    assert_eq!(
        order,
        Order {
            id: "A-1".to_string(),
            qty: 3
        }
    );
}

#[tokio::test]
async fn test_crud_round_through_mock() {
    let store: Arc<Mutex<Vec<Order>>> = Arc::new(Mutex::new(Vec::new()));
    let proxy = MockServiceProxy::new(MockServiceOptions::default());

    let created = store.clone();
    proxy
        .add_create_operation("/orders", move |req| {
            let order: Order = req.body_as()?;
            created.lock().unwrap().push(order.clone());
            Ok(HandlerResponse::status(201, serde_json::to_value(order)?))
        })
        .unwrap();

    let listed = store.clone();
    proxy
        .add_read_operation("/orders", move |_| {
            Ok(serde_json::to_value(&*listed.lock().unwrap())?.into())
        })
        .unwrap();

    let removed = store.clone();
    proxy
        .add_delete_operation("/orders/{id}", move |req| {
            let id = req.param("id").unwrap_or_default();
            let mut orders = removed.lock().unwrap();
            let before = orders.len();
            orders.retain(|order| order.id != id);
            if orders.len() == before {
                return Ok(HandlerResponse::status(404, json!({ "message": "no such order" })));
            }
            Ok(Value::Null.into())
        })
        .unwrap();

    let order = Order {
        id: "B-7".to_string(),
        qty: 2,
    };
    let echoed: Order = proxy.create("/orders", &order).await.unwrap();
    assert_eq!(echoed, order);

    let all: Vec<Order> = proxy.read("/orders").await.unwrap();
    assert_eq!(all, vec![order]);

    let _: Value = proxy.delete("/orders/B-7").await.unwrap();
    let err = proxy.delete::<Value>("/orders/B-7").await.unwrap_err();
    assert_eq!(err.status(), 404);
    assert_eq!(
        err.details().and_then(|d| d.get("message")),
        Some(&json!("no such order"))
    );

    let statuses: Vec<u16> = proxy
        .logged_calls()
        .iter()
        .map(|call| call.response.status)
        .collect();
    assert_eq!(statuses, vec![201, 200, 204, 404]);
}

#[tokio::test]
async fn test_observers_see_every_completed_call() {
    let proxy = MockServiceProxy::default();
    proxy
        .add_read_operation("/ok", |_| Ok(json!("fine").into()))
        .unwrap();
    proxy
        .add_read_operation("/fail", |_| Ok(HandlerResponse::status(500, json!("down"))))
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let captured = seen.clone();
    proxy.response_event().listen(move |response, path| {
        captured
            .lock()
            .unwrap()
            .push(format!("{} {}", response.status, path.unwrap_or("-")));
    });

    let _ = proxy.read::<Value>("/ok").await;
    let _ = proxy.read::<Value>("/fail").await;
    let _ = proxy.read::<Value>("/missing").await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["200 /ok".to_string(), "500 /fail".to_string()]
    );
}

#[tokio::test]
async fn test_connectivity_listener_sees_changes() {
    let proxy = MockServiceProxy::default();
    proxy.add_operation(Verb::Read, "/ping", None).unwrap();

    let monitor = Arc::new(MockConnectivityMonitor::new());
    let changes = Arc::new(Mutex::new(Vec::new()));
    let captured = changes.clone();
    monitor.listen(Arc::new(move |status| captured.lock().unwrap().push(status)));
    proxy.listen_to_connectivity_monitor(monitor.clone());

    proxy.set_connectivity_status(false);
    assert!(proxy.read::<Value>("/ping").await.is_err());
    proxy.set_connectivity_status(true);
    assert!(proxy.read::<Value>("/ping").await.is_ok());

    assert_eq!(
        *changes.lock().unwrap(),
        vec![ConnectionStatus::Disconnected, ConnectionStatus::Connected]
    );
}

#[tokio::test]
async fn test_mock_from_yaml_file() {
    let file = write_config(
        ".yaml",
        r#"
globalResponseHeaders:
  x-server: mock
routes:
  - verb: read
    path: /orders/{id}
    body:
      id: fixed
      qty: 1
  - verb: patch
    path: /orders/{id}
    status: 200
    body: patched
    headers:
      etag: v2
"#,
    );

    let config = MockConfig::from_file(file.path()).unwrap();
    let proxy = MockServiceProxy::from_config(&config).unwrap();

    let order: Order = proxy.read("/orders/anything").await.unwrap();
    assert_eq!(order.id, "fixed");

    let headers = Arc::new(Mutex::new(Vec::new()));
    let captured = headers.clone();
    proxy
        .response_event()
        .listen(move |response, _| captured.lock().unwrap().push(response.headers.clone()));

    let patched: String = proxy.patch("/orders/1", &json!({"qty": 5})).await.unwrap();
    assert_eq!(patched, "patched");
    let published = headers.lock().unwrap()[0].clone();
    assert_eq!(published["etag"], "v2");
    assert_eq!(published["x-server"], "mock");
}

#[tokio::test]
async fn test_mock_from_json_file() {
    let file = write_config(
        ".json",
        r#"{
  "options": { "addRandomDelays": false },
  "routes": [ { "verb": "update", "path": "/settings", "body": { "saved": true } } ]
}"#,
    );

    let config = MockConfig::from_file(file.path()).unwrap();
    let proxy = MockServiceProxy::from_config(&config).unwrap();
    let options = ServiceCallOptions::default().with_header("if-match", "v1");
    let saved = proxy
        .dispatch(Verb::Update, "/settings", Some(json!({})), &options)
        .await
        .unwrap();
    assert_eq!(saved, json!({"saved": true}));
    assert_eq!(proxy.logged_calls()[0].headers["if-match"], "v1");
}

#[test]
fn test_missing_config_file_reports_path() {
    let err = MockConfig::from_file("/definitely/not/here.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.yaml"));
}
