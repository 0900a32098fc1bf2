//! Shared helpers for integration tests.

pub mod memory;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use upload_gateway::routes::routes::app;
use upload_gateway::services::upload_service::UploadService;

pub use memory::MemoryStore;

/// Router wired to a fresh in-memory store.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub store: Arc<MemoryStore>,
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new("test-bucket"));
        let service = UploadService::with_default_ttl(store.clone());
        Self {
            router: app(service, None),
            store,
        }
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        json_request(&self.router, "POST", uri, Some(body)).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        json_request(&self.router, "GET", uri, None).await
    }
}

#[allow(dead_code)]
pub async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
