//! Shared helpers for router tests.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::util::ServiceExt;

use crate::api::state::AppState;
use crate::config::StatsConfig;
use crate::storage::{JsonlStore, StorageConfig};

pub fn setup_test_state(dir: &std::path::Path) -> AppState {
    let store = JsonlStore::new(StorageConfig::new(dir.to_path_buf()));
    AppState::new(store, Duration::from_secs(600), StatsConfig::default())
}

pub async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    send_json(app, "GET", uri, None).await
}

pub async fn send_json(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(json) => request.body(Body::from(json.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let resp = app.oneshot(request).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}
