//! Shared fixtures for gateway integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tower::ServiceExt;

pub use mock_gateway::auth::{AuthManager, CredentialStore, KeyPersistence, SigningSecret};
pub use mock_gateway::{router, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Fresh state with an isolated store and a fixed signing secret.
pub fn test_state() -> AppState {
    test_state_with_store(CredentialStore::new())
}

pub fn test_state_with_store(store: CredentialStore) -> AppState {
    let secret = SigningSecret::new();
    secret.set(TEST_SECRET);
    AppState::new(AuthManager::new(Arc::new(store), secret))
}

pub fn test_app(state: &AppState) -> Router {
    router(state.clone())
}

pub fn basic_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Send a request and return the status with the parsed JSON body (`Null` if not JSON).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(authorization) = authorization {
        builder = builder.header("authorization", authorization);
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}
