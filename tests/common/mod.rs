//! Shared helpers for the HTTP integration tests.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use eventhub::config::AppConfig;
use eventhub::server::{router, AppState};

pub const SECRET: &str = "integration-secret";
pub const STRONG_PASSWORD: &str = "Str0ng!pw";
pub const CPFS: [&str; 3] = ["529.982.247-25", "111.444.777-35", "39053344705"];

pub fn test_app(config: &AppConfig) -> (Router, AppState) {
    let state = AppState::new(config);
    (router(state.clone()), state)
}

pub fn default_app() -> (Router, AppState) { test_app(&AppConfig::new(SECRET)) }

pub async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header("authorization", format!("Bearer {}", t));
    }
    let req = match body {
        Some(b) => req.header("content-type", "application/json").body(Body::from(b.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();
    send_raw(app, req).await
}

pub async fn send_raw(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, value)
}

/// Registers an account and logs it in, returning `(user_id, token)`.
pub async fn register_and_login(app: &Router, name: &str, email: &str, cpf: &str) -> (i64, String) {
    let (status, user) = send(
        app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "name": name, "email": email, "password": STRONG_PASSWORD, "cpf": cpf })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", user);
    let (status, login) =
        send(app, Method::POST, "/users/login", None, Some(json!({ "email": email, "password": STRONG_PASSWORD }))).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", login);
    (user["id"].as_i64().unwrap(), login["token"].as_str().unwrap().to_string())
}
