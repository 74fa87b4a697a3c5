#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use axum::Router;
use base64::{engine::general_purpose, Engine as _};
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde_json::Value;
use sessionkeeper::config::{extract_config, ConfigV1};
use sessionkeeper::routes::create_router;
use sessionkeeper::startup::build_state;
use sessionkeeper::state::AppState;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
logging:
  level: "debug"
  format: "json"
backend:
  api_key: "test-api-key"
  auth_domain: "demo-project.example.com"
  project_id: "demo-project"
  storage_bucket: "demo-project.appspot.com"
  messaging_sender_id: "1234"
  app_id: "1:1234:web:abcd"
auth:
  timeout_in_ms: 3000
authenticator:
  type: "plain"
  name: "Local users"
  users:
    - uid: "u1"
      email: "ada@example.com"
      password: "lovelace"
      display_name: "Ada"
    - uid: "u2"
      email: "grace@example.com"
      password: "hopper"
providers:
  - provider_id: "google.com"
    name: "Google"
    scopes:
      - "email"
      - "profile"
    custom_parameters:
      prompt: "select_account"
store:
  enabled: true
  type: "memory"
bind_address: 127.0.0.1:0
"#;

pub fn load_config(yaml: &str) -> ConfigV1 {
    extract_config(Figment::new().merge(Yaml::string(yaml)))
        .expect("Failed to parse test config YAML")
}

pub fn load_test_config() -> ConfigV1 {
    load_config(TEST_CONFIG)
}

pub async fn build_app(config: ConfigV1) -> (Router, AppState) {
    let state = build_state(Arc::new(config))
        .await
        .expect("state should build");
    (create_router(state.clone()), state)
}

pub fn request(path: &str, method: Method) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn request_with_basic(path: &str, credentials: &str, method: Method) -> Request<Body> {
    let encoded = general_purpose::STANDARD.encode(credentials);
    Request::builder()
        .method(method)
        .uri(path)
        .header("Authorization", format!("Basic {}", encoded))
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn request_with_json(path: &str, method: Method, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
