// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Response;
use pokefusion::config::Config;
use pokefusion::models::User;
use pokefusion::routes::create_router;
use pokefusion::AppState;
use std::sync::Arc;

/// Create a test app from `Config::test_default()`.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::from_config(config).expect("Failed to build test state"));
    (create_router(state.clone()), state)
}

#[allow(dead_code)]
pub fn test_user() -> User {
    User {
        id: "109876543210".to_string(),
        email: "ash@example.com".to_string(),
        name: "Ash Ketchum".to_string(),
        picture: None,
    }
}

/// Session token for `test_user()` signed by the app's codec.
#[allow(dead_code)]
pub fn bearer_for(state: &AppState) -> String {
    let token = state
        .token_codec
        .sign(&test_user())
        .expect("Failed to sign test token");
    format!("Bearer {}", token)
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

/// Serve `router` on an ephemeral local port. Returns its base URL.
#[allow(dead_code)]
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Test server has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{addr}")
}
