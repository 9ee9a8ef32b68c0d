// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google ID token verification against a locally served JWKS document.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use pokefusion::config::Config;
use pokefusion::routes::create_router;
use pokefusion::services::{
    FusionRequestBuilder, GoogleIdTokenVerifier, GoogleOAuthClient, IdentityError, RetryPolicy,
    TokenCodec,
};
use pokefusion::time_utils::now_unix_millis;
use pokefusion::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

mod common;

const TEST_KEY_PEM: &str = include_str!("fixtures/google_test_key.pem");
const TEST_N: &str = "p5TozbFThillDM70EkF88vhnveeID8X2DzHSseG80V4OcuOG1Oxhp9bW1zYiH7FnkXkdoclWTyyET2tmB48gE0RgRWOrCwO2OefyP34OaU2uWiq0YWM2iYbjDVA3USy0TuB5Dtc_uVT7Tbpp_SEsMYY5fcBwrkf8qpayBNXaxsrQ3EV1GhY_qkHkS8_ToJbutrQ6JJurgOtT8Gfm8DeLJsMsvq7ORlco5N_qTO_nMMgfPnxbohje7vHivKHHHyhNWLGqUSqWMXmJz5VRQCEFPrMl_HwaipUFF2Mxl-u4Zpht1_WR1aJ9jqBGj4XnIAD0riGD27iSRyuL-RSV8GEbmQ";

/// JWKS endpoint publishing the test key under whichever kids are current.
#[derive(Clone, Default)]
struct JwksServer {
    fetches: Arc<AtomicUsize>,
    published: Arc<Mutex<Vec<String>>>,
}

impl JwksServer {
    fn publish(&self, kids: &[&str]) {
        *self.published.lock().unwrap() = kids.iter().map(|kid| kid.to_string()).collect();
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn start(&self) -> String {
        let router = Router::new()
            .route("/certs", get(certs))
            .with_state(self.clone());
        format!("{}/certs", common::serve(router).await)
    }
}

async fn certs(State(server): State<JwksServer>) -> impl IntoResponse {
    server.fetches.fetch_add(1, Ordering::SeqCst);
    let keys: Vec<_> = server
        .published
        .lock()
        .unwrap()
        .iter()
        .map(|kid| {
            serde_json::json!({
                "kid": kid,
                "kty": "RSA",
                "alg": "RS256",
                "use": "sig",
                "n": TEST_N,
                "e": "AQAB",
            })
        })
        .collect();

    (
        [(header::CACHE_CONTROL, "public, max-age=300, must-revalidate")],
        Json(serde_json::json!({ "keys": keys })),
    )
}

fn verifier_for(jwks_url: String) -> GoogleIdTokenVerifier {
    GoogleIdTokenVerifier::new(&Config::test_default())
        .unwrap()
        .with_jwks_url(jwks_url)
        .with_retry(RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        })
}

fn id_token(kid: &str, sub: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let claims = serde_json::json!({
        "iss": "https://accounts.google.com",
        "aud": "test-client-id.apps.googleusercontent.com",
        "sub": sub,
        "email": format!("{sub}@example.com"),
        "exp": (now_unix_millis() / 1000) as u64 + 3600,
    });

    encode(
        &header,
        &claims,
        &EncodingKey::from_rsa_pem(TEST_KEY_PEM.as_bytes()).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_keys_are_cached_between_verifications() {
    let server = JwksServer::default();
    server.publish(&["kid-2026-a"]);
    let verifier = verifier_for(server.start().await);

    let user = verifier.verify(&id_token("kid-2026-a", "red")).await.unwrap();
    assert_eq!(user.email, "red@example.com");
    assert_eq!(server.fetches(), 1);

    let user = verifier.verify(&id_token("kid-2026-a", "blue")).await.unwrap();
    assert_eq!(user.id, "blue");
    assert_eq!(server.fetches(), 1);
}

#[tokio::test]
async fn test_rotated_key_forces_refresh() {
    let server = JwksServer::default();
    server.publish(&["kid-2026-a"]);
    let verifier = verifier_for(server.start().await);

    verifier.verify(&id_token("kid-2026-a", "red")).await.unwrap();
    assert_eq!(server.fetches(), 1);

    server.publish(&["kid-2026-b"]);
    let user = verifier.verify(&id_token("kid-2026-b", "gold")).await.unwrap();
    assert_eq!(user.id, "gold");
    assert_eq!(server.fetches(), 2);

    let err = verifier
        .verify(&id_token("kid-unpublished", "silver"))
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::Rejected(_)), "{err}");
    assert_eq!(server.fetches(), 3);
}

#[tokio::test]
async fn test_empty_key_set_is_upstream_error() {
    let server = JwksServer::default();
    let verifier = verifier_for(server.start().await);

    let err = verifier
        .verify(&id_token("kid-2026-a", "red"))
        .await
        .unwrap_err();

    assert!(matches!(err, IdentityError::Upstream(_)), "{err}");
}

#[tokio::test]
async fn test_google_token_login_with_jwks() {
    let server = JwksServer::default();
    server.publish(&["kid-2026-a"]);
    let jwks_url = server.start().await;

    let config = Config::test_default();
    let state = Arc::new(AppState {
        token_codec: TokenCodec::new(&config.jwt_signing_key, config.token_ttl_secs),
        google: GoogleOAuthClient::new(&config).unwrap(),
        id_token_verifier: verifier_for(jwks_url),
        fusion_builder: FusionRequestBuilder::from_config(&config),
        config,
    });
    let app = create_router(state);

    let login = |token: String| {
        Request::builder()
            .method("POST")
            .uri("/api/auth/google-token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "googleToken": token }).to_string(),
            ))
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(login(id_token("kid-2026-a", "erika")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["user"]["id"], "erika");

    server.publish(&[]);
    let response = app
        .oneshot(login(id_token("kid-2026-z", "sabrina")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
