// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in route tests: consent redirect, code callback and the direct
//! Google ID token exchange.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    routing::{get as get_route, post as post_route},
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use pokefusion::config::Config;
use pokefusion::routes::auth::OAUTH_NONCE_COOKIE;
use pokefusion::routes::create_router;
use pokefusion::services::oauth_state::{sign_state, verify_state};
use pokefusion::services::{
    FusionRequestBuilder, GoogleIdTokenVerifier, GoogleOAuthClient, RetryPolicy, TokenCodec,
};
use pokefusion::store::LoginRedirect;
use pokefusion::time_utils::now_unix_millis;
use pokefusion::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

mod common;

const TEST_KEY_PEM: &str = include_str!("fixtures/google_test_key.pem");
const TEST_N: &str = "p5TozbFThillDM70EkF88vhnveeID8X2DzHSseG80V4OcuOG1Oxhp9bW1zYiH7FnkXkdoclWTyyET2tmB48gE0RgRWOrCwO2OefyP34OaU2uWiq0YWM2iYbjDVA3USy0TuB5Dtc_uVT7Tbpp_SEsMYY5fcBwrkf8qpayBNXaxsrQ3EV1GhY_qkHkS8_ToJbutrQ6JJurgOtT8Gfm8DeLJsMsvq7ORlco5N_qTO_nMMgfPnxbohje7vHivKHHHyhNWLGqUSqWMXmJz5VRQCEFPrMl_HwaipUFF2Mxl-u4Zpht1_WR1aJ9jqBGj4XnIAD0riGD27iSRyuL-RSV8GEbmQ";
const TEST_KID: &str = "test-kid";
const NONCE: &str = "00112233445566778899aabbccddeeff";

/// App whose Google token/userinfo endpoints live under `google_base`.
fn create_app_with_google(
    google_base: &str,
    id_token_verifier: Option<GoogleIdTokenVerifier>,
) -> axum::Router {
    let config = Config::test_default();
    let google = GoogleOAuthClient::new(&config)
        .unwrap()
        .with_endpoints(
            format!("{google_base}/token"),
            format!("{google_base}/userinfo"),
        )
        .with_retry(RetryPolicy {
            max_attempts: 1,
            attempt_timeout: Duration::from_secs(2),
            ..RetryPolicy::default()
        });

    let state = Arc::new(AppState {
        token_codec: TokenCodec::new(&config.jwt_signing_key, config.token_ttl_secs),
        google,
        id_token_verifier: id_token_verifier.unwrap_or_else(GoogleIdTokenVerifier::unverified),
        fusion_builder: FusionRequestBuilder::from_config(&config),
        config,
    });

    create_router(state)
}

/// App whose Google endpoints point at a closed local port.
fn create_offline_app(id_token_verifier: Option<GoogleIdTokenVerifier>) -> axum::Router {
    create_app_with_google("http://127.0.0.1:9", id_token_verifier)
}

/// Local stand-in for Google's token and userinfo endpoints. The counter
/// tracks code exchanges.
async fn fake_google() -> (String, Arc<AtomicUsize>) {
    let exchanges = Arc::new(AtomicUsize::new(0));
    let counter = exchanges.clone();

    let router = Router::new()
        .route(
            "/token",
            post_route(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Json(serde_json::json!({ "access_token": "ya29.test", "expires_in": 3599 })) }
            }),
        )
        .route(
            "/userinfo",
            get_route(|| async {
                Json(serde_json::json!({
                    "id": "31337",
                    "email": "brock@pewter.gym",
                    "name": "Brock",
                }))
            }),
        );

    (common::serve(router).await, exchanges)
}

fn static_key_verifier() -> GoogleIdTokenVerifier {
    let key = DecodingKey::from_rsa_components(TEST_N, "AQAB").unwrap();
    GoogleIdTokenVerifier::new_with_static_key(&Config::test_default(), TEST_KID, key).unwrap()
}

fn unsigned_id_token(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.sig")
}

fn signed_id_token(payload: serde_json::Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    encode(
        &header,
        &payload,
        &EncodingKey::from_rsa_pem(TEST_KEY_PEM.as_bytes()).unwrap(),
    )
    .unwrap()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

fn nonce_set_cookie(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .find(|value| value.starts_with(&format!("{OAUTH_NONCE_COOKIE}=")))
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {OAUTH_NONCE_COOKIE}"))
}

fn signed_state(nonce: &str) -> String {
    sign_state(&Config::test_default().oauth_state_key, nonce, now_unix_millis()).unwrap()
}

async fn get(app: axum::Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn get_with_nonce_cookie(app: axum::Router, uri: &str, nonce: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, format!("{OAUTH_NONCE_COOKIE}={nonce}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn post_google_token(app: axum::Router, body: serde_json::Value) -> Response {
    post_google_token_raw(app, Some("application/json"), body.to_string()).await
}

async fn post_google_token_raw(
    app: axum::Router,
    content_type: Option<&str>,
    body: String,
) -> Response {
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/auth/google-token");
    if let Some(content_type) = content_type {
        request = request.header(header::CONTENT_TYPE, content_type);
    }

    app.oneshot(request.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_google_redirect() {
    let (app, state) = common::create_test_app();

    let response = get(app, "/api/auth/google").await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let url = location(&response);
    assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(url.contains("client_id=test-client-id.apps.googleusercontent.com"));
    assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fcallback"));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("scope=openid%20profile%20email"));

    let oauth_state = url.split("state=").nth(1).unwrap();
    let nonce = verify_state(
        &state.config.oauth_state_key,
        &urlencoding::decode(oauth_state).unwrap(),
        now_unix_millis(),
    )
    .expect("issued state should verify");

    let cookie = nonce_set_cookie(&response);
    assert!(cookie.starts_with(&format!("{OAUTH_NONCE_COOKIE}={nonce};")));
    assert!(cookie.contains("Path=/api/auth/callback"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_google_redirect_nonces_are_unpredictable() {
    let (app, _) = common::create_test_app();

    let first = nonce_set_cookie(&get(app.clone(), "/api/auth/google").await);
    let second = nonce_set_cookie(&get(app, "/api/auth/google").await);

    assert_ne!(first, second);
}

#[tokio::test]
async fn test_callback_without_code_is_bad_request() {
    let (app, _) = common::create_test_app();

    let response = get(app, "/api/auth/callback").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["details"], "No authorization code");
}

#[tokio::test]
async fn test_callback_provider_error_redirects() {
    let (app, _) = common::create_test_app();

    let response = get(app, "/api/auth/callback?error=access_denied").await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "http://localhost:5173?error=auth_failed"
    );
}

#[tokio::test]
async fn test_callback_with_tampered_state_redirects() {
    let (app, _) = common::create_test_app();
    let forged = sign_state(b"not-the-server-key", NONCE, now_unix_millis()).unwrap();

    let response = get_with_nonce_cookie(
        app,
        &format!("/api/auth/callback?code=abc&state={forged}"),
        NONCE,
    )
    .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "http://localhost:5173?error=auth_failed"
    );
}

#[tokio::test]
async fn test_callback_completes_login_with_matching_cookie() {
    let (google, exchanges) = fake_google().await;
    let app = create_app_with_google(&google, None);
    let state = signed_state(NONCE);

    let response = get_with_nonce_cookie(
        app,
        &format!("/api/auth/callback?code=abc&state={state}"),
        NONCE,
    )
    .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(exchanges.load(Ordering::SeqCst), 1);
    assert!(nonce_set_cookie(&response).contains("Max-Age=0"));

    match LoginRedirect::parse(&location(&response)) {
        Some(LoginRedirect::LoggedIn { user, .. }) => {
            assert_eq!(user.id, "31337");
            assert_eq!(user.email, "brock@pewter.gym");
        }
        other => panic!("expected a login redirect, got {other:?}"),
    }
}

#[tokio::test]
async fn test_callback_state_must_come_from_this_browser() {
    let (google, exchanges) = fake_google().await;
    let app = create_app_with_google(&google, None);
    let state = signed_state(NONCE);

    // No state at all.
    let response = get_with_nonce_cookie(app.clone(), "/api/auth/callback?code=abc", NONCE).await;
    assert_eq!(
        location(&response),
        "http://localhost:5173?error=auth_failed"
    );

    // Valid state, but no nonce cookie.
    let response = get(app.clone(), &format!("/api/auth/callback?code=abc&state={state}")).await;
    assert_eq!(
        location(&response),
        "http://localhost:5173?error=auth_failed"
    );

    // Valid state issued to another browser.
    let response = get_with_nonce_cookie(
        app,
        &format!("/api/auth/callback?code=abc&state={state}"),
        "ffeeddccbbaa99887766554433221100",
    )
    .await;
    assert_eq!(
        location(&response),
        "http://localhost:5173?error=auth_failed"
    );
    assert!(nonce_set_cookie(&response).contains("Max-Age=0"));

    assert_eq!(exchanges.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_callback_exchange_failure_redirects() {
    let app = create_offline_app(None);
    let state = signed_state(NONCE);

    let response = get_with_nonce_cookie(
        app,
        &format!("/api/auth/callback?code=abc&state={state}"),
        NONCE,
    )
    .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "http://localhost:5173?error=auth_failed"
    );
}

#[tokio::test]
async fn test_google_token_unreadable_bodies_are_json_bad_requests() {
    let (app, _) = common::create_test_app();

    let cases = [
        (Some("application/json"), r#"{"googleToken":123}"#),
        (Some("application/json"), "not json"),
        (Some("text/plain"), r#"{"googleToken":"abc"}"#),
        (None, r#"{"googleToken":"abc"}"#),
    ];

    for (content_type, body) in cases {
        let response = post_google_token_raw(app.clone(), content_type, body.to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        let json = common::body_json(response).await;
        assert_eq!(json["error"], "bad_request", "{body}");
        assert!(json["details"].is_string(), "{body}");
    }
}

#[tokio::test]
async fn test_google_token_missing_or_empty() {
    let (app, _) = common::create_test_app();

    let response = post_google_token(app.clone(), serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_google_token(app, serde_json::json!({ "googleToken": "" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_google_token_malformed() {
    let (app, _) = common::create_test_app();

    for token in ["one.two", "a.b.c.d", "head.!!!.sig"] {
        let response =
            post_google_token(app.clone(), serde_json::json!({ "googleToken": token })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{token}");
    }

    let no_email = unsigned_id_token(serde_json::json!({ "sub": "1", "name": "No Mail" }));
    let response = post_google_token(app, serde_json::json!({ "googleToken": no_email })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_google_token_login_issues_usable_session() {
    let (app, _) = common::create_test_app();
    let id_token = unsigned_id_token(serde_json::json!({
        "sub": "112233",
        "email": "oak@example.com",
        "name": "Professor Oak",
        "picture": "https://example.com/oak.png",
    }));

    let response =
        post_google_token(app.clone(), serde_json::json!({ "googleToken": id_token })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["user"]["id"], "112233");
    assert_eq!(body["user"]["email"], "oak@example.com");
    assert_eq!(body["user"]["picture"], "https://example.com/oak.png");
    let token = body["token"].as_str().unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me = common::body_json(response).await;
    assert_eq!(me["name"], "Professor Oak");
}

#[tokio::test]
async fn test_verified_mode_rejects_unsigned_token() {
    let app = create_offline_app(Some(static_key_verifier()));
    let id_token = unsigned_id_token(serde_json::json!({
        "sub": "1",
        "email": "mallory@example.com",
    }));

    let response = post_google_token(app, serde_json::json!({ "googleToken": id_token })).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verified_mode_accepts_signed_token() {
    let app = create_offline_app(Some(static_key_verifier()));
    let exp = now_unix_millis() / 1000 + 3600;

    let good = signed_id_token(serde_json::json!({
        "iss": "https://accounts.google.com",
        "aud": "test-client-id.apps.googleusercontent.com",
        "sub": "445566",
        "email": "gary@example.com",
        "name": "Gary",
        "exp": exp as u64,
    }));
    let response =
        post_google_token(app.clone(), serde_json::json!({ "googleToken": good })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["user"]["id"], "445566");

    let wrong_audience = signed_id_token(serde_json::json!({
        "iss": "https://accounts.google.com",
        "aud": "someone-else.apps.googleusercontent.com",
        "sub": "445566",
        "email": "gary@example.com",
        "exp": exp as u64,
    }));
    let response =
        post_google_token(app, serde_json::json!({ "googleToken": wrong_audience })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
