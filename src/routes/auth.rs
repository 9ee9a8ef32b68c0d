// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in routes.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::services::identity::{self, LoginResponse};
use crate::services::oauth_state;
use crate::time_utils::now_unix_millis;
use crate::AppState;

/// Cookie binding the consent round-trip to the browser that started it.
pub const OAUTH_NONCE_COOKIE: &str = "pokefusion_oauth_nonce";
const OAUTH_NONCE_COOKIE_PATH: &str = "/api/auth/callback";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/google", get(auth_start))
        .route("/api/auth/callback", get(auth_callback))
        .route("/api/auth/google-token", post(google_token_login))
        .route("/api/auth/logout", get(logout))
}

fn nonce_cookie(config: &crate::config::Config, nonce: String) -> Cookie<'static> {
    Cookie::build((OAUTH_NONCE_COOKIE, nonce))
        .path(OAUTH_NONCE_COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.backend_url.starts_with("https://"))
        .build()
}

fn clear_nonce_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(OAUTH_NONCE_COOKIE).path(OAUTH_NONCE_COOKIE_PATH))
}

/// Start OAuth flow - redirect to Google consent.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let nonce = oauth_state::generate_nonce()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to generate OAuth nonce: {e}")))?;
    let oauth_state =
        oauth_state::sign_state(&state.config.oauth_state_key, &nonce, now_unix_millis())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign OAuth state: {e}")))?;

    tracing::info!(
        redirect_uri = %state.config.oauth_callback_url(),
        "Starting OAuth flow, redirecting to Google"
    );

    Ok((
        jar.add(nonce_cookie(&state.config, nonce)),
        Redirect::temporary(&state.google.authorization_url(&oauth_state)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn auth_failed(frontend_url: &str) -> Redirect {
    Redirect::temporary(&format!("{frontend_url}?error=auth_failed"))
}

/// Check that the returned state is ours, fresh, and was issued to this browser.
fn check_state(state: &AppState, params: &CallbackParams, jar: &CookieJar) -> bool {
    let Some(returned) = params.state.as_deref().filter(|s| !s.is_empty()) else {
        tracing::warn!("Rejecting OAuth callback without state");
        return false;
    };

    let nonce =
        match oauth_state::verify_state(&state.config.oauth_state_key, returned, now_unix_millis()) {
            Ok(nonce) => nonce,
            Err(e) => {
                tracing::warn!(error = %e, "Rejecting OAuth callback with bad state");
                return false;
            }
        };

    match jar.get(OAUTH_NONCE_COOKIE) {
        Some(cookie) if oauth_state::nonce_matches(&nonce, cookie.value()) => true,
        Some(_) => {
            tracing::warn!("OAuth state was issued to a different browser");
            false
        }
        None => {
            tracing::warn!("OAuth callback without nonce cookie");
            false
        }
    }
}

/// OAuth callback - exchange the code and hand a session token to the frontend.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let frontend_url = &state.config.frontend_url;

    if let Some(error) = params.error.as_deref() {
        tracing::warn!(error = %error, "OAuth error from Google");
        return Ok((clear_nonce_cookie(jar), auth_failed(frontend_url)));
    }

    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("No authorization code".to_string()))?;

    if !check_state(&state, &params, &jar) {
        return Ok((clear_nonce_cookie(jar), auth_failed(frontend_url)));
    }
    let jar = clear_nonce_cookie(jar);

    let user = match state.google.authenticate_code(code).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Google code exchange failed");
            return Ok((jar, auth_failed(frontend_url)));
        }
    };

    let login = identity::issue_session(&state.token_codec, user)?;
    let user_json = serde_json::to_string(&login.user)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to encode user: {e}")))?;

    tracing::info!(user_id = %login.user.id, "OAuth login successful");

    Ok((
        jar,
        Redirect::temporary(&format!(
            "{}?token={}&user={}",
            frontend_url,
            login.token,
            urlencoding::encode(&user_json)
        )),
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GoogleTokenRequest {
    #[serde(rename = "googleToken", default)]
    #[validate(length(min = 1, message = "Google token is required"))]
    google_token: String,
}

/// Exchange a Google ID token for a session token.
async fn google_token_login(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GoogleTokenRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(body) = payload?;
    body.validate()
        .map_err(|_| AppError::BadRequest("Google token is required".to_string()))?;

    let user = state.id_token_verifier.verify(&body.google_token).await?;
    let login = identity::issue_session(&state.token_codec, user)?;

    tracing::info!(user_id = %login.user.id, "Google token login successful");
    Ok(Json(login))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Sessions are stateless; the client drops its token.
async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out successfully",
    })
}
