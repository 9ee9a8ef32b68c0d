// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token authentication middleware.

use crate::error::AppError;
use crate::services::Claims;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;

/// Authenticated user extracted from the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Middleware that requires a valid `Authorization: Bearer` token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AppError::MissingAuthorization)?;

    let token = header
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or(AppError::MissingToken)?;

    let claims = state.token_codec.verify(token).map_err(|e| {
        tracing::debug!(error = %e, path = %request.uri().path(), "Rejected session token");
        AppError::InvalidToken
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Token following a `Bearer` scheme, if any.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
