// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google identity → local session exchange.
//!
//! [`decode_id_token_payload`] reads the claims of a Google ID token without
//! checking its signature. Callers that need the signature checked go
//! through [`GoogleIdTokenVerifier`](super::GoogleIdTokenVerifier).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::User;
use crate::services::retry::UpstreamError;
use crate::services::token::{TokenCodec, TokenError};

/// Failure turning a Google assertion into a `User`.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity token must have 3 segments, found {0}")]
    Structure(usize),

    #[error("identity token payload is not valid base64url")]
    Encoding,

    #[error("identity token payload is not valid JSON: {0}")]
    Payload(String),

    #[error("identity token is missing the {0} claim")]
    MissingClaim(&'static str),

    #[error("identity token rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Claims read from a Google ID token payload.
#[derive(Debug, Deserialize)]
pub(crate) struct IdTokenPayload {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl IdTokenPayload {
    pub(crate) fn into_user(self) -> Result<User, IdentityError> {
        let id = self
            .sub
            .filter(|s| !s.is_empty())
            .ok_or(IdentityError::MissingClaim("sub"))?;
        let email = self
            .email
            .filter(|s| !s.is_empty())
            .ok_or(IdentityError::MissingClaim("email"))?;
        let name = self.name.unwrap_or_else(|| email.clone());

        Ok(User {
            id,
            email,
            name,
            picture: self.picture,
        })
    }
}

/// Decode a three-part ID token's payload segment into a `User`.
///
/// The signature is NOT verified.
pub fn decode_id_token_payload(token: &str) -> Result<User, IdentityError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(IdentityError::Structure(segments.len()));
    }

    let bytes = decode_segment(segments[1]).ok_or(IdentityError::Encoding)?;
    let payload: IdTokenPayload =
        serde_json::from_slice(&bytes).map_err(|e| IdentityError::Payload(e.to_string()))?;

    payload.into_user()
}

/// Base64url-decode a JWT segment, tolerating present or missing padding.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .ok()
}

/// Successful login: the local session token and the user it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Sign a session token for `user`.
pub fn issue_session(codec: &TokenCodec, user: User) -> Result<LoginResponse, TokenError> {
    let token = codec.sign(&user)?;
    tracing::info!(user_id = %user.id, "Issued session token");
    Ok(LoginResponse { token, user })
}
