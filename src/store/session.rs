// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persisted login state.

use super::{KeyValueStore, StoreError};
use crate::models::User;

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const AUTH_USER_KEY: &str = "authUser";

/// Session token and user profile kept in a key-value store.
pub struct AuthSession<S> {
    backend: S,
}

impl<S: KeyValueStore> AuthSession<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn save_login(&self, token: &str, user: &User) -> Result<(), StoreError> {
        let user_json = serde_json::to_string(user)?;
        self.backend.set(AUTH_TOKEN_KEY, token)?;
        self.backend.set(AUTH_USER_KEY, &user_json)?;
        tracing::info!(user_id = %user.id, "Saved login");
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.backend.get(AUTH_TOKEN_KEY)
    }

    /// Stored profile; `None` if absent or unparsable.
    pub fn user(&self) -> Option<User> {
        let raw = self.backend.get(AUTH_USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Stored user is unreadable");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Store the outcome of a login redirect. Returns whether it was a
    /// successful login.
    pub fn apply_redirect(&self, redirect: &LoginRedirect) -> Result<bool, StoreError> {
        match redirect {
            LoginRedirect::LoggedIn { token, user } => {
                self.save_login(token, user)?;
                Ok(true)
            }
            LoginRedirect::Failed(error) => {
                tracing::warn!(error = %error, "Login failed");
                Ok(false)
            }
        }
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        self.backend.remove(AUTH_TOKEN_KEY)?;
        self.backend.remove(AUTH_USER_KEY)?;
        tracing::info!("Logged out");
        Ok(())
    }
}

/// What the frontend receives on `?token=..&user=..` or `?error=..`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginRedirect {
    LoggedIn { token: String, user: User },
    Failed(String),
}

impl LoginRedirect {
    /// Parse a redirect URL or bare query string. `None` if it carries
    /// neither a login nor an error.
    pub fn parse(url_or_query: &str) -> Option<Self> {
        let query = match url_or_query.split_once('?') {
            Some((_, q)) => q,
            None => url_or_query,
        };
        let query = query.split('#').next().unwrap_or_default();

        let mut token = None;
        let mut user = None;
        let mut error = None;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let Ok(value) = urlencoding::decode(value) else {
                continue;
            };
            match key {
                "token" => token = Some(value.into_owned()),
                "user" => user = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(error) = error {
            return Some(Self::Failed(error));
        }

        let token = token.filter(|t| !t.is_empty())?;
        match serde_json::from_str::<User>(&user?) {
            Ok(user) => Some(Self::LoggedIn { token, user }),
            Err(_) => Some(Self::Failed("invalid_user".to_string())),
        }
    }
}
