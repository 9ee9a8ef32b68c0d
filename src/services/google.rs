// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth client for the authorization-code flow.
//!
//! Handles:
//! - Building the consent screen URL
//! - Exchanging the authorization code for an access token
//! - Fetching the signed-in user's profile

use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::models::User;
use crate::services::retry::{json_body, RetryPolicy, UpstreamError};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const SCOPES: &str = "openid profile email";
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    userinfo_url: String,
    retry: RetryPolicy,
}

/// Token endpoint response. Only the access token is used.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// `oauth2/v2/userinfo` response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl GoogleUserInfo {
    pub fn into_user(self) -> User {
        let email = self.email.unwrap_or_default();
        let name = self.name.unwrap_or_else(|| email.clone());
        User {
            id: self.id,
            email,
            name,
            picture: self.picture,
        }
    }
}

impl GoogleOAuthClient {
    /// Create a client with the OAuth credentials from `config`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building Google OAuth HTTP client")?;

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.oauth_callback_url(),
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Point the client at different token/userinfo endpoints.
    pub fn with_endpoints(mut self, token_url: String, userinfo_url: String) -> Self {
        self.token_url = token_url;
        self.userinfo_url = userinfo_url;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Consent screen URL carrying the signed `state`.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleTokenResponse, UpstreamError> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        self.retry
            .run("google_token_exchange", move || async move {
                let response = self.http.post(&self.token_url).form(&form).send().await?;
                json_body(response).await
            })
            .await
    }

    /// Fetch the profile of the user owning `access_token`.
    pub async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, UpstreamError> {
        self.retry
            .run("google_userinfo", move || async move {
                let response = self
                    .http
                    .get(&self.userinfo_url)
                    .bearer_auth(access_token)
                    .send()
                    .await?;
                json_body(response).await
            })
            .await
    }

    /// Full authorization-code flow: code → access token → `User`.
    pub async fn authenticate_code(&self, code: &str) -> Result<User, UpstreamError> {
        tracing::info!("Exchanging authorization code for tokens");
        let tokens = self.exchange_code(code).await?;
        let info = self.fetch_user_info(&tokens.access_token).await?;

        tracing::info!(user_id = %info.id, "Fetched Google user profile");
        Ok(info.into_user())
    }
}
