// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::env;
use std::str::FromStr;

use crate::services::ImageOptions;

/// Default session token lifetime (7 days).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Frontend URL for OAuth redirects
    pub frontend_url: String,
    /// Public URL of this API, used to build the OAuth callback
    pub backend_url: String,
    /// Server port
    pub port: u16,
    /// Session token lifetime in seconds
    pub token_ttl_secs: u64,
    /// Local storage key holding the saved fusions
    pub storage_key_fusions: String,
    /// Image generation endpoint; the encoded prompt is appended to it
    pub image_api_base_url: String,
    /// Extra query parameters for generated images
    pub image_options: ImageOptions,
    /// Creature data API base URL
    pub pokeapi_base_url: String,
    /// Verify Google ID token signatures against Google's JWKS
    pub verify_google_id_tokens: bool,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test-client-id.apps.googleusercontent.com".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            backend_url: "http://localhost:3000".to_string(),
            port: 3000,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            storage_key_fusions: "pokefusions".to_string(),
            image_api_base_url: "https://image.pollinations.ai/prompt/".to_string(),
            image_options: ImageOptions::default(),
            pokeapi_base_url: "https://pokeapi.co/api/v2".to_string(),
            verify_google_id_tokens: false,
            google_client_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_signing_key = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
            .into_bytes();

        let token_ttl_secs = match env::var("JWT_EXPIRES_IN") {
            Ok(raw) => parse_ttl(&raw).ok_or(ConfigError::Invalid {
                var: "JWT_EXPIRES_IN",
                value: raw,
            })?,
            Err(_) => DEFAULT_TOKEN_TTL_SECS,
        };

        let verify_google_id_tokens = match env::var("GOOGLE_VERIFY_ID_TOKEN") {
            Ok(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                var: "GOOGLE_VERIFY_ID_TOKEN",
                value: raw,
            })?,
            Err(_) => false,
        };

        let image_options = ImageOptions {
            width: parse_optional("IMAGE_WIDTH", env::var("IMAGE_WIDTH").ok())?,
            height: parse_optional("IMAGE_HEIGHT", env::var("IMAGE_HEIGHT").ok())?,
            seed: parse_optional("IMAGE_SEED", env::var("IMAGE_SEED").ok())?,
            nologo: match env::var("IMAGE_NOLOGO") {
                Ok(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                    var: "IMAGE_NOLOGO",
                    value: raw,
                })?,
                Err(_) => false,
            },
        };

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            token_ttl_secs,
            storage_key_fusions: env::var("STORAGE_KEY_FUSIONS")
                .unwrap_or_else(|_| "pokefusions".to_string()),
            image_api_base_url: env::var("IMAGE_API_BASE_URL")
                .unwrap_or_else(|_| "https://image.pollinations.ai/prompt/".to_string()),
            image_options,
            pokeapi_base_url: env::var("POKEAPI_BASE_URL")
                .unwrap_or_else(|_| "https://pokeapi.co/api/v2".to_string()),
            verify_google_id_tokens,

            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map(String::into_bytes)
                .unwrap_or_else(|_| jwt_signing_key.clone()),
            jwt_signing_key,
        })
    }

    /// OAuth redirect URI registered with Google.
    pub fn oauth_callback_url(&self) -> String {
        format!(
            "{}/api/auth/callback",
            self.backend_url.trim_end_matches('/')
        )
    }
}

/// Parse a token lifetime such as `7d`, `12h`, `30m`, `45s` or `3600`.
pub fn parse_ttl(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], Some(c)),
        _ => (raw, None),
    };

    let value: u64 = digits.trim().parse().ok()?;
    let multiplier = match unit.map(|c| c.to_ascii_lowercase()) {
        None | Some('s') => 1,
        Some('m') => 60,
        Some('h') => 60 * 60,
        Some('d') => 24 * 60 * 60,
        Some('w') => 7 * 24 * 60 * 60,
        Some(_) => return None,
    };

    value.checked_mul(multiplier).filter(|secs| *secs > 0)
}

/// Unset or blank means `None`; anything else must parse.
fn parse_optional<T: FromStr>(
    var: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, ConfigError> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        _ => Ok(None),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
