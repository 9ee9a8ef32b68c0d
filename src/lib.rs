// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PokéFusion: combine two Pokémon into one AI-generated creature.
//!
//! This crate provides the token-issuing API server (Google sign-in,
//! bearer-token gate) and the client-side core used by the fusion app:
//! prompt building, the fusion gallery store and the auth session.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;
pub mod workshop;

use config::Config;
use services::{FusionRequestBuilder, GoogleIdTokenVerifier, GoogleOAuthClient, TokenCodec};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub token_codec: TokenCodec,
    pub google: GoogleOAuthClient,
    pub id_token_verifier: GoogleIdTokenVerifier,
    pub fusion_builder: FusionRequestBuilder,
}

impl AppState {
    /// Build the state from configuration, wiring every service.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let token_codec = TokenCodec::new(&config.jwt_signing_key, config.token_ttl_secs);
        let google = GoogleOAuthClient::new(&config)?;
        let id_token_verifier = if config.verify_google_id_tokens {
            GoogleIdTokenVerifier::new(&config)?
        } else {
            tracing::warn!(
                "Google ID tokens are accepted without signature verification \
                 (set GOOGLE_VERIFY_ID_TOKEN=true to verify against Google JWKS)"
            );
            GoogleIdTokenVerifier::unverified()
        };
        let fusion_builder = FusionRequestBuilder::from_config(&config);

        Ok(Self {
            config,
            token_codec,
            google,
            id_token_verifier,
            fusion_builder,
        })
    }
}
