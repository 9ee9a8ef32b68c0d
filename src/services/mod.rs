// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod fusion;
pub mod google;
pub mod google_oidc;
pub mod identity;
pub mod oauth_state;
pub mod pokeapi;
pub mod retry;
pub mod token;

pub use fusion::{FusionRequest, FusionRequestBuilder, ImageOptions};
pub use google::GoogleOAuthClient;
pub use google_oidc::GoogleIdTokenVerifier;
pub use identity::{IdentityError, LoginResponse};
pub use pokeapi::PokeApiClient;
pub use retry::{RetryPolicy, UpstreamError};
pub use token::{Claims, Clock, ManualClock, SystemClock, TokenCodec, TokenError};
