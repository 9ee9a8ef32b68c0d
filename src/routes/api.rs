// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::CreatureRecord;
use crate::services::FusionRequest;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{any, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// API routes (require authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api", get(api_index))
        .route("/api/me", get(get_me))
        .route("/api/fusions/preview", post(preview_fusion))
        .route("/api/{*rest}", any(super::route_not_found))
}

#[derive(Serialize)]
struct ApiIndexResponse {
    message: &'static str,
}

async fn api_index() -> Json<ApiIndexResponse> {
    Json(ApiIndexResponse {
        message: "API routes coming soon",
    })
}

/// Identity carried by the session token.
async fn get_me(Extension(user): Extension<AuthUser>) -> Json<AuthUser> {
    Json(user)
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub pokemon1: CreatureRecord,
    pub pokemon2: CreatureRecord,
}

/// Build the fusion prompt and image URL for two creatures.
async fn preview_fusion(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<FusionRequest>> {
    let Json(body) = payload?;
    if body.pokemon1.same_species(&body.pokemon2) {
        return Err(AppError::BadRequest(
            "Select two different Pokémon".to_string(),
        ));
    }

    let request = state.fusion_builder.build(&body.pokemon1, &body.pokemon2);

    tracing::info!(
        user_id = %user.id,
        pokemon1 = %body.pokemon1.name,
        pokemon2 = %body.pokemon2.name,
        "Built fusion preview"
    );

    Ok(Json(request))
}
