// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PokéFusion API Server
//!
//! Signs users in with Google and issues the session tokens the fusion app
//! sends on every API call.

use pokefusion::{config::Config, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting PokéFusion API");

    let state = Arc::new(AppState::from_config(config)?);
    tracing::info!(
        frontend_url = %state.config.frontend_url,
        verify_id_tokens = state.id_token_verifier.verifies_signatures(),
        token_ttl_secs = state.token_codec.ttl_secs(),
        "Services initialized"
    );

    let addr = format!("0.0.0.0:{}", state.config.port);
    let app = pokefusion::routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pokefusion=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();

    Ok(())
}
