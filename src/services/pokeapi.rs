// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PokeAPI client for creature listings and details.

use anyhow::Context;
use std::time::Duration;

use crate::config::Config;
use crate::models::{CreatureList, CreatureRecord};
use crate::services::retry::{json_body, RetryPolicy, UpstreamError};

/// Number of creatures the selector lists.
pub const DEFAULT_LIST_LIMIT: u32 = 1328;
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// PokeAPI client.
#[derive(Clone)]
pub struct PokeApiClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl PokeApiClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building PokeAPI HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(config.pokeapi_base_url.clone())
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn list_url(&self, limit: u32) -> String {
        format!("{}/pokemon?limit={}", self.base_url, limit)
    }

    pub fn creature_url(&self, name: &str) -> String {
        format!(
            "{}/pokemon/{}",
            self.base_url,
            urlencoding::encode(&normalize_name(name))
        )
    }

    /// List creature names, in Pokédex order.
    pub async fn list_creatures(&self, limit: u32) -> Result<CreatureList, UpstreamError> {
        let url = self.list_url(limit);
        let list: CreatureList = self
            .retry
            .run("pokeapi_list", || {
                let request = self.http.get(&url);
                async move { json_body(request.send().await?).await }
            })
            .await?;

        tracing::debug!(count = list.results.len(), "Fetched creature list");
        Ok(list)
    }

    /// Fetch one creature's attributes by name.
    pub async fn get_creature(&self, name: &str) -> Result<CreatureRecord, UpstreamError> {
        let url = self.creature_url(name);
        tracing::debug!(url = %url, "Fetching creature details");

        self.retry
            .run("pokeapi_creature", || {
                let request = self.http.get(&url);
                async move { json_body(request.send().await?).await }
            })
            .await
    }
}

/// PokeAPI names are lower-case with no surrounding whitespace.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
