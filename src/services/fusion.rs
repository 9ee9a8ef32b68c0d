// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fusion prompt and image URL construction.
//!
//! No network call happens here: the caller loads the returned URL.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::Config;
use crate::models::CreatureRecord;

pub const DEFAULT_IMAGE_API_BASE_URL: &str = "https://image.pollinations.ai/prompt/";

const PROMPT_INTRO: &str = "Create a single fused Pokémon that combines these two Pokémon.";
const PROMPT_BLEND: &str = "Blend their colors, body shapes and distinctive features into one \
     coherent creature. Official Pokémon Sugimori art style, full body, white background, \
     single creature, no text.";

/// Optional query parameters understood by the image endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub nologo: bool,
}

impl ImageOptions {
    fn query_string(&self) -> Option<String> {
        let mut params = Vec::new();
        if let Some(width) = self.width {
            params.push(format!("width={width}"));
        }
        if let Some(height) = self.height {
            params.push(format!("height={height}"));
        }
        if let Some(seed) = self.seed {
            params.push(format!("seed={seed}"));
        }
        if self.nologo {
            params.push("nologo=true".to_string());
        }

        (!params.is_empty()).then(|| params.join("&"))
    }
}

/// Prompt plus the URL that renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct FusionRequest {
    pub prompt: String,
    pub image_url: String,
}

/// Builds image-generation requests against a configured endpoint.
#[derive(Debug, Clone)]
pub struct FusionRequestBuilder {
    base_url: String,
    options: ImageOptions,
}

impl Default for FusionRequestBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_API_BASE_URL)
    }
}

impl FusionRequestBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            options: ImageOptions::default(),
        }
    }

    /// Builder for the configured image endpoint and query parameters.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.image_api_base_url.clone()).with_options(config.image_options.clone())
    }

    pub fn with_options(mut self, options: ImageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(&self, first: &CreatureRecord, second: &CreatureRecord) -> FusionRequest {
        let prompt = build_prompt(first, second);
        let image_url = build_image_url(&self.base_url, &prompt, &self.options);
        FusionRequest { prompt, image_url }
    }
}

fn describe(position: u8, creature: &CreatureRecord) -> String {
    let types = creature
        .type_names()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" / ");
    let abilities = creature
        .visible_abilities()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(", ");
    let height = creature
        .height_m()
        .map_or_else(|| "N/A".to_string(), |m| format!("{m:.2}m"));
    let weight = creature
        .weight_kg()
        .map_or_else(|| "N/A".to_string(), |kg| format!("{kg:.2}kg"));

    format!(
        "Pokémon {position}: {}. Type: {types}. Height: {height}. Weight: {weight}. Abilities: {abilities}.",
        creature.name.to_uppercase()
    )
}

/// Describe both creatures, then ask for one merged creature.
pub fn build_prompt(first: &CreatureRecord, second: &CreatureRecord) -> String {
    [
        PROMPT_INTRO.to_string(),
        describe(1, first),
        describe(2, second),
        PROMPT_BLEND.to_string(),
    ]
    .join("\n")
}

/// Append the percent-encoded prompt (and any options) to `base_url`.
pub fn build_image_url(base_url: &str, prompt: &str, options: &ImageOptions) -> String {
    let mut url = format!("{}{}", base_url, urlencoding::encode(prompt));
    if let Some(query) = options.query_string() {
        url.push('?');
        url.push_str(&query);
    }
    url
}
