// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saved fusion record, as kept in the gallery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::format_utc_rfc3339;

/// A fusion of two Pokémon and the URL of its generated image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct FusionRecord {
    /// Creation time in milliseconds since the epoch, as a string
    pub id: String,
    /// User-assigned name
    pub name: String,
    pub pokemon1: String,
    pub pokemon2: String,
    /// Generated image URL
    pub image: String,
    /// Creation timestamp (RFC 3339, UTC)
    pub created_at: String,
}

impl FusionRecord {
    /// Create a record stamped with `created_at`; the id is derived from it.
    pub fn new(
        name: impl Into<String>,
        pokemon1: impl Into<String>,
        pokemon2: impl Into<String>,
        image: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: created_at.timestamp_millis().to_string(),
            name: name.into(),
            pokemon1: pokemon1.into(),
            pokemon2: pokemon2.into(),
            image: image.into(),
            created_at: format_utc_rfc3339(created_at),
        }
    }
}
