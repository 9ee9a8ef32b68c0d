// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saved fusion gallery: a JSON array of records under one storage key.

use super::{KeyValueStore, StoreError};
use crate::config::Config;
use crate::models::FusionRecord;

/// Default storage key for the gallery.
pub const DEFAULT_FUSIONS_KEY: &str = "pokefusions";

/// Ordered collection of saved fusions (oldest first).
pub struct FusionStore<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> FusionStore<S> {
    pub fn new(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Gallery under the configured `STORAGE_KEY_FUSIONS` key.
    pub fn from_config(backend: S, config: &Config) -> Self {
        Self::new(backend, config.storage_key_fusions.clone())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// All saved fusions in insertion order.
    ///
    /// A missing key or unparsable contents read as an empty gallery.
    pub fn list(&self) -> Vec<FusionRecord> {
        let Some(raw) = self.backend.get(&self.key) else {
            return Vec::new();
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key = %self.key, error = %e, "Saved fusions are unreadable, treating as empty");
            Vec::new()
        })
    }

    pub fn get(&self, id: &str) -> Option<FusionRecord> {
        self.list().into_iter().find(|f| f.id == id)
    }

    /// Save `record` at the end of the gallery. Fails without writing if the
    /// id is already taken.
    pub fn append(&self, record: FusionRecord) -> Result<(), StoreError> {
        let mut fusions = self.list();
        if fusions.iter().any(|f| f.id == record.id) {
            tracing::warn!(id = %record.id, "Fusion already saved");
            return Err(StoreError::Duplicate(record.id));
        }

        tracing::info!(id = %record.id, name = %record.name, "Saving fusion");
        fusions.push(record);
        self.write(&fusions)
    }

    /// Delete the fusion with `id`. Returns whether anything was removed.
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut fusions = self.list();
        let before = fusions.len();
        fusions.retain(|f| f.id != id);

        if fusions.len() == before {
            return Ok(false);
        }

        tracing::info!(id, "Deleted fusion");
        self.write(&fusions)?;
        Ok(true)
    }

    fn write(&self, fusions: &[FusionRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string(fusions)?;
        self.backend.set(&self.key, &json)
    }
}
