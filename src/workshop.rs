// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fusion workflow: pick two creatures, generate, name, save.
//!
//! Creature details load asynchronously, so each selection hands out a
//! [`Ticket`]. Only the newest ticket for a slot may fill it; answers to
//! older requests are dropped.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::config::Config;
use crate::models::{CreatureRecord, FusionRecord};
use crate::services::FusionRequestBuilder;
use crate::store::{FusionStore, KeyValueStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::First => f.write_str("pokemon1"),
            Slot::Second => f.write_str("pokemon2"),
        }
    }
}

/// Proof of a pending selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slot: Slot,
    seq: u64,
}

impl Ticket {
    pub fn slot(&self) -> Slot {
        self.slot
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkshopError {
    #[error("no creature selected for {0}")]
    SlotEmpty(Slot),

    #[error("cannot fuse a creature with itself")]
    SameCreature,

    #[error("nothing has been generated yet")]
    NoDraft,

    #[error("fusion name must not be empty")]
    EmptyName,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A generated, not yet saved, fusion.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionDraft {
    pub id: String,
    pub name: String,
    pub pokemon1: String,
    pub pokemon2: String,
    pub image: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SlotState {
    seq: u64,
    creature: Option<CreatureRecord>,
}

pub struct FusionWorkshop {
    builder: FusionRequestBuilder,
    slots: [SlotState; 2],
    draft: Option<FusionDraft>,
}

impl FusionWorkshop {
    pub fn new(builder: FusionRequestBuilder) -> Self {
        Self {
            builder,
            slots: Default::default(),
            draft: None,
        }
    }

    /// Workshop rendering through the configured image endpoint.
    pub fn from_config(config: &Config) -> Self {
        Self::new(FusionRequestBuilder::from_config(config))
    }

    /// Start choosing a creature for `slot`. Clears the slot and any draft,
    /// and invalidates earlier tickets for the slot.
    pub fn begin_selection(&mut self, slot: Slot) -> Ticket {
        let state = &mut self.slots[slot.index()];
        state.seq += 1;
        state.creature = None;
        self.draft = None;

        Ticket {
            slot,
            seq: state.seq,
        }
    }

    /// Fill the ticket's slot. Returns false, leaving the slot untouched,
    /// if a newer selection has started since.
    pub fn complete_selection(&mut self, ticket: Ticket, creature: CreatureRecord) -> bool {
        let state = &mut self.slots[ticket.slot.index()];
        if state.seq != ticket.seq {
            tracing::debug!(
                slot = %ticket.slot,
                creature = %creature.name,
                "Discarding stale creature details"
            );
            return false;
        }

        state.creature = Some(creature);
        true
    }

    /// Select synchronously.
    pub fn select(&mut self, slot: Slot, creature: CreatureRecord) {
        let ticket = self.begin_selection(slot);
        self.complete_selection(ticket, creature);
    }

    pub fn selected(&self, slot: Slot) -> Option<&CreatureRecord> {
        self.slots[slot.index()].creature.as_ref()
    }

    pub fn draft(&self) -> Option<&FusionDraft> {
        self.draft.as_ref()
    }

    /// Build the prompt and image URL for the two selected creatures.
    pub fn generate(&mut self, now: DateTime<Utc>) -> Result<&FusionDraft, WorkshopError> {
        let first = self
            .selected(Slot::First)
            .ok_or(WorkshopError::SlotEmpty(Slot::First))?;
        let second = self
            .selected(Slot::Second)
            .ok_or(WorkshopError::SlotEmpty(Slot::Second))?;

        if first.same_species(second) {
            return Err(WorkshopError::SameCreature);
        }

        let request = self.builder.build(first, second);
        let draft = FusionDraft {
            id: now.timestamp_millis().to_string(),
            name: default_fusion_name(&first.name, &second.name),
            pokemon1: first.name.clone(),
            pokemon2: second.name.clone(),
            image: request.image_url,
            prompt: request.prompt,
            created_at: now,
        };

        tracing::info!(
            pokemon1 = %draft.pokemon1,
            pokemon2 = %draft.pokemon2,
            "Generated fusion"
        );
        Ok(self.draft.insert(draft))
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), WorkshopError> {
        let draft = self.draft.as_mut().ok_or(WorkshopError::NoDraft)?;
        draft.name = name.into();
        Ok(())
    }

    /// Append the draft to the gallery under its (trimmed) name.
    pub fn save<S: KeyValueStore>(
        &self,
        store: &FusionStore<S>,
    ) -> Result<FusionRecord, WorkshopError> {
        let draft = self.draft.as_ref().ok_or(WorkshopError::NoDraft)?;
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(WorkshopError::EmptyName);
        }

        let record = FusionRecord::new(
            name,
            draft.pokemon1.as_str(),
            draft.pokemon2.as_str(),
            draft.image.as_str(),
            draft.created_at,
        );
        store.append(record.clone())?;
        Ok(record)
    }
}

/// Front half of the first name joined to the back half of the second,
/// capitalized: pikachu + bulbasaur = Pikasaur.
pub fn default_fusion_name(first: &str, second: &str) -> String {
    let first: Vec<char> = first.trim().to_lowercase().chars().collect();
    let second: Vec<char> = second.trim().to_lowercase().chars().collect();

    let mut name = first[..first.len() / 2]
        .iter()
        .chain(&second[second.len() / 2..])
        .copied();

    match name.next() {
        Some(c) => c.to_uppercase().chain(name).collect(),
        None => String::new(),
    }
}
