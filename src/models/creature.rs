// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Creature data as returned by PokeAPI.
//!
//! Only the fields the fusion prompt needs are modelled. Every list defaults
//! to empty so partial records still deserialize.

use serde::{Deserialize, Serialize};

/// A named API resource (`{ name, url }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NamedResource {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }
}

/// One entry of a creature's type list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

/// One entry of a creature's ability list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedResource,
    #[serde(default)]
    pub is_hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
}

/// Creature attribute record (`GET /pokemon/{name}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureRecord {
    pub name: String,
    #[serde(default)]
    pub id: Option<u32>,
    /// Height in decimetres
    #[serde(default)]
    pub height: Option<u32>,
    /// Weight in hectograms
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub sprites: Sprites,
}

impl CreatureRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            height: None,
            weight: None,
            types: Vec::new(),
            abilities: Vec::new(),
            sprites: Sprites::default(),
        }
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types
            .into_iter()
            .map(|t| TypeSlot {
                kind: NamedResource::named(t),
            })
            .collect();
        self
    }

    pub fn with_size(mut self, height: u32, weight: u32) -> Self {
        self.height = Some(height);
        self.weight = Some(weight);
        self
    }

    pub fn with_ability(mut self, name: impl Into<String>, is_hidden: bool) -> Self {
        self.abilities.push(AbilitySlot {
            ability: NamedResource::named(name),
            is_hidden,
        });
        self
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.kind.name.as_str())
    }

    /// Abilities that are not hidden.
    pub fn visible_abilities(&self) -> impl Iterator<Item = &str> {
        self.abilities
            .iter()
            .filter(|a| !a.is_hidden)
            .map(|a| a.ability.name.as_str())
    }

    /// Height in metres; a zero height is treated as unknown.
    pub fn height_m(&self) -> Option<f64> {
        self.height.filter(|h| *h > 0).map(|h| f64::from(h) * 0.1)
    }

    /// Weight in kilograms; a zero weight is treated as unknown.
    pub fn weight_kg(&self) -> Option<f64> {
        self.weight.filter(|w| *w > 0).map(|w| f64::from(w) * 0.1)
    }

    /// Whether both records name the same creature, ignoring case and
    /// surrounding whitespace.
    pub fn same_species(&self, other: &CreatureRecord) -> bool {
        self.name.trim().eq_ignore_ascii_case(other.name.trim())
    }
}

/// Paginated creature listing (`GET /pokemon?limit=N`).
#[derive(Debug, Clone, Deserialize)]
pub struct CreatureList {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub results: Vec<NamedResource>,
}
