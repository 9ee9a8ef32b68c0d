// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod creature;
pub mod fusion;
pub mod user;

pub use creature::{CreatureList, CreatureRecord};
pub use fusion::FusionRecord;
pub use user::User;
