// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model shared by the token, the login redirect and the auth session.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Signed-in user. Never stored server-side, only round-tripped through
/// the session token and the browser's local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/generated/")
)]
pub struct User {
    /// Google subject identifier
    pub id: String,
    pub email: String,
    pub name: String,
    /// Profile picture URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}
