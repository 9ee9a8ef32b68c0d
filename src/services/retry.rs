// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Retry-with-timeout policy for outbound HTTP calls.
//!
//! Every call to Google or PokeAPI goes through [`RetryPolicy::run`]. Only
//! transient failures (timeouts, connection errors, 5xx, 429) are retried.

use std::future::Future;
use std::time::Duration;

/// Failure of a call to an external API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("{label}: request timed out after {timeout_ms}ms")]
    Timeout { label: String, timeout_ms: u64 },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Whether trying again could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Timeout { .. } | UpstreamError::Transport(_) => true,
            UpstreamError::Status { status, .. } => *status == 429 || *status >= 500,
            UpstreamError::Decode(_) => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            UpstreamError::Decode(e.to_string())
        } else {
            UpstreamError::Transport(e.to_string())
        }
    }
}

/// Check response status, returning the response untouched on success.
pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    if status == 429 {
        tracing::warn!("Upstream rate limit hit (429)");
    }

    Err(UpstreamError::Status { status, body })
}

/// Check response status and parse the JSON body.
pub async fn json_body<T: for<'de> serde::Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| UpstreamError::Decode(e.to_string()))
}

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Deadline for each individual attempt
    pub attempt_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(10),
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (0-indexed), doubling each time.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let result = match tokio::time::timeout(self.attempt_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(UpstreamError::Timeout {
                    label: label.to_string(),
                    timeout_ms: self.attempt_timeout.as_millis() as u64,
                }),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < attempts => {
                    let backoff = self.backoff_for_attempt(attempt);
                    tracing::warn!(
                        label,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Transient upstream failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(label, attempts = attempt + 1, error = %e, "Upstream call failed");
                    return Err(e);
                }
            }
        }
    }
}
