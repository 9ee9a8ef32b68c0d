// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed OAuth `state` parameter.
//!
//! Format before base64url encoding: `nonce_hex|timestamp_ms_hex|hmac_hex`,
//! where the HMAC-SHA256 covers `nonce_hex|timestamp_ms_hex`. The nonce is
//! also set in a cookie on the browser that started the flow, and the
//! callback must present both.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// How long a consent round-trip may take.
pub const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

const NONCE_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("state is not valid base64url")]
    Encoding,
    #[error("state has the wrong shape")]
    Malformed,
    #[error("state signature mismatch")]
    Signature,
    #[error("state expired")]
    Expired,
    #[error("invalid HMAC key")]
    Key,
    #[error("system random number generator failed")]
    Random,
}

/// Fresh hex nonce from the system CSPRNG.
pub fn generate_nonce() -> Result<String, StateError> {
    let mut bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| StateError::Random)?;
    Ok(hex::encode(bytes))
}

/// Constant-time comparison of the nonce in the state and the one in the
/// browser cookie.
pub fn nonce_matches(from_state: &str, from_cookie: &str) -> bool {
    bool::from(from_state.as_bytes().ct_eq(from_cookie.as_bytes()))
}

fn mac_for(key: &[u8], payload: &str) -> Result<HmacSha256, StateError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| StateError::Key)?;
    mac.update(payload.as_bytes());
    Ok(mac)
}

/// Sign a fresh state value for a consent redirect issued at `now_ms`.
pub fn sign_state(key: &[u8], nonce: &str, now_ms: u128) -> Result<String, StateError> {
    if nonce.contains('|') {
        return Err(StateError::Malformed);
    }

    let payload = format!("{}|{:x}", nonce, now_ms);
    let signature = mac_for(key, &payload)?.finalize().into_bytes();
    let signed = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Check signature and age of a state value returned by the provider.
/// Returns the nonce it carries.
pub fn verify_state(key: &[u8], state: &str, now_ms: u128) -> Result<String, StateError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(state)
        .map_err(|_| StateError::Encoding)?;
    let state_str = String::from_utf8(bytes).map_err(|_| StateError::Encoding)?;

    let parts: Vec<&str> = state_str.split('|').collect();
    let [nonce_hex, timestamp_hex, signature_hex] = parts[..] else {
        return Err(StateError::Malformed);
    };

    let issued_at = u128::from_str_radix(timestamp_hex, 16).map_err(|_| StateError::Malformed)?;
    let signature = hex::decode(signature_hex).map_err(|_| StateError::Malformed)?;

    let payload = format!("{}|{}", nonce_hex, timestamp_hex);
    let expected = mac_for(key, &payload)?.finalize().into_bytes();

    if !bool::from(expected.as_slice().ct_eq(signature.as_slice())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return Err(StateError::Signature);
    }

    if now_ms.saturating_sub(issued_at) > STATE_MAX_AGE_MS {
        return Err(StateError::Expired);
    }

    Ok(nonce_hex.to_string())
}
