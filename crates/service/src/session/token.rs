//! Client-side inspection of the backend's bearer token.
//!
//! The signature is never checked here; the backend does that. We only read
//! `exp` so an expired session can be ended before the next call fails.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;

use crate::errors::SessionError;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Claims {
    /// Expiry in seconds since the epoch.
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
}

pub fn decode_claims(token: &str) -> Result<Claims, SessionError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| SessionError::MalformedToken("missing payload segment".into()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| SessionError::MalformedToken(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| SessionError::MalformedToken(e.to_string()))
}

/// Fail-closed expiry test: no token, an undecodable token, a token without
/// `exp`, or `exp <= now` all count as expired.
pub fn is_expired(token: Option<&str>, now_secs: i64) -> bool {
    let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
        return true;
    };
    match decode_claims(token) {
        Ok(Claims { exp: Some(exp), .. }) => exp <= now_secs,
        _ => true,
    }
}
