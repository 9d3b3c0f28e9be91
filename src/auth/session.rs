//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.
//!
//! Token format: `base64url(payload).base64url(hmac_sha256(payload))`, where
//! `payload` is the JSON text `{"iat":..,"exp":..}`. The signature covers the
//! payload text itself, so verification hashes the literal decoded bytes and
//! never re-serializes the claims.

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "session";

/// Default session lifetime (24h)
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 60 * 60 * 24;

/// Signed session claims
///
/// Field order is part of the wire format: tokens minted elsewhere
/// serialize `iat` before `exp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Issued at (unix seconds)
    #[serde(default)]
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

impl SessionClaims {
    /// Check if the claims are expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Create a signed session token valid for 24 hours
///
/// # Errors
/// Returns `AppError::Misconfigured` if the secret is empty
pub fn issue_session_token(secret: &str) -> Result<String, AppError> {
    issue_session_token_at(secret, Utc::now(), DEFAULT_SESSION_TTL_SECONDS)
}

/// Create a signed session token with an explicit clock and lifetime
///
/// # Arguments
/// * `secret` - Shared secret used as HMAC key
/// * `issued_at` - Issue time, becomes `iat`
/// * `ttl_seconds` - Lifetime, `exp = iat + ttl_seconds`
pub fn issue_session_token_at(
    secret: &str,
    issued_at: DateTime<Utc>,
    ttl_seconds: i64,
) -> Result<String, AppError> {
    if secret.is_empty() {
        return Err(AppError::Misconfigured);
    }

    let iat = issued_at.timestamp();
    let exp = iat
        .checked_add(ttl_seconds)
        .ok_or_else(|| AppError::Config(format!("session lifetime {ttl_seconds}s overflows")))?;
    let claims = SessionClaims { iat, exp };

    // 1. Serialize claims to JSON
    let payload = serde_json::to_string(&claims).map_err(|e| AppError::Internal(e.into()))?;

    // 2. Sign the JSON text
    let signature = sign(payload.as_bytes(), secret)?;

    // 3. Return "{payload}.{signature}"
    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(payload.as_bytes()),
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Verify a session token against the current time
///
/// Returns `false` for anything that is not a well-formed, correctly
/// signed and unexpired token. Never fails.
pub fn verify_session_token(token: &str, secret: &str) -> bool {
    verify_session_token_at(token, secret, Utc::now())
}

/// Verify a session token against an explicit clock
pub fn verify_session_token_at(token: &str, secret: &str, now: DateTime<Utc>) -> bool {
    decode_session_token(token, secret)
        .is_some_and(|claims| !claims.is_expired_at(now))
}

/// Check signature and decode claims, ignoring expiry
fn decode_session_token(token: &str, secret: &str) -> Option<SessionClaims> {
    // 1. Split on the first separator
    let (payload_b64, signature_b64) = token.split_once('.')?;

    // 2. Decode payload to UTF-8 text
    let payload_bytes = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let payload = String::from_utf8(payload_bytes).ok()?;

    // 3. Verify HMAC over the exact decoded text (constant time)
    let signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).ok()?;

    // 4. Parse claims; `exp` is required
    serde_json::from_str(&payload).ok()
}

/// Compare a candidate credential with the shared secret in constant time
///
/// Both sides are reduced to HMAC digests keyed by the secret, so the
/// comparison time depends on neither the candidate's content nor its length.
/// The candidate is raw bytes: header values need not be valid UTF-8.
pub fn credential_matches(candidate: &[u8], secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }

    let Ok(expected) = sign(secret.as_bytes(), secret) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(candidate);
    mac.verify_slice(&expected).is_ok()
}

/// Build the `session` cookie for a freshly issued token
pub fn session_cookie(token: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::seconds(max_age_seconds))
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

fn sign(message: &[u8], secret: &str) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid HMAC key: {e}")))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}
