use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::state::security_config::SecurityConfig;
use crate::AppError;

pub const DEFAULT_ROLE: &str = "ROLE_USER";

fn default_roles() -> Vec<String> {
    vec![DEFAULT_ROLE.to_string()]
}

/// Claims carried by access tokens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User email
    pub sub: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
}

/// Why a token was rejected. Callers outside this module collapse all three
/// into the same 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token malformed")]
    Malformed,
}

fn epoch_secs(now: SystemTime) -> Option<i64> {
    now.duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs() as i64)
}

/// Mint a HS256 access token for `sub` valid for the configured TTL.
pub fn mint_access_token(
    sub: &str,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    let iat =
        epoch_secs(now).ok_or_else(|| AppError::internal("Failed to get current time"))?;
    let exp = iat + security.token_ttl.as_secs() as i64;

    let claims = Claims {
        sub: sub.to_string(),
        iat,
        exp,
        roles: default_roles(),
    };

    encode(
        &Header::new(security.algorithm),
        &claims,
        &EncodingKey::from_secret(security.signing_key()),
    )
    .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
}

/// Verify `token` as of `now`.
///
/// Expiry is checked here rather than by `jsonwebtoken` so the boundary is
/// exact (no leeway) and testable with an injected clock.
pub fn verify_access_token_at(
    token: &str,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(security.algorithm);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(security.signing_key()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::BadSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    })?;

    let now = epoch_secs(now).ok_or(TokenError::Expired)?;
    if now >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

pub fn verify_access_token(token: &str, security: &SecurityConfig) -> Result<Claims, TokenError> {
    verify_access_token_at(token, SystemTime::now(), security)
}

/// Subject of a currently valid token, `None` otherwise.
pub fn subject_of(token: &str, security: &SecurityConfig) -> Option<String> {
    verify_access_token(token, security).ok().map(|c| c.sub)
}

/// Token part of an `Authorization` header value. Only the exact `Bearer `
/// prefix is accepted.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
