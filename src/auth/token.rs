//! HS256 token codec.
//!
//! Tokens carry caller-supplied claims plus `iat`/`exp`. Verification is purely
//! signature + expiry; nothing is stored.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

/// Decoded JWT payload.
pub type Claims = Map<String, Value>;

pub const TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token encoding failed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Sign `claims` as issued now.
pub fn encode_claims(claims: Claims, secret: &str) -> Result<String, TokenError> {
    encode_claims_at(claims, secret, Utc::now())
}

/// Sign `claims` as issued at `issued_at`. Reserved claims are overwritten.
pub fn encode_claims_at(
    mut claims: Claims,
    secret: &str,
    issued_at: DateTime<Utc>,
) -> Result<String, TokenError> {
    let exp = issued_at + Duration::hours(TOKEN_LIFETIME_HOURS);
    claims.insert("iat".into(), Value::from(issued_at.timestamp()));
    claims.insert("exp".into(), Value::from(exp.timestamp()));

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::Encode)
}

/// Verify signature, expiry and `nbf` if present. Expired and tampered tokens are not distinguished
/// beyond the wrapped error.
pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(TokenError::Invalid)
}
