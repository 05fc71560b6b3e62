use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use jobportal_types::api::Claims;

/// Lifetime of a signed token, and of the session that carries it.
pub const TOKEN_TTL_HOURS: i64 = 24;

pub fn token_ttl() -> Duration {
    Duration::hours(TOKEN_TTL_HOURS)
}

pub fn issue_token(user_id: Uuid, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    issue_token_at(user_id, secret, Utc::now())
}

pub fn issue_token_at(
    user_id: Uuid,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + token_ttl()).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Checks the HS256 signature and expiry. No store lookup.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
