use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use edora_types::api::Claims;
use edora_types::models::TokenKind;

pub fn create_access_token(secret: &str, user_id: i64, ttl_minutes: i64) -> Result<String> {
    create_token(secret, user_id, TokenKind::Access, None, chrono::Duration::minutes(ttl_minutes))
}

/// `jti` must name the `refresh_tokens` row that backs this token.
pub fn create_refresh_token(secret: &str, user_id: i64, jti: &str, ttl_days: i64) -> Result<String> {
    create_token(
        secret,
        user_id,
        TokenKind::Refresh,
        Some(jti.to_string()),
        chrono::Duration::days(ttl_days),
    )
}

fn create_token(
    secret: &str,
    user_id: i64,
    kind: TokenKind,
    jti: Option<String>,
    ttl: chrono::Duration,
) -> Result<String> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        kind,
        jti,
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate signature and expiry, and require the expected token kind.
/// Returns the claims and the user id parsed from `sub`.
pub fn decode_token(secret: &str, token: &str, expected: TokenKind) -> Option<(Claims, i64)> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;

    if data.claims.kind != expected {
        return None;
    }
    let user_id = data.claims.sub.parse().ok()?;
    Some((data.claims, user_id))
}
