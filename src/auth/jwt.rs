use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::validation::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, token_type: TokenKind, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            jti: Uuid::now_v7(),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn expires_at(&self) -> chrono::DateTime<Utc> {
        chrono::DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token is invalid or expired")]
    Invalid,
    #[error("Token has wrong type")]
    WrongType,
    #[error("Token is blacklisted")]
    Blacklisted,
    #[error("User not found")]
    UnknownUser,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Token {
            errors: FieldErrors::single("refresh", err.to_string()),
        }
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

/// Decodes and checks signature, expiry and the `token_type` claim.
pub fn decode_token(token: &str, secret: &str, expected: TokenKind) -> Result<Claims, TokenError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| TokenError::Invalid)?;

    if claims.token_type != expected {
        return Err(TokenError::WrongType);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    #[test]
    fn access_token_round_trip() {
        let user_id = Uuid::now_v7();
        let claims = Claims::new(user_id, TokenKind::Access, Duration::minutes(60));
        let token = encode_token(&claims, SECRET).unwrap();
        let decoded = decode_token(&token, SECRET, TokenKind::Access).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.exp - decoded.iat, 3600);
    }

    #[test]
    fn every_token_gets_its_own_jti() {
        let user_id = Uuid::now_v7();
        let a = Claims::new(user_id, TokenKind::Refresh, Duration::days(7));
        let b = Claims::new(user_id, TokenKind::Refresh, Duration::days(7));
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn wrong_type_is_reported() {
        let claims = Claims::new(Uuid::now_v7(), TokenKind::Access, Duration::minutes(5));
        let token = encode_token(&claims, SECRET).unwrap();
        assert_eq!(
            decode_token(&token, SECRET, TokenKind::Refresh),
            Err(TokenError::WrongType)
        );
    }

    #[test]
    fn expired_token_is_invalid() {
        let claims = Claims::new(Uuid::now_v7(), TokenKind::Refresh, Duration::hours(-2));
        let token = encode_token(&claims, SECRET).unwrap();
        assert_eq!(
            decode_token(&token, SECRET, TokenKind::Refresh),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let claims = Claims::new(Uuid::now_v7(), TokenKind::Access, Duration::minutes(5));
        let token = encode_token(&claims, "some-other-secret").unwrap();
        assert_eq!(
            decode_token(&token, SECRET, TokenKind::Access),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            decode_token("not.a.jwt", SECRET, TokenKind::Access),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn token_error_becomes_refresh_field_error() {
        let err: AppError = TokenError::Blacklisted.into();
        match err {
            AppError::Token { errors } => {
                assert_eq!(errors.get("refresh"), Some(&["Token is blacklisted".to_string()][..]));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
