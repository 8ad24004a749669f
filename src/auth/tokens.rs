//! Issuing, refreshing and revoking token pairs against the persisted
//! outstanding/blacklist tables.

use chrono::Duration;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::jwt::{self, Claims, TokenError, TokenKind};
use crate::config::Config;
use crate::db;
use crate::error::AppError;
use crate::models::User;

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Result of a refresh call; `refresh` is only present when rotation is on.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshedTokens {
    pub access: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

fn issue_access(config: &Config, user_id: Uuid) -> Result<String, AppError> {
    let claims = Claims::new(
        user_id,
        TokenKind::Access,
        Duration::minutes(config.tokens.access_ttl_minutes),
    );
    jwt::encode_token(&claims, &config.jwt_secret).map_err(AppError::Internal)
}

async fn issue_refresh(pool: &PgPool, config: &Config, user_id: Uuid) -> Result<String, AppError> {
    let claims = Claims::new(
        user_id,
        TokenKind::Refresh,
        Duration::days(config.tokens.refresh_ttl_days),
    );
    let token = jwt::encode_token(&claims, &config.jwt_secret).map_err(AppError::Internal)?;
    db::tokens::record_outstanding(pool, claims.jti, user_id, claims.expires_at()).await?;
    Ok(token)
}

pub async fn issue_pair(pool: &PgPool, config: &Config, user_id: Uuid) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access: issue_access(config, user_id)?,
        refresh: issue_refresh(pool, config, user_id).await?,
    })
}

/// Decodes a refresh token and rejects it if it has been revoked.
pub async fn verify_refresh(pool: &PgPool, config: &Config, token: &str) -> Result<Claims, AppError> {
    let claims = jwt::decode_token(token, &config.jwt_secret, TokenKind::Refresh)?;
    if db::tokens::is_blacklisted(pool, claims.jti).await? {
        return Err(TokenError::Blacklisted.into());
    }
    Ok(claims)
}

/// Blacklists an already verified refresh token.
pub async fn revoke(pool: &PgPool, claims: &Claims) -> Result<(), AppError> {
    let inserted = db::tokens::blacklist(pool, claims.jti, claims.sub, claims.expires_at()).await?;
    if !inserted {
        return Err(TokenError::Blacklisted.into());
    }
    Ok(())
}

/// Exchanges a refresh token for a new access token, rotating the refresh
/// token when configured to.
pub async fn refresh(
    pool: &PgPool,
    config: &Config,
    token: &str,
) -> Result<(User, RefreshedTokens), AppError> {
    let claims = verify_refresh(pool, config, token).await?;

    let user = db::users::find_by_id(pool, claims.sub)
        .await?
        .ok_or(TokenError::UnknownUser)?;
    if !user.is_active() {
        return Err(AppError::Forbidden(crate::auth::policy::INACTIVE.to_string()));
    }

    let access = issue_access(config, user.id)?;
    let refresh = if config.tokens.rotate_refresh_tokens {
        if config.tokens.blacklist_after_rotation {
            revoke(pool, &claims).await?;
        }
        Some(issue_refresh(pool, config, user.id).await?)
    } else {
        None
    };

    Ok((user, RefreshedTokens { access, refresh }))
}

/// Revokes every live refresh token of the user; returns how many were added.
pub async fn revoke_all<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
) -> Result<u64, AppError> {
    Ok(db::tokens::blacklist_all_for_user(executor, user_id).await?)
}
