use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::OutstandingToken;

pub async fn record_outstanding(
    pool: &PgPool,
    jti: Uuid,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<OutstandingToken, sqlx::Error> {
    sqlx::query_as::<_, OutstandingToken>(
        "INSERT INTO outstanding_tokens (jti, user_id, expires_at)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(jti)
    .bind(user_id)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

pub async fn is_blacklisted(pool: &PgPool, jti: Uuid) -> Result<bool, sqlx::Error> {
    let row: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM blacklisted_tokens WHERE jti = $1)")
            .bind(jti)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

/// Adds the token to the denylist. Returns `false` if it was already there.
pub async fn blacklist(
    pool: &PgPool,
    jti: Uuid,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    // Tokens minted before outstanding tracking still get a parent row.
    sqlx::query(
        "INSERT INTO outstanding_tokens (jti, user_id, expires_at)
         VALUES ($1, $2, $3) ON CONFLICT (jti) DO NOTHING",
    )
    .bind(jti)
    .bind(user_id)
    .bind(expires_at)
    .execute(&mut *tx)
    .await?;

    let inserted = sqlx::query(
        "INSERT INTO blacklisted_tokens (jti) VALUES ($1) ON CONFLICT (jti) DO NOTHING",
    )
    .bind(jti)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;
    Ok(inserted == 1)
}

/// Revokes every unexpired refresh token the user holds.
pub async fn blacklist_all_for_user<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO blacklisted_tokens (jti)
         SELECT jti FROM outstanding_tokens WHERE user_id = $1 AND expires_at > now()
         ON CONFLICT (jti) DO NOTHING",
    )
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Deletes expired outstanding tokens; their denylist rows cascade.
pub async fn flush_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM outstanding_tokens WHERE expires_at < now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<OutstandingToken>, sqlx::Error> {
    sqlx::query_as::<_, OutstandingToken>(
        "SELECT * FROM outstanding_tokens WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
