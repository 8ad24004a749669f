use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A refresh token that has been issued, keyed by its `jti` claim.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutstandingToken {
    pub jti: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
