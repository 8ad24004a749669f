use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Role, Status, User};

/// Column values for a new account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Optional filters for the admin listing.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub status: Option<Status>,
    pub role: Option<Role>,
    pub search: Option<String>,
}

impl UserFilter {
    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)))
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user: &NewUser<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (id, email, full_name, password_hash, role, status, is_staff, is_superuser)
         VALUES ($1, $2, $3, $4, $5, 'active', $6, $7) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user.email)
    .bind(user.full_name)
    .bind(user.password_hash)
    .bind(user.role)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .fetch_one(executor)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Whether another account already owns `email`.
pub async fn email_taken(
    pool: &PgPool,
    email: &str,
    excluding: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(email)
    .bind(excluding)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    email: Option<&str>,
    full_name: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users
         SET email = COALESCE($2, email), full_name = COALESCE($3, full_name), updated_at = $4
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(email)
    .bind(full_name)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn update_password<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(executor)
        .await?;
    Ok(())
}

/// Records a successful login. `updated_at` is deliberately left alone.
pub async fn record_login(pool: &PgPool, id: Uuid) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>("UPDATE users SET last_login = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
}

/// Moves the account to `status` unless it is already there. Returns `None`
/// when no row changed.
pub async fn transition_status(
    pool: &PgPool,
    id: Uuid,
    status: Status,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET status = $2, updated_at = $3
         WHERE id = $1 AND status <> $2 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &UserFilter) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM users
         WHERE ($1::user_status IS NULL OR status = $1)
           AND ($2::user_role IS NULL OR role = $2)
           AND ($3::text IS NULL OR email ILIKE $3 OR full_name ILIKE $3)",
    )
    .bind(filter.status)
    .bind(filter.role)
    .bind(filter.search_pattern())
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn list(
    pool: &PgPool,
    filter: &UserFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users
         WHERE ($1::user_status IS NULL OR status = $1)
           AND ($2::user_role IS NULL OR role = $2)
           AND ($3::text IS NULL OR email ILIKE $3 OR full_name ILIKE $3)
         ORDER BY created_at DESC, id DESC
         LIMIT $4 OFFSET $5",
    )
    .bind(filter.status)
    .bind(filter.role)
    .bind(filter.search_pattern())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
