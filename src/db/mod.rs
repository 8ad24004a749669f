pub mod tokens;
pub mod users;

/// True when `err` is a unique-constraint violation reported by Postgres.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
