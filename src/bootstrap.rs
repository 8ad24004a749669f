//! Seeding of the initial administrator account.

use sqlx::PgPool;

use crate::auth::password;
use crate::db;
use crate::db::users::NewUser;
use crate::error::AppError;
use crate::models::{Role, User};
use crate::validation::{validate_email, validate_full_name, FieldErrors, REQUIRED};

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "AdminPass123!";
pub const DEFAULT_ADMIN_NAME: &str = "Admin User";

#[derive(Debug)]
pub enum AdminSeed {
    Created(User),
    AlreadyExists(User),
}

/// Creates a superuser unless an account with `email` already exists. The
/// password is hashed as given; the strength policy applies to end users only.
pub async fn create_admin(
    pool: &PgPool,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<AdminSeed, AppError> {
    let mut errors = FieldErrors::new();
    let email = errors.check("email", validate_email(email));
    let full_name = errors.check("full_name", validate_full_name(full_name));
    if password.is_empty() {
        errors.add("password", REQUIRED);
    }
    let (Some(email), Some(full_name)) = (email, full_name) else {
        return Err(AppError::validation(errors));
    };
    errors.into_result()?;

    if let Some(existing) = db::users::find_by_email(pool, &email).await? {
        return Ok(AdminSeed::AlreadyExists(existing));
    }

    let password_hash = password::hash(password).map_err(AppError::Internal)?;
    let user = db::users::create(
        pool,
        &NewUser {
            email: &email,
            full_name: &full_name,
            password_hash: &password_hash,
            role: Role::Admin,
            is_staff: true,
            is_superuser: true,
        },
    )
    .await?;

    Ok(AdminSeed::Created(user))
}
