use std::sync::Arc;

use axum::extract::State;

use crate::auth::extractor::AuthUser;
use crate::auth::{password, tokens};
use crate::db;
use crate::error::AppError;
use crate::extract::Json;
use crate::response::ApiResponse;
use crate::routes::UserPayload;
use crate::state::SharedState;
use crate::validation::{ChangePasswordForm, FieldErrors, ProfileForm, UserAttributes, EMAIL_TAKEN};

pub async fn get_profile(auth: AuthUser) -> Result<ApiResponse<UserPayload>, AppError> {
    auth.require_active()?;
    Ok(ApiResponse::ok(
        "Profile retrieved successfully.",
        UserPayload::new(auth.user),
    ))
}

pub async fn update_profile(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(form): Json<ProfileForm>,
) -> Result<ApiResponse<UserPayload>, AppError> {
    auth.require_active()?;
    let changes = form.validate()?;

    if let Some(email) = changes.email.as_deref() {
        if db::users::email_taken(&state.pool, email, Some(auth.id())).await? {
            return Err(FieldErrors::single("email", EMAIL_TAKEN).into());
        }
    }

    let user = db::users::update_profile(
        &state.pool,
        auth.id(),
        changes.email.as_deref(),
        changes.full_name.as_deref(),
    )
    .await
    .map_err(|e| {
        if db::is_unique_violation(&e) {
            FieldErrors::single("email", EMAIL_TAKEN).into()
        } else {
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id = %user.id, "profile updated");
    Ok(ApiResponse::ok(
        "Profile updated successfully.",
        UserPayload::new(user),
    ))
}

pub async fn change_password(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(form): Json<ChangePasswordForm>,
) -> Result<ApiResponse, AppError> {
    auth.require_active()?;
    let user_id = auth.id();

    let policy = Arc::clone(&state.password_policy);
    let user = auth.user;
    let password_hash = password::off_thread(move || {
        let attrs = UserAttributes {
            email: Some(&user.email),
            full_name: Some(&user.full_name),
        };
        let new_password = form.validate(&attrs, policy.as_ref(), |candidate| {
            password::verify(candidate, &user.password_hash).map_err(AppError::Internal)
        })?;
        password::hash(&new_password).map_err(AppError::Internal)
    })
    .await?;

    // The new hash and the revocations land together or not at all.
    let mut tx = state.pool.begin().await?;
    db::users::update_password(&mut *tx, user_id, &password_hash).await?;
    let revoked = tokens::revoke_all(&mut *tx, user_id).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user_id, revoked, "password changed");
    Ok(ApiResponse::message("Password changed successfully."))
}
