use std::sync::Arc;

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::auth::tokens::{self, RefreshedTokens};
use crate::db;
use crate::db::users::NewUser;
use crate::error::{AppError, VALIDATION_MESSAGE};
use crate::extract::Json;
use crate::models::Role;
use crate::response::ApiResponse;
use crate::routes::{SessionPayload, UserPayload};
use crate::state::SharedState;
use crate::validation::{FieldErrors, LoginForm, SignupForm, EMAIL_TAKEN, REQUIRED};

pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";
pub const ACCOUNT_DEACTIVATED: &str =
    "Your account has been deactivated. Please contact an administrator.";

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

impl RefreshRequest {
    fn token(self, message: &str) -> Result<String, AppError> {
        self.refresh
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::field(message, "refresh", REQUIRED))
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshPayload {
    pub tokens: RefreshedTokens,
}

pub async fn signup(
    State(state): State<SharedState>,
    Json(form): Json<SignupForm>,
) -> Result<ApiResponse<SessionPayload>, AppError> {
    let policy = Arc::clone(&state.password_policy);
    let account = password::off_thread(move || Ok(form.validate(policy.as_ref())?)).await?;

    if db::users::email_taken(&state.pool, &account.email, None).await? {
        return Err(FieldErrors::single("email", EMAIL_TAKEN).into());
    }

    let secret = account.password.clone();
    let password_hash =
        password::off_thread(move || password::hash(&secret).map_err(AppError::Internal)).await?;
    let user = db::users::create(
        &state.pool,
        &NewUser {
            email: &account.email,
            full_name: &account.full_name,
            password_hash: &password_hash,
            role: Role::User,
            is_staff: false,
            is_superuser: false,
        },
    )
    .await
    .map_err(|e| {
        // Lost a race with a concurrent signup for the same address.
        if db::is_unique_violation(&e) {
            FieldErrors::single("email", EMAIL_TAKEN).into()
        } else {
            AppError::from(e)
        }
    })?;

    let tokens = tokens::issue_pair(&state.pool, &state.config, user.id).await?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok(ApiResponse::created(
        "User registered successfully.",
        SessionPayload {
            user: user.into(),
            tokens,
        },
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(form): Json<LoginForm>,
) -> Result<ApiResponse<SessionPayload>, AppError> {
    let credentials = form.validate()?;

    let user = db::users::find_by_email(&state.pool, &credentials.email).await?;
    let verified = match &user {
        Some(user) => {
            let stored = user.password_hash.clone();
            let candidate = credentials.password;
            password::off_thread(move || {
                password::verify(&candidate, &stored).map_err(AppError::Internal)
            })
            .await?
        }
        None => false,
    };
    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::warn!("failed login attempt");
            return Err(AppError::field(VALIDATION_MESSAGE, "detail", INVALID_CREDENTIALS));
        }
    };

    if !user.is_active() {
        tracing::warn!(user_id = %user.id, "login refused for deactivated account");
        return Err(AppError::field(VALIDATION_MESSAGE, "detail", ACCOUNT_DEACTIVATED));
    }

    let user = db::users::record_login(&state.pool, user.id).await?;
    let tokens = tokens::issue_pair(&state.pool, &state.config, user.id).await?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user logged in");

    Ok(ApiResponse::ok(
        "Login successful.",
        SessionPayload {
            user: user.into(),
            tokens,
        },
    ))
}

pub async fn logout(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<RefreshRequest>,
) -> Result<ApiResponse, AppError> {
    let token = req.token("Refresh token is required.")?;

    let claims = tokens::verify_refresh(&state.pool, &state.config, &token).await?;
    auth.require_owner_or_admin(claims.sub)?;
    tokens::revoke(&state.pool, &claims).await?;

    tracing::info!(user_id = %auth.id(), token_owner = %claims.sub, "refresh token revoked");
    Ok(ApiResponse::message("Logged out successfully."))
}

pub async fn refresh(
    State(state): State<SharedState>,
    Json(req): Json<RefreshRequest>,
) -> Result<ApiResponse<RefreshPayload>, AppError> {
    let token = req.token(VALIDATION_MESSAGE)?;

    let (user, tokens) = tokens::refresh(&state.pool, &state.config, &token).await?;
    tracing::info!(
        user_id = %user.id,
        rotated = tokens.refresh.is_some(),
        "access token refreshed"
    );

    Ok(ApiResponse::ok(
        "Token refreshed successfully.",
        RefreshPayload { tokens },
    ))
}

pub async fn me(auth: AuthUser) -> Result<ApiResponse<UserPayload>, AppError> {
    auth.require_active()?;
    Ok(ApiResponse::ok(
        "User data retrieved successfully.",
        UserPayload::new(auth.user),
    ))
}
