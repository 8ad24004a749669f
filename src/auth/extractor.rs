use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use uuid::Uuid;

use crate::auth::jwt::{self, TokenKind};
use crate::auth::policy::{self, Permission};
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

pub const NOT_PROVIDED: &str = "Authentication credentials were not provided.";
pub const INVALID_TOKEN: &str = "Given token not valid for any token type";
pub const USER_NOT_FOUND: &str = "User not found";

/// The caller behind a valid access token, freshly loaded from the database so
/// status and role changes apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn require(&self, permissions: &[Permission]) -> Result<(), AppError> {
        policy::enforce(&self.user, permissions)
    }

    pub fn require_active(&self) -> Result<(), AppError> {
        self.require(&[Permission::Active])
    }

    /// Active, then admin.
    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require(&[Permission::Active, Permission::Admin])
    }

    pub fn require_owner_or_admin(&self, owner: Uuid) -> Result<(), AppError> {
        self.require(&[Permission::OwnerOrAdmin(owner)])
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized(NOT_PROVIDED.to_string()))?;

        let claims = jwt::decode_token(bearer.token(), &state.config.jwt_secret, TokenKind::Access)
            .map_err(|_| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;

        let user = db::users::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized(USER_NOT_FOUND.to_string()))?;

        Ok(AuthUser { user })
    }
}
