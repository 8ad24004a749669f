use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::users::UserFilter;
use crate::error::AppError;
use crate::extract::{Path, Query};
use crate::lifecycle::{self, Transition};
use crate::models::{Role, Status, UserView};
use crate::pagination::{self, Page};
use crate::response::ApiResponse;
use crate::routes::UserPayload;
use crate::state::SharedState;

const USERS_PATH: &str = "/admin/users";

/// Raw query parameters. Filters are kept as strings so unknown values can be
/// ignored instead of rejected.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub status: Option<String>,
    pub role: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
}

impl ListUsersQuery {
    fn filter(&self) -> UserFilter {
        UserFilter {
            status: self.status.as_deref().and_then(Status::parse),
            role: self.role.as_deref().and_then(Role::parse),
            search: self.search.clone(),
        }
    }

    fn link_params(&self) -> Vec<(&'static str, &str)> {
        [
            ("status", self.status.as_deref()),
            ("role", self.role.as_deref()),
            ("search", self.search.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct UserListPayload {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub users: Vec<UserView>,
}

pub async fn list_users(
    State(state): State<SharedState>,
    auth: AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<ApiResponse<UserListPayload>, AppError> {
    auth.require_admin()?;

    let filter = query.filter();
    let count = db::users::count(&state.pool, &filter).await?;
    let page = Page::resolve(query.page.as_deref(), state.config.page_size, count)?;
    let users = db::users::list(&state.pool, &filter, page.size, page.offset()).await?;

    let params = query.link_params();
    let link = |n: i64| pagination::link(&state.config.base_url, USERS_PATH, &params, n);

    Ok(ApiResponse::ok(
        "Users retrieved successfully.",
        UserListPayload {
            count,
            next: page.next().map(&link),
            previous: page.previous().map(&link),
            users: users.into_iter().map(UserView::from).collect(),
        },
    ))
}

pub async fn get_user(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<UserPayload>, AppError> {
    auth.require_admin()?;

    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(AppError::not_found)?;

    Ok(ApiResponse::ok(
        "User retrieved successfully.",
        UserPayload::new(user),
    ))
}

pub async fn activate_user(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<UserPayload>, AppError> {
    transition(&state, &auth, id, Transition::Activate).await
}

pub async fn deactivate_user(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<UserPayload>, AppError> {
    transition(&state, &auth, id, Transition::Deactivate).await
}

async fn transition(
    state: &SharedState,
    auth: &AuthUser,
    id: Uuid,
    transition: Transition,
) -> Result<ApiResponse<UserPayload>, AppError> {
    auth.require_admin()?;

    let user = lifecycle::apply(&state.pool, auth.id(), id, transition).await?;
    let message = format!(
        "User {} has been {} successfully.",
        user.email,
        transition.past_tense()
    );
    Ok(ApiResponse::ok(message, UserPayload::new(user)))
}
