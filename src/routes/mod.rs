pub mod admin;
pub mod auth;
pub mod users;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Serialize;

use crate::auth::tokens::TokenPair;
use crate::error::AppError;
use crate::models::UserView;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: UserView,
}

impl UserPayload {
    pub fn new(user: impl Into<UserView>) -> Self {
        Self { user: user.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionPayload {
    pub user: UserView,
    pub tokens: TokenPair,
}

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(api_root))
        // Auth
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/token/refresh", post(auth::refresh))
        .route("/auth/me", get(auth::me))
        // Profile
        .route(
            "/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/users/change-password", post(users::change_password))
        // Admin
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{id}", get(admin::get_user))
        .route("/admin/users/{id}/activate", post(admin::activate_user))
        .route("/admin/users/{id}/deactivate", post(admin::deactivate_user))
}

async fn api_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to User Management System API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/auth/",
            "users": "/users/",
            "admin": "/admin/",
        },
    }))
}

pub async fn not_found() -> AppError {
    AppError::not_found()
}

pub async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed()
}

/// The body limit layer answers oversized requests with plain text before any
/// handler runs; swap those for the JSON envelope.
pub async fn envelope_payload_too_large(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return AppError::payload_too_large().into_response();
    }
    response
}
