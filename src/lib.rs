pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod lifecycle;
pub mod models;
pub mod pagination;
pub mod response;
pub mod routes;
pub mod state;
pub mod validation;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::{AppState, SharedState};
use crate::validation::StandardPasswordPolicy;

pub fn build_app(pool: PgPool, config: Config) -> Router {
    let max_body_size = config.max_body_size;
    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        password_policy: Arc::new(StandardPasswordPolicy::default()),
    });

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .method_not_allowed_fallback(routes::method_not_allowed)
        .fallback(routes::not_found)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(axum::middleware::map_response(routes::envelope_payload_too_large))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
