use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::response::Envelope;
use crate::validation::FieldErrors;

pub const VALIDATION_MESSAGE: &str = "Validation error";
pub const TOKEN_MESSAGE: &str = "Invalid or expired token.";
pub const NOT_FOUND_MESSAGE: &str = "Resource not found.";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed.";
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Request body is too large.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}: {errors}")]
    Validation { message: String, errors: FieldErrors },
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Method Not Allowed: {0}")]
    MethodNotAllowed(String),
    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),
    #[error("Token Error: {errors}")]
    Token { errors: FieldErrors },
    #[error("Internal Error: {0}")]
    Internal(String),
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn validation(errors: FieldErrors) -> Self {
        AppError::Validation {
            message: VALIDATION_MESSAGE.to_string(),
            errors,
        }
    }

    /// Single-field validation failure with a caller-chosen top-level message.
    pub fn field(message: &str, field: &str, detail: &str) -> Self {
        AppError::Validation {
            message: message.to_string(),
            errors: FieldErrors::single(field, detail),
        }
    }

    pub fn not_found() -> Self {
        AppError::NotFound(NOT_FOUND_MESSAGE.to_string())
    }

    pub fn method_not_allowed() -> Self {
        AppError::MethodNotAllowed(METHOD_NOT_ALLOWED_MESSAGE.to_string())
    }

    pub fn payload_too_large() -> Self {
        AppError::PayloadTooLarge(PAYLOAD_TOO_LARGE_MESSAGE.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest(_) | AppError::Token { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::validation(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, errors) = match self {
            AppError::Validation { message, errors } => (message, Some(errors)),
            AppError::Token { errors } => (TOKEN_MESSAGE.to_string(), Some(errors)),
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::MethodNotAllowed(msg)
            | AppError::PayloadTooLarge(msg) => (msg, None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                ("Internal server error".to_string(), None)
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                ("Internal server error".to_string(), None)
            }
        };

        (status, axum::Json(Envelope::<()>::failure(message, errors))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::payload_too_large();
        }
        AppError::field(VALIDATION_MESSAGE, "detail", &rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::field(VALIDATION_MESSAGE, "detail", &rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::not_found()
    }
}
