use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::utils::{error_to_api_response, errors_to_api_response};

#[derive(Debug)]
pub enum AppError {
    /// Single-message 400, e.g. a missing query parameter.
    BadRequest(String),
    /// Aggregated form validation, reported as an `errors` list.
    Validation(Vec<String>),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, error_to_api_response::<()>(message)).into_response()
            }
            AppError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, errors_to_api_response::<()>(errors)).into_response()
            }
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                error_to_api_response::<()>(message),
            )
                .into_response(),
            AppError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, error_to_api_response::<()>(message)).into_response()
            }
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, error_to_api_response::<()>(message)).into_response()
            }
            AppError::Conflict(message) => {
                (StatusCode::CONFLICT, error_to_api_response::<()>(message)).into_response()
            }
            AppError::Internal(detail) => {
                tracing::error!("internal error: {}", detail);
                let message = if cfg!(debug_assertions) {
                    format!("Internal server error: {}", detail)
                } else {
                    "Internal server error".to_string()
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response::<()>(message),
                )
                    .into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return AppError::Conflict("Duplicate record".to_string());
            }
        }
        AppError::Internal(err.to_string())
    }
}
