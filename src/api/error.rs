//! API error types with envelope JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::api::response::ApiResponse;

/// API-level errors with HTTP status mapping.
///
/// Handlers return `Result<ApiResponse, ApiError>`, so every failure
/// path short-circuits with `?` or an early return and still renders the
/// uniform envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed")]
    Validation(Vec<String>),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Endpoint not found")]
    EndpointNotFound,
    #[error("Database connection failed")]
    DatabaseUnavailable,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let response = match self {
            ApiError::BadRequest(message) => ApiResponse::bad_request(message),
            ApiError::Validation(errors) => ApiResponse::json(
                StatusCode::BAD_REQUEST,
                false,
                "Validation failed",
                Some(Value::from(errors)),
            ),
            ApiError::NotFound(message) => ApiResponse::not_found(message),
            ApiError::MethodNotAllowed => ApiResponse::json(
                StatusCode::METHOD_NOT_ALLOWED,
                false,
                "Method not allowed",
                None,
            ),
            ApiError::EndpointNotFound => {
                ApiResponse::not_found("Endpoint not found. Available: /api/patients")
            }
            ApiError::DatabaseUnavailable => ApiResponse::server_error("Database connection failed"),
            ApiError::Internal(message) => ApiResponse::server_error(message),
        };
        response.into_response()
    }
}
