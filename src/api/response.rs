//! Uniform JSON response envelope.
//!
//! Every response the API emits is `{"status": bool, "message": string}`
//! plus an optional `"data"` key, pretty-printed. Convenience
//! constructors cover the common status codes; all of them route through
//! [`ApiResponse::json`].

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

const CONTENT_TYPE_JSON: &str = "application/json; charset=UTF-8";

/// A fully-determined API response. Converting it into an axum
/// `Response` is the only way the API writes output, so once a handler
/// returns one, nothing further can run for that request.
#[derive(Debug)]
pub struct ApiResponse {
    status_code: StatusCode,
    status: bool,
    message: String,
    data: Option<Value>,
}

#[derive(Serialize)]
struct Envelope<'a> {
    status: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
}

impl ApiResponse {
    /// Single entry point: status code, success flag, message, optional data.
    pub fn json(
        status_code: StatusCode,
        status: bool,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            status_code,
            status,
            message: message.into(),
            data,
        }
    }

    /// 200 OK
    pub fn success(message: impl Into<String>, data: Option<Value>) -> Self {
        Self::json(StatusCode::OK, true, message, data)
    }

    /// 201 Created
    pub fn created(message: impl Into<String>, data: Option<Value>) -> Self {
        Self::json(StatusCode::CREATED, true, message, data)
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::json(StatusCode::BAD_REQUEST, false, message, None)
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::json(StatusCode::NOT_FOUND, false, message, None)
    }

    /// 500 Internal Server Error
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::json(StatusCode::INTERNAL_SERVER_ERROR, false, message, None)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            status: self.status,
            message: &self.message,
            data: self.data.as_ref(),
        };

        let body = serde_json::to_vec_pretty(&envelope).unwrap_or_else(|_| {
            br#"{"status": false, "message": "Response serialization failed"}"#.to_vec()
        });

        (
            self.status_code,
            [(header::CONTENT_TYPE, CONTENT_TYPE_JSON)],
            body,
        )
            .into_response()
    }
}
