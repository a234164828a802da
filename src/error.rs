//! Server error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type. On the WebSocket channel its
//! `Display` text becomes the `message` of an error response; on HTTP routes
//! each variant maps to a status code and a structured JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body for HTTP routes.
///
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "Unknown command: bogus"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Correlation token of the failed request, when one was recovered.
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub request_id: Option<serde_json::Value>,
}

/// Server-side error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category  | HTTP Status               |
/// |-----------|-----------|---------------------------|
/// | 1000–1999 | Decode    | 400 Bad Request           |
/// | 2000–2999 | Dispatch  | 404 Not Found             |
/// | 3000–3999 | Server    | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Inbound frame was not a valid command envelope.
    #[error("invalid envelope: {0}")]
    Decode(String),

    /// No handler is registered under the command name.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The channel closed, or a frame could not be sent in time.
    #[error("transport error: {0}")]
    Transport(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Decode(_) => 1001,
            Self::UnknownCommand(_) => 2001,
            Self::Internal(_) => 3000,
            Self::Transport(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::UnknownCommand(_) => StatusCode::NOT_FOUND,
            Self::Transport(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the HTTP error response, echoing `request_id` in the body.
    #[must_use]
    pub fn into_response_with(self, request_id: Option<serde_json::Value>) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                request_id,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<axum::Error> for GatewayError {
    fn from(err: axum::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.into_response_with(None)
    }
}
