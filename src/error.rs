//! Error types with HTTP status code mapping.
//!
//! [`StreamError`] is the only error a caller can observe: it is returned
//! when a stream request is rejected before any connection exists.
//! [`SinkError`] describes transport failures on an existing connection;
//! those are never surfaced and are handled as implicit disconnects.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid topic id: topic id must not be empty"
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
}

/// Request-level error with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status                   |
/// |-----------|------------|-------------------------------|
/// | 1000–1999 | Validation | 400 Bad Request               |
/// | 3000–3999 | Server     | 500 / 503                     |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Missing or malformed topic id at stream-open or publish time.
    #[error("invalid topic id: {0}")]
    InvalidTopic(String),

    /// Request body validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A configured connection cap was reached.
    #[error("connection limit reached: {0}")]
    CapacityExceeded(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StreamError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidTopic(_) => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::Internal(_) => 3000,
            Self::CapacityExceeded(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidTopic(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::CapacityExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

/// Failure to write a frame to a connection's transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The receiving side is gone (client disconnected or sink closed).
    #[error("sink closed")]
    Closed,

    /// The client is not draining its buffer.
    #[error("sink buffer full")]
    Full,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn invalid_topic_maps_to_bad_request() {
        let err = StreamError::InvalidTopic("empty".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1001);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn capacity_maps_to_service_unavailable() {
        let err = StreamError::CapacityExceeded("topic display-1".to_string());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), 3002);
    }

    #[test]
    fn messages_include_detail() {
        let err = StreamError::InvalidRequest("event name is empty".to_string());
        assert_eq!(err.to_string(), "invalid request: event name is empty");
        assert_eq!(SinkError::Full.to_string(), "sink buffer full");
    }
}
