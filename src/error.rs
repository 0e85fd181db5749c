//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type for the relay. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Every failure is local and recoverable: a bad message degrades its own
//! operation, never the process.

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
///     "code": 2001,
///     "message": "pair not found: ...",
///     "details": null
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
    /// Numeric error code (see code ranges on [`RelayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category       | HTTP Status                |
/// |-----------|----------------|----------------------------|
/// | 1000–1999 | Validation     | 400 Bad Request            |
/// | 2000–2999 | Not Found      | 404 Not Found              |
/// | 3000–3999 | Server / Store | 500 Internal Server Error  |
/// | 4000–4999 | Correlation    | 408 / 500                  |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A capture envelope's embedded body could not be parsed. The whole
    /// record is dropped; no partial state is created.
    #[error("malformed capture envelope: {0}")]
    MalformedEnvelope(String),

    /// Pair with the given ID was not found in the registry.
    #[error("pair not found: {0}")]
    PairNotFound(String),

    /// No correlation record stored under the given ID.
    #[error("correlation record not found: {0}")]
    RecordNotFound(String),

    /// A stored response's own correlation header disagrees with the
    /// requester's correlation ID. Surfaced as a distinct failure so a
    /// wrong-paired response is never silently delivered.
    #[error("correlation id mismatch for {0}")]
    CorrelationMismatch(String),

    /// The bounded wait for a counterpart exhausted its attempt budget.
    #[error("timed out waiting for counterpart of {0}")]
    WaitTimeout(String),

    /// Backing correlation store failed during read or write.
    #[error("correlation store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::MalformedEnvelope(_) => 1002,
            Self::PairNotFound(_) => 2001,
            Self::RecordNotFound(_) => 2002,
            Self::Internal(_) => 3000,
            Self::StoreUnavailable(_) => 3001,
            Self::CorrelationMismatch(_) => 4001,
            Self::WaitTimeout(_) => 4008,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::MalformedEnvelope(_) => StatusCode::BAD_REQUEST,
            Self::PairNotFound(_) | Self::RecordNotFound(_) => StatusCode::NOT_FOUND,
            Self::StoreUnavailable(_) | Self::Internal(_) | Self::CorrelationMismatch(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::WaitTimeout(_) => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
