//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use purse_core::PurseError;
use purse_store::StoreError;

use crate::stripe::StripeError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid endpoint secret.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - the request is not allowed in this environment.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Bad request - malformed JSON or a bad webhook signature.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid fields.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Conflict - duplicate transaction or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

impl ApiError {
    /// Map a status answered by another purse endpoint back onto an error, so the
    /// caller sees the same status the endpoint returned.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => Self::BadRequest(message),
            401 => Self::Unauthorized,
            403 => Self::Forbidden(message),
            409 => Self::Conflict(message),
            422 => Self::Validation(message),
            _ => Self::ExternalService(message),
        }
    }

    /// The HTTP status this error renders as.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) | Self::ExternalService(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            Self::Unauthorized => ("unauthorized", "unauthorized".to_string()),
            Self::Forbidden(msg) => ("forbidden", msg),
            Self::BadRequest(msg) => ("bad_request", msg),
            Self::Validation(msg) => ("validation_failed", msg),
            Self::Conflict(msg) => ("conflict", msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                ("internal_error", "An internal error occurred".to_string())
            }
            Self::ExternalService(msg) => {
                tracing::error!(error = %msg, "External service error");
                ("external_service_error", msg)
            }
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(path) => Self::Conflict(format!("{path} already exists")),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<PurseError> for ApiError {
    fn from(err: PurseError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StripeError> for ApiError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::InvalidSignature => Self::BadRequest("Invalid webhook signature".into()),
            StripeError::Configuration(msg) => Self::Internal(msg),
            other => Self::ExternalService(other.to_string()),
        }
    }
}
