//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mixpeek_client::ClientError;
use mixpeek_core::{ErrorCode, SignalError};
use serde::Serialize;
use thiserror::Error;

/// API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed caller payload.
    #[error("{0}")]
    BadRequest(String),

    /// Unknown category or resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation needs configuration the server was started without.
    #[error("{0}")]
    NotConfigured(String),

    /// The remote API answered with an error. The message is passed through.
    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },

    /// The remote API did not answer in time.
    #[error("{0}")]
    Timeout(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidInput.as_str()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::NotConfigured(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::InvalidConfig.as_str(),
            ),
            ApiError::Upstream { .. } => (StatusCode::BAD_GATEWAY, ErrorCode::ApiError.as_str()),
            ApiError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, ErrorCode::ApiTimeout.as_str()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let upstream_status = match &self {
            ApiError::Upstream { status, .. } => *status,
            _ => None,
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            upstream_status,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { status, message } => ApiError::Upstream {
                status: Some(status),
                message,
            },
            ClientError::Timeout(_) => ApiError::Timeout(err.to_string()),
            ClientError::Network(_) | ClientError::Decode(_) => ApiError::Upstream {
                status: None,
                message: err.to_string(),
            },
            ClientError::InvalidConfig(message) => ApiError::NotConfigured(message),
            ClientError::InvalidInput(message) => ApiError::BadRequest(message),
        }
    }
}

impl From<SignalError> for ApiError {
    fn from(err: SignalError) -> Self {
        ClientError::from(err).into()
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
