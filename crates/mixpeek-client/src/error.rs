//! Client error types.

use mixpeek_core::{ErrorCode, ErrorInfo, SignalError};
use thiserror::Error;

/// Errors from the remote API client.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The API answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request exceeded its deadline.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The request could not be sent or the connection failed.
    #[error("network error: {0}")]
    Network(String),

    /// The response body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Required configuration is missing or invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The request could not be built from the caller's input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ClientError {
    /// Returns the shared error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Api { .. } | ClientError::Network(_) | ClientError::Decode(_) => {
                ErrorCode::ApiError
            }
            ClientError::Timeout(_) => ErrorCode::ApiTimeout,
            ClientError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            ClientError::InvalidInput(_) => ErrorCode::InvalidInput,
        }
    }

    /// Returns true if another attempt may succeed.
    ///
    /// 4xx responses are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Api { status, .. } => *status >= 500,
            ClientError::Timeout(_) | ClientError::Network(_) => true,
            _ => false,
        }
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Converts this error into attachable details.
    pub fn info(&self) -> ErrorInfo {
        let message = match self {
            ClientError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };
        ErrorInfo::new(self.code(), message)
    }
}

impl From<SignalError> for ClientError {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::InvalidConfig(m) => ClientError::InvalidConfig(m),
            SignalError::InvalidInput(m) => ClientError::InvalidInput(m),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
