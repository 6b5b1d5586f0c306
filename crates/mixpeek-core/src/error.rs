//! Core error types and the shared error-code taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error codes shared by every connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Non-2xx response from the remote API.
    ApiError,
    /// The remote call exceeded its deadline.
    ApiTimeout,
    /// A required configuration value is missing or malformed.
    InvalidConfig,
    /// The caller's payload is malformed.
    InvalidInput,
}

impl ErrorCode {
    /// Returns the wire representation of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ApiError => "API_ERROR",
            ErrorCode::ApiTimeout => "API_TIMEOUT",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::InvalidInput => "INVALID_INPUT",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error details attached to a degraded result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    /// Creates new error details.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Errors raised by the core engine.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Required configuration is missing or invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Caller input could not be processed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SignalError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SignalError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            SignalError::InvalidInput(_) => ErrorCode::InvalidInput,
        }
    }

    /// Converts this error into attachable details.
    pub fn info(&self) -> ErrorInfo {
        let message = match self {
            SignalError::InvalidConfig(m) | SignalError::InvalidInput(m) => m.clone(),
        };
        ErrorInfo::new(self.code(), message)
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, SignalError>;
