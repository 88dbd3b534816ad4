//! Unified error types for Meteora Nexus.
//!
//! Error codes:
//! - VALID_001-003: Validation errors
//! - RATE_001: Rate limit errors
//! - SINK_001: Analytics sink errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Invalid JSON / Invalid format
    InvalidFormat,
    /// VALID_002: Payload exceeds the size limit
    PayloadTooLarge,
    /// VALID_003: Field value out of range
    OutOfRange,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "VALID_001",
            Self::PayloadTooLarge => "VALID_002",
            Self::OutOfRange => "VALID_003",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::PayloadTooLarge => 413,
            _ => 400,
        }
    }
}

/// Rate limit error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitErrorCode {
    /// RATE_001: Rate limit exceeded
    Exceeded,
}

impl RateLimitErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Exceeded => "RATE_001",
        }
    }

    pub fn http_status(&self) -> u16 {
        429
    }
}

/// Analytics sink error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkErrorCode {
    /// SINK_001: Event could not be delivered to the collection endpoint
    ForwardFailed,
}

impl SinkErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ForwardFailed => "SINK_001",
        }
    }

    pub fn http_status(&self) -> u16 {
        502
    }
}

/// Unified error type for Meteora Nexus.
#[derive(Debug, Error)]
pub enum Error {
    /// Validation error with code.
    #[error("[{code}] {message}")]
    ValidationWithCode {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Rate limit error with code.
    #[error("[{code}] {message}")]
    RateLimit {
        code: &'static str,
        message: String,
        http_status: u16,
        retry_after: Option<u64>,
    },

    /// Sink delivery error with code.
    #[error("[{code}] {message}")]
    Sink {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("invalid runtime mode: {0}")]
    InvalidMode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error with code.
    pub fn validation_code(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::ValidationWithCode {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a rate limit error.
    pub fn rate_limit(
        code: RateLimitErrorCode,
        msg: impl Into<String>,
        retry_after: Option<u64>,
    ) -> Self {
        Self::RateLimit {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
            retry_after,
        }
    }

    /// Create a sink error.
    pub fn sink(code: SinkErrorCode, msg: impl Into<String>) -> Self {
        Self::Sink {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ValidationWithCode { http_status, .. } => *http_status,
            Self::RateLimit { http_status, .. } => *http_status,
            Self::Sink { http_status, .. } => *http_status,
            Self::Validation(_) => 400,
            Self::Serialization(_) => 400,
            Self::UnknownMetric(_) => 400,
            Self::InvalidMode(_) => 500,
            Self::Config(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::ValidationWithCode { code, .. } => Some(code),
            Self::RateLimit { code, .. } => Some(code),
            Self::Sink { code, .. } => Some(code),
            _ => None,
        }
    }
}
