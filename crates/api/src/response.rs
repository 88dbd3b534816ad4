//! Standardized API responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use nexus_core::EnrichedEvent;
use serde::{Deserialize, Serialize};

/// Response to an accepted analytics event.
#[derive(Debug, Serialize, Deserialize)]
pub struct CollectResponse {
    pub success: bool,
    pub timestamp: i64,
}

impl CollectResponse {
    pub fn success() -> Self {
        Self {
            success: true,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Recently collected events.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventsResponse {
    pub count: usize,
    pub events: Vec<EnrichedEvent>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub sink_connected: bool,
    pub tracked_clients: usize,
    pub collected_events: usize,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error carrying a coded body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
            retry_after: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_001", msg)
    }

    pub fn rate_limited(msg: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            response: ErrorResponse::new(msg, "RATE_001"),
            retry_after,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", msg)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn validation(code: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            response: ErrorResponse::new("Validation failed", code).with_details(errors),
            retry_after: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

impl From<nexus_core::Error> for ApiError {
    fn from(err: nexus_core::Error) -> Self {
        use nexus_core::Error;

        match &err {
            Error::ValidationWithCode {
                code,
                message,
                http_status,
            } => {
                let status = StatusCode::from_u16(*http_status).unwrap_or(StatusCode::BAD_REQUEST);
                ApiError::validation(*code, vec![message.clone()]).with_status(status)
            }
            Error::RateLimit {
                message,
                retry_after,
                ..
            } => ApiError::rate_limited(message, *retry_after),
            Error::Sink {
                code,
                message,
                http_status,
            } => {
                let status = StatusCode::from_u16(*http_status).unwrap_or(StatusCode::BAD_GATEWAY);
                ApiError::with_code(status, *code, message)
            }
            Error::Validation(msg) => ApiError::validation("VALID_001", vec![msg.clone()]),
            Error::Serialization(e) => ApiError::bad_request(format!("Invalid JSON: {}", e)),
            Error::UnknownMetric(_) => ApiError::bad_request(err.to_string()),
            _ => ApiError::internal(err.to_string()),
        }
    }
}
