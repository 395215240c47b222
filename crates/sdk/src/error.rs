//! Error types for the SonarQube SDK.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Result type for SDK operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Stable, machine-readable classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiErrorKind {
    Timeout,
    AuthError,
    NotFound,
    InvalidRequest,
    BackendUnavailable,
    ResultTooLarge,
}

impl ApiErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "Timeout",
            Self::AuthError => "AuthError",
            Self::NotFound => "NotFound",
            Self::InvalidRequest => "InvalidRequest",
            Self::BackendUnavailable => "BackendUnavailable",
            Self::ResultTooLarge => "ResultTooLarge",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when talking to the SonarQube server.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Authentication failed or the credential lacks permission (401/403).
    #[error("authentication failed (status {status}): {message}")]
    Auth { status: u16, message: String },

    /// The requested resource does not exist (404).
    #[error("not found: {message}")]
    NotFound { message: String },

    /// The server rejected the request; messages are passed through verbatim.
    #[error("invalid request (status {status}): {}", .messages.join("; "))]
    InvalidRequest { status: u16, messages: Vec<String> },

    /// 5xx, throttling, connection failure or an unreadable response.
    #[error("backend unavailable: {message}")]
    BackendUnavailable { status: Option<u16>, message: String },

    /// A paged request or aggregation would exceed the item cap.
    #[error("result too large: {total} items exceed the cap of {cap}")]
    ResultTooLarge { total: u64, cap: usize },
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Timeout(_) => ApiErrorKind::Timeout,
            Self::Auth { .. } => ApiErrorKind::AuthError,
            Self::NotFound { .. } => ApiErrorKind::NotFound,
            Self::InvalidRequest { .. } => ApiErrorKind::InvalidRequest,
            Self::BackendUnavailable { .. } => ApiErrorKind::BackendUnavailable,
            Self::ResultTooLarge { .. } => ApiErrorKind::ResultTooLarge,
        }
    }

    /// HTTP status returned by the backend, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::InvalidRequest { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::BackendUnavailable { status, .. } => *status,
            Self::Timeout(_) | Self::ResultTooLarge { .. } => None,
        }
    }

    /// Classify a non-success response from its status code and body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let messages = error_messages(status, body);

        match status {
            401 | 403 => Self::Auth {
                status,
                message: messages.join("; "),
            },
            404 => Self::NotFound {
                message: messages.join("; "),
            },
            429 => Self::BackendUnavailable {
                status: Some(status),
                message: messages.join("; "),
            },
            400..=499 => Self::InvalidRequest { status, messages },
            _ => Self::BackendUnavailable {
                status: Some(status),
                message: messages.join("; "),
            },
        }
    }

    /// Classify a failure that happened before a response was received.
    pub fn from_transport(error: &reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::BackendUnavailable {
                status: error.status().map(|s| s.as_u16()),
                message: error.to_string(),
            }
        }
    }
}

/// Error payload of the SonarQube Web API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<ErrorMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub msg: String,
}

fn error_messages(status: u16, body: &str) -> Vec<String> {
    if let Ok(response) = serde_json::from_str::<ErrorResponse>(body) {
        if !response.errors.is_empty() {
            return response.errors.into_iter().map(|e| e.msg).collect();
        }
    }

    let body = body.trim();
    if body.is_empty() {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("no response body");
        vec![reason.to_string()]
    } else {
        vec![body.to_string()]
    }
}
