use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized{}", suffix(.message))]
    Unauthorized { message: Option<String> },

    #[error("Access denied{}", suffix(.message))]
    AccessDenied { message: Option<String> },

    #[error("Resource not found{}", suffix(.message))]
    NotFound { message: Option<String> },

    #[error("Request rejected ({status}){}", suffix(.message))]
    Rejected {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Server error ({status}){}", suffix(.message))]
    ServerError {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Stored token cannot be sent as a header")]
    InvalidToken,

    #[error("Token storage error: {0:#}")]
    Storage(anyhow::Error),
}

/// Coarse classification used to decide how a failure is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The backend refused the credentials or the session (401)
    Authentication,
    /// The request never got a usable answer: unreachable, timeout, 5xx
    Transport,
    /// The backend understood the request and declined it (other 4xx)
    Request,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Structured error body. The backend framework answers `{"detail": ...}`;
/// hand-written handlers answer `{"message": ...}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    detail: Option<serde_json::Value>,
}

fn suffix(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..end],
                body.len()
            )
        }
    }

    /// Pull the human-readable message out of an error body, if it has one.
    fn extract_message(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        let message = parsed.message.or_else(|| match parsed.detail {
            Some(serde_json::Value::String(s)) => Some(s),
            _ => None,
        })?;
        let message = message.trim();
        (!message.is_empty()).then(|| Self::truncate_body(message))
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = Self::extract_message(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized { message },
            403 => ApiError::AccessDenied { message },
            404 => ApiError::NotFound { message },
            500..=599 => ApiError::ServerError { status, message },
            _ => ApiError::Rejected { status, message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized { .. } => ErrorKind::Authentication,
            ApiError::AccessDenied { .. }
            | ApiError::NotFound { .. }
            | ApiError::Rejected { .. }
            | ApiError::InvalidToken => ErrorKind::Request,
            ApiError::ServerError { .. }
            | ApiError::Network(_)
            | ApiError::InvalidResponse(_)
            | ApiError::Storage(_) => ErrorKind::Transport,
        }
    }

    /// The message the backend attached to its error response.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::AccessDenied { message }
            | ApiError::NotFound { message }
            | ApiError::Rejected { message, .. }
            | ApiError::ServerError { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Network(e) if e.is_timeout())
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, ApiError::Network(e) if e.is_connect())
    }
}
