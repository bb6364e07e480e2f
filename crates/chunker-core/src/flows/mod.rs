//! User-facing flows: login/logout and markdown upload.
//!
//! Each flow is a small state machine whose current state is published on a
//! `tokio::sync::watch` channel. Entering a busy state is a single
//! check-and-set on that channel, so one flow instance never has two
//! requests in flight. Every failure ends up in the flow's state as a
//! [`FlowError`]; nothing escapes as a panic.

pub mod session;
pub mod upload;

use thiserror::Error;

use crate::api::{ApiError, ErrorKind};

pub use session::{SessionFlow, SessionState};
pub use upload::{UploadFlow, UploadStatus};

const CONNECT_MESSAGE: &str = "Unable to connect to server. Check your internet connection.";
const TIMEOUT_MESSAGE: &str = "Connection timed out. Please try again.";

/// Problems caught before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username and password required")]
    EmptyCredentials,

    #[error("Invalid file type: {name} is not a markdown (.md) file")]
    InvalidFileType { name: String, media_type: String },

    #[error("No file selected")]
    NoFileSelected,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Credentials or session refused by the backend
    #[error("{0}")]
    Authentication(String),

    /// Backend declined the request
    #[error("{0}")]
    Rejected(String),

    /// Backend unreachable, timed out or failing
    #[error("{0}")]
    Transport(String),

    /// A request from this flow is already in flight; the call was ignored
    /// and the flow's state is unchanged
    #[error("Another request is already in progress")]
    Busy,
}

impl FlowError {
    /// Map an API failure to what the user sees. The backend's own message
    /// wins; otherwise `auth_fallback` for 401s and `fallback` for the rest.
    pub(crate) fn from_api(err: &ApiError, auth_fallback: &str, fallback: &str) -> Self {
        let described = |generic: &str| {
            err.server_message()
                .map(str::to_string)
                .unwrap_or_else(|| generic.to_string())
        };
        match err.kind() {
            ErrorKind::Authentication => FlowError::Authentication(described(auth_fallback)),
            ErrorKind::Request => FlowError::Rejected(described(fallback)),
            ErrorKind::Transport if err.is_timeout() => {
                FlowError::Transport(TIMEOUT_MESSAGE.to_string())
            }
            ErrorKind::Transport if err.is_connect() => {
                FlowError::Transport(CONNECT_MESSAGE.to_string())
            }
            ErrorKind::Transport => FlowError::Transport(described(fallback)),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, FlowError::Validation(_))
    }
}
