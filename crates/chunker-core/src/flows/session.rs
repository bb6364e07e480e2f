use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use super::{FlowError, ValidationError};
use crate::api::RequestClient;
use crate::auth::{Credentials, Route};

/// Message shown for a 401 without a backend explanation
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Message shown for any other login failure without a backend explanation
const LOGIN_FAILED: &str = "Login failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for credentials; carries the validation error of the last
    /// attempt, if it never left the client
    Idle { error: Option<FlowError> },
    Submitting,
    Authenticated,
    /// The backend refused or could not be reached; resubmitting is allowed
    Rejected(FlowError),
}

impl SessionState {
    pub fn error(&self) -> Option<&FlowError> {
        match self {
            SessionState::Idle { error } => error.as_ref(),
            SessionState::Rejected(err) => Some(err),
            _ => None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle { error: None }
    }
}

/// Login/logout state machine.
pub struct SessionFlow {
    client: Arc<RequestClient>,
    state: watch::Sender<SessionState>,
}

impl SessionFlow {
    pub fn new(client: Arc<RequestClient>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { client, state }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Submit credentials. On success the token is stored and the route to
    /// navigate to is returned.
    pub async fn submit(&self, credentials: Credentials) -> Result<Route, FlowError> {
        if !credentials.is_complete() {
            let err = FlowError::from(ValidationError::EmptyCredentials);
            let applied = self.state.send_if_modified(|state| {
                if *state == SessionState::Submitting {
                    return false;
                }
                *state = SessionState::Idle {
                    error: Some(err.clone()),
                };
                true
            });
            return Err(if applied { err } else { FlowError::Busy });
        }

        let entered = self.state.send_if_modified(|state| {
            if *state == SessionState::Submitting {
                return false;
            }
            *state = SessionState::Submitting;
            true
        });
        if !entered {
            warn!("Login already in progress, ignoring submit");
            return Err(FlowError::Busy);
        }

        let outcome = match self.client.login(&credentials).await {
            Ok(token) => self
                .client
                .set_token(&token)
                .map_err(|e| FlowError::from_api(&e, INVALID_CREDENTIALS, LOGIN_FAILED)),
            Err(e) => Err(FlowError::from_api(&e, INVALID_CREDENTIALS, LOGIN_FAILED)),
        };

        match outcome {
            Ok(()) => {
                self.state.send_replace(SessionState::Authenticated);
                info!(username = %credentials.username, "Login successful");
                Ok(Route::Dashboard)
            }
            Err(err) => {
                error!(error = %err, "Login failed");
                self.state.send_replace(SessionState::Rejected(err.clone()));
                Err(err)
            }
        }
    }

    /// Drop the session and return to the login view.
    pub fn logout(&self) -> Result<Route, FlowError> {
        if *self.state.borrow() == SessionState::Submitting {
            return Err(FlowError::Busy);
        }
        self.client
            .clear_token()
            .map_err(|e| FlowError::Transport(e.to_string()))?;
        self.state.send_replace(SessionState::default());
        info!("Logged out");
        Ok(Route::Login)
    }
}
