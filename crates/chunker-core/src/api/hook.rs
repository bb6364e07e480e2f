use std::sync::Arc;

use reqwest::header::{self, HeaderValue};
use reqwest::Request;
use tracing::warn;

use super::ApiError;
use crate::auth::TokenStore;

/// Runs on every outgoing request, after it is built and before it is sent.
pub trait RequestHook: Send + Sync {
    fn before_request(&self, request: &mut Request) -> Result<(), ApiError>;
}

/// Attaches the stored token as a bearer credential.
///
/// The store is consulted on every call, so a token set or cleared between
/// two requests shows up on the second one. Without a token the
/// `Authorization` header is removed rather than left stale.
pub struct BearerAuth {
    store: Arc<dyn TokenStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }
}

impl RequestHook for BearerAuth {
    fn before_request(&self, request: &mut Request) -> Result<(), ApiError> {
        let token = match self.store.get_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Token store unreadable, sending request without credentials");
                None
            }
        };

        let headers = request.headers_mut();
        match token {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| ApiError::InvalidToken)?;
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
            None => {
                headers.remove(header::AUTHORIZATION);
            }
        }
        Ok(())
    }
}
