use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::TokenStore;

/// Top-level client routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    /// Any path without a view of its own
    Unknown(String),
}

impl Route {
    pub const LOGIN_PATH: &'static str = "/login";
    pub const DASHBOARD_PATH: &'static str = "/dashboard";

    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim();
        let normalized = trimmed.trim_end_matches('/');
        match normalized {
            Self::LOGIN_PATH => Route::Login,
            Self::DASHBOARD_PATH => Route::Dashboard,
            _ => Route::Unknown(trimmed.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Login => Self::LOGIN_PATH,
            Route::Dashboard => Self::DASHBOARD_PATH,
            Route::Unknown(path) => path,
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of a navigation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

impl Navigation {
    /// The route that ends up on screen.
    pub fn destination(&self) -> &Route {
        match self {
            Navigation::Render(route) | Navigation::Redirect(route) => route,
        }
    }
}

/// Navigation decision for a route given the session state.
///
/// `/login` is always reachable. `/dashboard` needs a session. Everything
/// else redirects to whichever of the two the session allows.
pub fn guard(authenticated: bool, route: &Route) -> Navigation {
    match route {
        Route::Login => Navigation::Render(Route::Login),
        Route::Dashboard if authenticated => Navigation::Render(Route::Dashboard),
        Route::Dashboard => Navigation::Redirect(Route::Login),
        Route::Unknown(_) if authenticated => Navigation::Redirect(Route::Dashboard),
        Route::Unknown(_) => Navigation::Redirect(Route::Login),
    }
}

/// Gates protected views on the presence of a stored token.
///
/// The gate does not check the token with the backend; a dead token is
/// caught when a protected call comes back 401 and the session is cleared.
#[derive(Clone)]
pub struct AuthGate {
    store: Arc<dyn TokenStore>,
}

impl AuthGate {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn is_authenticated(&self) -> bool {
        match self.store.get_token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "Token store unreadable, treating session as absent");
                false
            }
        }
    }

    pub fn navigate(&self, path: &str) -> Navigation {
        guard(self.is_authenticated(), &Route::parse(path))
    }
}
