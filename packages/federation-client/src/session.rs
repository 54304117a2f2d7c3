//! Session token storage and sign-in redirect policy.

use std::sync::{PoisonError, RwLock};

/// The endpoint the UI calls to probe whether a session is still alive.
pub const AUTH_PROBE_PATH: &str = "/api/auth/me";

/// Views that handle authentication themselves.
const AUTH_VIEWS: &[&str] = &[
    "/login",
    "/register",
    "/sign-in",
    "/sign-up",
    "/forgot-password",
    "/reset-password",
    "/auth",
];

/// Where the bearer token lives between requests (browser local storage,
/// a keychain, a file). The client only reads, stores and clears it.
pub trait SessionStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn store(&self, token: &str);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, token: &str) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

pub fn is_auth_view(path: &str) -> bool {
    AUTH_VIEWS
        .iter()
        .any(|view| path == *view || path.starts_with(&format!("{view}/")))
}

/// Whether a 401 on `request_path` should send the user to sign in.
///
/// Never from an auth view, and never for the session probe, so a stale
/// token cannot loop the UI through the sign-in page.
pub fn sign_in_required(current_view: &str, request_path: &str) -> bool {
    let request_path = request_path.split('?').next().unwrap_or(request_path);
    !is_auth_view(current_view) && request_path != AUTH_PROBE_PATH
}
