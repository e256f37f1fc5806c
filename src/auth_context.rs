//! Auth context: the per-request view of who is signed in.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`provide_auth_context`] runs as router middleware. It builds a
//! [`SessionStore`] from the request cookies, initialises an [`AuthContext`]
//! from it, and stores the context in request extensions. Handlers take it
//! as an extractor; a handler mounted outside the provider fails fast with
//! [`AuthContextError::MissingProvider`].
//!
//! Handlers that change the session return [`AuthContext::into_jar`] in their
//! response so the cookie writes reach the browser.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::api::Reply;
use crate::cookies::{CookieStore, request_is_secure};
use crate::session::{AuthError, LOGIN_PATH, Navigation, SessionStore, UserProfile};
use crate::state::AppState;

/// Landing page after login when no other destination is known.
pub const DEFAULT_LANDING: &str = "/doctor";

#[derive(Debug, thiserror::Error)]
pub enum AuthContextError {
    #[error("auth context requested outside of provide_auth_context")]
    MissingProvider,
}

impl IntoResponse for AuthContextError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "route is not wrapped by the auth provider");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Serializable view of the context, also served at `/api/session`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSnapshot {
    pub user: Option<UserProfile>,
    pub is_loading: bool,
    pub is_authenticated: bool,
}

#[derive(Debug, Clone)]
pub struct AuthContext {
    session: SessionStore,
    user: Option<UserProfile>,
    is_loading: bool,
}

impl AuthContext {
    /// A context that has not yet looked at the session.
    #[must_use]
    pub fn new(session: SessionStore) -> Self {
        Self { session, user: None, is_loading: true }
    }

    /// Load the stored token + user pair. Both must be present.
    pub fn initialize(&mut self) {
        if self.session.is_authenticated() {
            self.user = self.session.user();
        }
        self.is_loading = false;
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            user: self.user.clone(),
            is_loading: self.is_loading(),
            is_authenticated: self.is_authenticated(),
        }
    }

    /// Sign in and pick the post-login destination.
    ///
    /// The destination is `redirect_to`, else `query_redirect` (the `redirect`
    /// query parameter of the login page), else [`DEFAULT_LANDING`]. Only
    /// same-origin paths are accepted.
    ///
    /// # Errors
    ///
    /// Propagates the session store's [`AuthError`] unchanged.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
        query_redirect: Option<&str>,
    ) -> Result<Navigation, AuthError> {
        let session = self.session.login(email, password).await?;
        self.user = Some(session.user);
        self.is_loading = false;

        let target = [redirect_to, query_redirect]
            .into_iter()
            .flatten()
            .find(|candidate| is_local_path(candidate))
            .unwrap_or(DEFAULT_LANDING);
        Ok(Navigation::FullPage(target.to_owned()))
    }

    /// Clear the session and move to the login page.
    ///
    /// The session store asks for a full-page load; the context replaces it
    /// with a single in-app navigation.
    pub fn logout(&mut self) -> Navigation {
        let _ = self.session.logout();
        self.user = None;
        Navigation::InApp(LOGIN_PATH.to_owned())
    }

    /// Unwrap a remote reply, ending the session if the token was refused.
    pub fn settle<T>(&mut self, reply: Reply<T>) -> Option<T> {
        match reply {
            Reply::Data(value) => Some(value),
            Reply::Unauthorized => {
                tracing::info!("session rejected by api; signing out");
                let _ = self.session.logout();
                self.user = None;
                None
            }
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn into_jar(self) -> CookieJar {
        self.session.into_cookies().into_jar()
    }
}

/// Relative, same-origin path: leading `/` but not protocol-relative `//`.
#[must_use]
pub fn is_local_path(candidate: &str) -> bool {
    candidate.starts_with('/') && !candidate.starts_with("//") && !candidate.starts_with("/\\")
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthContextError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthContextError::MissingProvider)
    }
}

/// Middleware installing an initialised [`AuthContext`] for every request.
pub async fn provide_auth_context(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let secure = request_is_secure(request.headers(), request.uri(), state.config.cookie_secure);
    let cookies = CookieStore::from_headers(request.headers(), secure);
    let session = SessionStore::new(
        cookies,
        state.api.clone(),
        state.config.endpoints.login_url(),
        state.config.session_ttl_days,
    );
    let mut context = AuthContext::new(session);
    context.initialize();
    request.extensions_mut().insert(context);
    next.run(request).await
}

#[cfg(test)]
#[path = "auth_context_test.rs"]
mod tests;
