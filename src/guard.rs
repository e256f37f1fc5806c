//! Route guard run before any page handler.
//!
//! DESIGN
//! ======
//! Stateless per request: it only reads the `authToken` cookie, never writes
//! it. Rules, in priority order:
//! 1. protected prefix without a token -> `/login?redirect=<path>`
//! 2. public-only path with a token -> the authenticated landing page
//! 3. anything else proceeds untouched
//!
//! API routes, static assets and the favicon bypass the guard entirely.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::auth_context::DEFAULT_LANDING;
use crate::cookies::TOKEN_COOKIE;
use crate::session::LOGIN_PATH;

/// Any path starting with one of these requires a session.
pub const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/profile", "/settings", "/doctor"];
/// Exact paths only reachable without a session.
pub const PUBLIC_ONLY_PATHS: &[&str] = &["/login", "/register", "/"];
/// Matched against the path after its leading `/`.
const EXCLUDED_PREFIXES: &[&str] = &["api", "static/", "favicon.ico"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    /// Send the visitor to this login URL.
    Login(String),
    /// Already signed in: go to the landing page.
    Landing,
}

#[must_use]
pub fn is_excluded(path: &str) -> bool {
    let rest = path.strip_prefix('/').unwrap_or(path);
    EXCLUDED_PREFIXES.iter().any(|prefix| rest.starts_with(prefix))
}

#[must_use]
pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

#[must_use]
pub fn is_public_only(path: &str) -> bool {
    PUBLIC_ONLY_PATHS.contains(&path)
}

/// `/login?redirect=<path>`, with the path form-encoded.
#[must_use]
pub fn login_redirect_url(path: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect", path)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

/// Decide what to do with a request for `path`.
#[must_use]
pub fn evaluate(path: &str, has_token: bool) -> GuardDecision {
    if is_protected(path) && !has_token {
        return GuardDecision::Login(login_redirect_url(path));
    }
    if is_public_only(path) && has_token {
        return GuardDecision::Landing;
    }
    GuardDecision::Proceed
}

/// Axum middleware applying [`evaluate`] to every non-excluded request.
pub async fn route_guard(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    if is_excluded(&path) {
        return next.run(request).await;
    }

    let jar = CookieJar::from_headers(request.headers());
    let has_token = jar
        .get(TOKEN_COOKIE)
        .is_some_and(|c| !c.value().is_empty());

    match evaluate(&path, has_token) {
        GuardDecision::Proceed => next.run(request).await,
        GuardDecision::Login(target) => {
            tracing::debug!(%path, "guard: no session, redirecting to login");
            Redirect::to(&target).into_response()
        }
        GuardDecision::Landing => {
            tracing::debug!(%path, "guard: already signed in, redirecting to landing");
            Redirect::to(DEFAULT_LANDING).into_response()
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
