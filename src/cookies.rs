//! Cookie store: the only persistence layer for session state.
//!
//! DESIGN
//! ======
//! Wraps an axum-extra [`CookieJar`] built from the incoming request. Writes
//! accumulate in the jar's delta and are emitted as `Set-Cookie` headers when
//! the handler returns the jar. Values are neither signed nor encrypted.

use axum::http::{HeaderMap, Uri};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

/// Bearer token cookie.
pub const TOKEN_COOKIE: &str = "authToken";
/// JSON-serialized user profile cookie.
pub const USER_COOKIE: &str = "userData";

#[derive(Debug, Clone)]
pub struct CookieStore {
    jar: CookieJar,
    secure: bool,
}

impl CookieStore {
    #[must_use]
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self { jar, secure }
    }

    #[must_use]
    pub fn from_headers(headers: &HeaderMap, secure: bool) -> Self {
        Self::new(CookieJar::from_headers(headers), secure)
    }

    /// Current value of `name`, or `None` when no such cookie exists.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.jar.get(name).map(|c| c.value().to_owned())
    }

    /// Write `name` with an expiry `ttl_days` from now, scoped to the whole origin.
    pub fn set(&mut self, name: &str, value: &str, ttl_days: i64) {
        let expires = OffsetDateTime::now_utc() + Duration::days(ttl_days);
        let cookie = Cookie::build((name.to_owned(), value.to_owned()))
            .path("/")
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .expires(expires);
        let jar = std::mem::replace(&mut self.jar, CookieJar::new());
        self.jar = jar.add(cookie);
    }

    /// Expire `name` immediately. A no-op when the cookie is absent.
    pub fn remove(&mut self, name: &str) {
        let cookie = Cookie::build((name.to_owned(), String::new())).path("/");
        let jar = std::mem::replace(&mut self.jar, CookieJar::new());
        self.jar = jar.remove(cookie);
    }

    /// Hand the jar back to axum so pending writes become `Set-Cookie` headers.
    #[must_use]
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

/// Whether the request reached us over HTTPS.
///
/// An explicit `COOKIE_SECURE` setting wins; otherwise a reverse proxy's
/// `X-Forwarded-Proto` is trusted, then the request URI scheme.
#[must_use]
pub fn request_is_secure(headers: &HeaderMap, uri: &Uri, forced: Option<bool>) -> bool {
    if let Some(value) = forced {
        return value;
    }
    if let Some(proto) = headers.get("x-forwarded-proto").and_then(|v| v.to_str().ok()) {
        return proto
            .split(',')
            .next()
            .is_some_and(|p| p.trim().eq_ignore_ascii_case("https"));
    }
    uri.scheme_str() == Some("https")
}

#[cfg(test)]
#[path = "cookies_test.rs"]
mod tests;
