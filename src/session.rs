//! Session store: token + user profile persisted in two cookies.
//!
//! ARCHITECTURE
//! ============
//! `authToken` holds the bearer token and `userData` the verbatim profile
//! object returned by the login endpoint. Both are written and cleared
//! together with the same TTL. Token validity is never checked locally; the
//! remote API enforces it and answers 401 when it no longer accepts it.

use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::ApiClient;
use crate::api::types::response_message;
use crate::cookies::{CookieStore, TOKEN_COOKIE, USER_COOKIE};

pub const LOGIN_PATH: &str = "/login";
const LOGIN_FAILED: &str = "Login failed";

// =============================================================================
// TYPES
// =============================================================================

/// Opaque user profile; only `role_type` is read, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn role_type(&self) -> Option<&str> {
        self.get("role_type")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
    }

    /// Role shown in the navbar greeting.
    #[must_use]
    pub fn display_role(&self) -> &str {
        self.role_type().unwrap_or("User")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The login endpoint refused the credentials or reported failure.
    #[error("{0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Where the browser should go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Reload the whole document at the target.
    FullPage(String),
    /// Move within the app without tearing down client state.
    InApp(String),
}

impl Navigation {
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::FullPage(target) | Self::InApp(target) => target,
        }
    }
}

impl IntoResponse for Navigation {
    fn into_response(self) -> Response {
        Redirect::to(self.target()).into_response()
    }
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

// =============================================================================
// SESSION STORE
// =============================================================================

#[derive(Debug, Clone)]
pub struct SessionStore {
    cookies: CookieStore,
    api: ApiClient,
    login_url: String,
    ttl_days: i64,
}

impl SessionStore {
    #[must_use]
    pub fn new(cookies: CookieStore, api: ApiClient, login_url: String, ttl_days: i64) -> Self {
        Self { cookies, api, login_url, ttl_days }
    }

    /// Authenticate against the remote login endpoint and persist the session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] with the remote message (or a generic
    /// one) when login fails, [`AuthError::Transport`] on network failure.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .api
            .http()
            .post(&self.login_url)
            .json(&Credentials { email, password })
            .send()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "login request failed"))?;

        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            tracing::info!(status = status.as_u16(), "login rejected");
            return Err(rejection(&body));
        }
        let session = parse_login_body(&body).ok_or_else(|| rejection(&body))?;

        self.persist(&session);
        tracing::info!(role = session.user.display_role(), "login succeeded");
        Ok(session)
    }

    fn persist(&mut self, session: &Session) {
        let user_json = serde_json::to_string(&session.user).unwrap_or_else(|_| "{}".to_owned());
        self.cookies.set(TOKEN_COOKIE, &session.token, self.ttl_days);
        self.cookies.set(USER_COOKIE, &user_json, self.ttl_days);
    }

    /// Clear both cookies and send the browser to the login page. Idempotent.
    pub fn logout(&mut self) -> Navigation {
        self.cookies.remove(TOKEN_COOKIE);
        self.cookies.remove(USER_COOKIE);
        Navigation::FullPage(LOGIN_PATH.to_owned())
    }

    /// Stored bearer token. An empty cookie counts as no token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.cookies.get(TOKEN_COOKIE).filter(|t| !t.is_empty())
    }

    /// Stored profile. Malformed or non-object JSON degrades to `None`.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        let raw = self.cookies.get(USER_COOKIE)?;
        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable user cookie");
                None
            }
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    #[must_use]
    pub fn into_cookies(self) -> CookieStore {
        self.cookies
    }
}

/// Extract `{ success: true, data: [{ access_token, ... }] }`.
fn parse_login_body(body: &Value) -> Option<Session> {
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    let profile = body.get("data")?.as_array()?.first()?.as_object()?;
    let token = profile
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())?;
    Some(Session { token: token.to_owned(), user: UserProfile::new(profile.clone()) })
}

fn rejection(body: &Value) -> AuthError {
    AuthError::Rejected(response_message(body).unwrap_or_else(|| LOGIN_FAILED.to_owned()))
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
