//! Authenticated request client for the remote scheduling API.
//!
//! DESIGN
//! ======
//! Thin reqwest wrapper that attaches the bearer token and JSON headers. A 401
//! comes back as [`Reply::Unauthorized`] instead of an error or a hidden
//! logout: the session-aware caller (`AuthContext::settle`) owns what happens
//! to the session. Every other status is decoded as JSON and returned as-is,
//! so callers inspect the body for an application-level failure.

pub mod directory;
pub mod types;

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::config::ApiTimeouts;

// =============================================================================
// ERROR / REPLY
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not JSON.
    #[error("unexpected response (status {status}): {reason}")]
    Decode { status: u16, reason: String },

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Outcome of a request that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    Data(T),
    /// The server answered 401: the session token is no longer accepted.
    Unauthorized,
}

impl<T> Reply<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        match self {
            Self::Data(value) => Reply::Data(f(value)),
            Self::Unauthorized => Reply::Unauthorized,
        }
    }

    #[cfg(test)]
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Data(value) => Some(value),
            Self::Unauthorized => None,
        }
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(timeouts: ApiTimeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http })
    }

    /// The raw HTTP client, for unauthenticated calls such as login.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// `GET url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] on network failure and
    /// [`ApiError::Decode`] when the body is not JSON.
    pub async fn get(&self, url: &str, token: Option<&str>) -> Result<Reply<Value>, ApiError> {
        self.send::<()>(Method::GET, url, token, None).await
    }

    /// `POST url` with `body` serialized as JSON.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post<B: Serialize + Sync>(
        &self,
        url: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<Reply<Value>, ApiError> {
        self.send(Method::POST, url, token, Some(body)).await
    }

    /// `PATCH url` with `body` serialized as JSON.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn patch<B: Serialize + Sync>(
        &self,
        url: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<Reply<Value>, ApiError> {
        self.send(Method::PATCH, url, token, Some(body)).await
    }

    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<Reply<Value>, ApiError> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(AUTHORIZATION, bearer(token))
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, %url, error = %e, "api request failed");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::info!(%method, %url, "api rejected session token");
            return Ok(Reply::Unauthorized);
        }
        if !status.is_success() {
            tracing::debug!(%method, %url, status = status.as_u16(), "api returned non-success status");
        }

        let text = response.text().await?;
        parse_body(status.as_u16(), &text).map(Reply::Data)
    }
}

fn bearer(token: Option<&str>) -> String {
    match token {
        Some(token) => format!("Bearer {token}"),
        None => String::new(),
    }
}

fn parse_body(status: u16, text: &str) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| ApiError::Decode { status, reason: e.to_string() })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
