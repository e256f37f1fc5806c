//! Runtime configuration parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! `main` loads `.env` through `dotenvy` and then calls [`AppConfig::from_env`].
//! Every value has a default except that base URLs must parse when provided,
//! so a bare checkout talks to the staging scheduling API out of the box.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_AUTH_API_BASE: &str = "https://beta.homeivf.in/user/api/v1";
pub const DEFAULT_APPOINTMENT_API_BASE: &str = "https://hivfstage.surya-app.com/appointment/api/v1";
pub const DEFAULT_ADMIN_API_BASE: &str = "https://hivfstage.surya-app.com/admin_dashboard/api/v1";
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;
pub const DEFAULT_API_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    InvalidUrl { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Remote API base URLs, without trailing slashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub auth_base: String,
    pub appointment_base: String,
    pub admin_base: String,
}

impl ApiEndpoints {
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}/login/", self.auth_base)
    }

    #[must_use]
    pub fn doctor_list_url(&self) -> String {
        format!("{}/doctor_list/", self.appointment_base)
    }

    #[must_use]
    pub fn find_patient_url(&self) -> String {
        format!("{}/find-patient/", self.admin_base)
    }

    #[must_use]
    pub fn change_doctor_url(&self) -> String {
        format!("{}/change-doctor/", self.admin_base)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub endpoints: ApiEndpoints,
    /// Forces the cookie `Secure` flag on or off. `None` means infer per request.
    pub cookie_secure: Option<bool>,
    pub session_ttl_days: i64,
    pub timeouts: ApiTimeouts,
    pub static_dir: PathBuf,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `AUTH_API_BASE`, `APPOINTMENT_API_BASE`, `ADMIN_API_BASE`
    /// - `COOKIE_SECURE`: `true`/`false`, inferred per request when unset
    /// - `SESSION_TTL_DAYS`: default 7
    /// - `API_REQUEST_TIMEOUT_SECS`: default 30
    /// - `API_CONNECT_TIMEOUT_SECS`: default 10
    /// - `STATIC_DIR`: default `<crate>/static`
    ///
    /// # Errors
    ///
    /// Returns an error if a base URL is set but is not an absolute URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoints = ApiEndpoints {
            auth_base: env_base_url("AUTH_API_BASE", DEFAULT_AUTH_API_BASE)?,
            appointment_base: env_base_url("APPOINTMENT_API_BASE", DEFAULT_APPOINTMENT_API_BASE)?,
            admin_base: env_base_url("ADMIN_API_BASE", DEFAULT_ADMIN_API_BASE)?,
        };
        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"));

        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT),
            endpoints,
            cookie_secure: env_bool("COOKIE_SECURE"),
            session_ttl_days: env_parse("SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS),
            timeouts: ApiTimeouts {
                request_secs: env_parse("API_REQUEST_TIMEOUT_SECS", DEFAULT_API_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("API_CONNECT_TIMEOUT_SECS", DEFAULT_API_CONNECT_TIMEOUT_SECS),
            },
            static_dir,
        })
    }

    /// Config pointing every remote API at `base`. Used by tests and local mocks.
    #[must_use]
    pub fn with_api_base(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_owned();
        Self {
            port: DEFAULT_PORT,
            endpoints: ApiEndpoints {
                auth_base: base.clone(),
                appointment_base: base.clone(),
                admin_base: base,
            },
            cookie_secure: None,
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
            timeouts: ApiTimeouts {
                request_secs: DEFAULT_API_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_API_CONNECT_TIMEOUT_SECS,
            },
            static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"),
        }
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| parse_bool(&raw))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_base_url(var: &'static str, default: &str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => normalize_base_url(var, &raw),
        Err(_) => Ok(default.to_owned()),
    }
}

fn normalize_base_url(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl { var, reason: e.to_string() })?;
    if parsed.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl { var, reason: "not a base URL".into() });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
