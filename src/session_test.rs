use super::*;
use crate::config::ApiTimeouts;
use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api() -> ApiClient {
    ApiClient::new(ApiTimeouts { request_secs: 5, connect_secs: 2 }).unwrap()
}

fn store_with_cookies(raw: Option<&str>, login_url: &str) -> SessionStore {
    let mut headers = HeaderMap::new();
    if let Some(raw) = raw {
        headers.insert(COOKIE, HeaderValue::from_str(raw).unwrap());
    }
    SessionStore::new(CookieStore::from_headers(&headers, false), api(), login_url.to_owned(), 7)
}

fn empty_store() -> SessionStore {
    store_with_cookies(None, "http://127.0.0.1:9/login/")
}

async fn mount_login(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path("/login/"))
        .and(body_json(json!({"email": "staff@clinic.test", "password": "pw"})))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

// =============================================================================
// parse_login_body
// =============================================================================

#[test]
fn parse_login_body_success() {
    let body = json!({"success": true, "data": [{"access_token": "tok", "role_type": "admin", "email": "a@b"}]});
    let session = parse_login_body(&body).unwrap();
    assert_eq!(session.token, "tok");
    assert_eq!(session.user.role_type(), Some("admin"));
    assert_eq!(session.user.get("access_token"), Some(&json!("tok")));
}

#[test]
fn parse_login_body_requires_success_flag() {
    let body = json!({"success": false, "data": [{"access_token": "tok"}]});
    assert!(parse_login_body(&body).is_none());
    assert!(parse_login_body(&json!({"data": [{"access_token": "tok"}]})).is_none());
}

#[test]
fn parse_login_body_requires_token() {
    assert!(parse_login_body(&json!({"success": true, "data": []})).is_none());
    assert!(parse_login_body(&json!({"success": true, "data": [{"role_type": "x"}]})).is_none());
    assert!(parse_login_body(&json!({"success": true, "data": [{"access_token": ""}]})).is_none());
}

#[test]
fn rejection_uses_remote_message_or_generic() {
    assert_eq!(rejection(&json!({"message": "Invalid password"})).to_string(), "Invalid password");
    assert_eq!(rejection(&Value::Null).to_string(), "Login failed");
}

#[test]
fn display_role_defaults_to_user() {
    let user = UserProfile::new(Map::new());
    assert_eq!(user.display_role(), "User");
}

#[test]
fn navigation_target() {
    assert_eq!(Navigation::FullPage("/login".into()).target(), "/login");
    assert_eq!(Navigation::InApp("/doctor".into()).target(), "/doctor");
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_persists_token_and_profile() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        200,
        json!({"success": true, "data": [{"access_token": "tok-9", "role_type": "admin", "name": "Staff"}]}),
    )
    .await;

    let mut store = store_with_cookies(None, &format!("{}/login/", server.uri()));
    let session = store.login("staff@clinic.test", "pw").await.unwrap();

    assert_eq!(session.token, "tok-9");
    assert_eq!(store.token().as_deref(), Some("tok-9"));
    assert_eq!(store.user(), Some(session.user.clone()));
    assert!(store.is_authenticated());
}

#[tokio::test]
async fn login_http_failure_surfaces_message() {
    let server = MockServer::start().await;
    mount_login(&server, 400, json!({"message": "Invalid credentials"})).await;

    let mut store = store_with_cookies(None, &format!("{}/login/", server.uri()));
    let err = store.login("staff@clinic.test", "pw").await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(ref m) if m == "Invalid credentials"));
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn login_application_failure_is_rejected() {
    let server = MockServer::start().await;
    mount_login(&server, 200, json!({"success": false})).await;

    let mut store = store_with_cookies(None, &format!("{}/login/", server.uri()));
    let err = store.login("staff@clinic.test", "pw").await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed");
    assert_eq!(store.user(), None);
}

#[tokio::test]
async fn login_non_json_failure_is_generic() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let mut store = store_with_cookies(None, &format!("{}/login/", server.uri()));
    let err = store.login("staff@clinic.test", "pw").await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed");
}

#[tokio::test]
async fn login_network_failure_is_transport() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut store = store_with_cookies(None, &format!("http://127.0.0.1:{port}/login/"));
    let err = store.login("staff@clinic.test", "pw").await.unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)));
}

// =============================================================================
// logout / accessors
// =============================================================================

#[test]
fn logout_clears_existing_session() {
    let mut store = store_with_cookies(Some(r#"authToken=tok; userData={"role_type":"admin"}"#), "http://x/login/");
    assert!(store.is_authenticated());

    let nav = store.logout();
    assert_eq!(nav, Navigation::FullPage("/login".into()));
    assert_eq!(store.token(), None);
    assert_eq!(store.user(), None);
    assert!(!store.is_authenticated());
}

#[test]
fn logout_is_idempotent_without_session() {
    let mut store = empty_store();
    assert_eq!(store.logout(), Navigation::FullPage("/login".into()));
    assert_eq!(store.logout(), Navigation::FullPage("/login".into()));
    assert!(!store.is_authenticated());
    assert_eq!(store.user(), None);
}

#[test]
fn malformed_user_cookie_degrades_to_none() {
    for raw in ["{not json", "42", "\"text\"", "[1,2]", "null", ""] {
        let mut store = empty_store();
        let mut cookies = store.clone().into_cookies();
        cookies.set(USER_COOKIE, raw, 7);
        store = SessionStore::new(cookies, api(), "http://x/login/".into(), 7);
        assert_eq!(store.user(), None, "expected None for {raw:?}");
    }
}

#[test]
fn empty_token_cookie_is_not_authenticated() {
    let store = store_with_cookies(Some("authToken="), "http://x/login/");
    assert_eq!(store.token(), None);
    assert!(!store.is_authenticated());
}

#[test]
fn token_without_profile_is_still_authenticated() {
    let store = store_with_cookies(Some("authToken=abc"), "http://x/login/");
    assert!(store.is_authenticated());
    assert_eq!(store.user(), None);
}
