use super::*;
use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, Response};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::api::types::{Doctor, Patient};
use crate::desk::{MSG_DOCTOR_CHANGED, MSG_ENTER_UHID, MSG_SELECT_PATIENT_FIRST};
use crate::state::test_helpers::{MockDirectory, desk_of, test_app_state};

const SESSION: &str = r#"authToken=tok; userData={"role_type":"admin"}"#;

fn directory() -> MockDirectory {
    let patient = Patient {
        user_id: Some("u1".into()),
        uhid: Some("UH1".into()),
        name: Some("Asha Verma".into()),
        mobile_number: Some("9999999999".into()),
        assigned_doctor: Some("Dr. Mehta".into()),
        assigned_counselor: Some("Ravi".into()),
    };
    MockDirectory {
        doctors: vec![
            Doctor { id: "1".into(), name: "Dr. Rao".into(), image: None },
            Doctor { id: "2".into(), name: "Dr. Mehta".into(), image: None },
        ],
        patients: HashMap::from([("UH1".to_owned(), patient)]),
        ..MockDirectory::default()
    }
}

fn setup(mock: MockDirectory) -> (AppState, Arc<MockDirectory>) {
    let mock = Arc::new(mock);
    let state = test_app_state("http://127.0.0.1:9", mock.clone());
    (state, mock)
}

async fn send(state: &AppState, request: Request<Body>) -> Response<Body> {
    app(state.clone()).oneshot(request).await.unwrap()
}

fn get(uri: &str, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(raw) = cookies {
        builder = builder.header(COOKIE, raw);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookies: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(raw) = cookies {
        builder = builder.header(COOKIE, raw);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_owned())
        .collect()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// guard
// =============================================================================

#[tokio::test]
async fn protected_page_without_session_redirects_to_login() {
    let (state, mock) = setup(directory());
    let response = send(&state, get("/doctor", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?redirect=%2Fdoctor");
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn login_page_with_session_redirects_to_desk() {
    let (state, _) = setup(directory());
    let response = send(&state, get("/login", Some(SESSION))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/doctor");
}

#[tokio::test]
async fn landing_without_session_renders() {
    let (state, _) = setup(directory());
    let response = send(&state, get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("href=\"/login\""));
}

#[tokio::test]
async fn api_and_health_bypass_guard() {
    let (state, _) = setup(directory());
    let response = send(&state, get("/healthz", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&state, get("/api/session", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body, json!({"user": null, "isLoading": false, "isAuthenticated": false}));
}

#[tokio::test]
async fn session_probe_reports_user() {
    let (state, _) = setup(directory());
    let response = send(&state, get("/api/session", Some(SESSION))).await;
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["isAuthenticated"], json!(true));
    assert_eq!(body["user"]["role_type"], json!("admin"));
}

// =============================================================================
// login / logout
// =============================================================================

async fn login_server(reply: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(reply)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn login_sets_cookies_and_redirects() {
    let server = login_server(
        ResponseTemplate::new(200)
            .set_body_json(json!({"success": true, "data": [{"access_token": "tok", "role_type": "admin"}]})),
    )
    .await;
    let state = test_app_state(&server.uri(), Arc::new(directory()));

    let response = send(&state, post_form("/login", None, "email=a%40b.test&password=pw")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/doctor");
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("authToken=tok")));
    assert!(cookies.iter().any(|c| c.starts_with("userData=")));
}

#[tokio::test]
async fn login_honors_carried_redirect() {
    let server = login_server(
        ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": [{"access_token": "tok"}]})),
    )
    .await;
    let state = test_app_state(&server.uri(), Arc::new(directory()));

    let body = "email=a%40b.test&password=pw&redirect=%2Fsettings";
    let response = send(&state, post_form("/login", None, body)).await;
    assert_eq!(location(&response), "/settings");
}

#[tokio::test]
async fn login_failure_renders_message_inline() {
    let server = login_server(ResponseTemplate::new(200).set_body_json(json!({"success": false}))).await;
    let state = test_app_state(&server.uri(), Arc::new(directory()));

    let response = send(&state, post_form("/login", None, "email=a%40b.test&password=pw")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    assert!(body_text(response).await.contains("Login failed"));
}

#[tokio::test]
async fn logout_clears_cookies_and_desk() {
    let (state, _) = setup(directory());
    send(&state, get("/doctor", Some(SESSION))).await;
    assert!(desk_of(&state, "tok").await.is_some());

    let response = send(&state, post_form("/logout", Some(SESSION), "")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("authToken=;") && c.contains("Max-Age=0")));
    assert!(cookies.iter().any(|c| c.starts_with("userData=;") && c.contains("Max-Age=0")));
    assert!(desk_of(&state, "tok").await.is_none());
}

// =============================================================================
// doctor desk
// =============================================================================

#[tokio::test]
async fn desk_page_loads_doctors_once() {
    let (state, mock) = setup(directory());
    let response = send(&state, get("/doctor", Some(SESSION))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Patient Search"));
    assert!(html.contains("Welcome, <strong>admin!</strong>"));

    send(&state, get("/doctor", Some(SESSION))).await;
    assert_eq!(mock.calls(), vec!["list_doctors tok".to_owned()]);
}

#[tokio::test]
async fn failed_doctor_list_is_fetched_again_on_next_visit() {
    let mock = MockDirectory { failure: Some("boom".into()), ..directory() };
    let (state, mock) = setup(mock);
    send(&state, get("/doctor", Some(SESSION))).await;
    let desk = desk_of(&state, "tok").await.unwrap();
    assert!(desk.doctors_error.as_deref().unwrap().contains("boom"));

    send(&state, get("/doctor", Some(SESSION))).await;
    assert_eq!(mock.calls(), vec!["list_doctors tok".to_owned(), "list_doctors tok".to_owned()]);
}

#[tokio::test]
async fn blank_search_makes_no_call() {
    let (state, mock) = setup(directory());
    let response = send(&state, post_form("/doctor/search", Some(SESSION), "uhid=++")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/doctor");
    assert!(mock.calls().is_empty());

    let desk = desk_of(&state, "tok").await.unwrap();
    assert_eq!(desk.patient_error.as_deref(), Some(MSG_ENTER_UHID));
}

#[tokio::test]
async fn search_then_render_shows_patient_with_assigned_doctor_selected() {
    let (state, _) = setup(directory());
    send(&state, get("/doctor", Some(SESSION))).await;
    send(&state, post_form("/doctor/search", Some(SESSION), "uhid=+UH1+")).await;

    let desk = desk_of(&state, "tok").await.unwrap();
    assert!(desk.show_details);
    assert_eq!(desk.selected_doctor.as_deref(), Some("2"));

    let html = body_text(send(&state, get("/doctor", Some(SESSION))).await).await;
    assert!(html.contains("Asha Verma"));
    assert!(html.contains("Patient Details"));
}

#[tokio::test]
async fn unknown_patient_shows_not_found() {
    let (state, _) = setup(directory());
    send(&state, post_form("/doctor/search", Some(SESSION), "uhid=NOPE")).await;
    let html = body_text(send(&state, get("/doctor", Some(SESSION))).await).await;
    assert!(html.contains("Patient not found"));
}

#[tokio::test]
async fn transport_failure_renders_inline() {
    let mock = MockDirectory { failure: Some("upstream down".into()), ..directory() };
    let (state, _) = setup(mock);
    let response = send(&state, get("/doctor", Some(SESSION))).await;
    assert_eq!(response.status(), StatusCode::OK);

    send(&state, post_form("/doctor/search", Some(SESSION), "uhid=UH1")).await;
    let desk = desk_of(&state, "tok").await.unwrap();
    assert!(desk.doctors_error.as_deref().unwrap().contains("upstream down"));
    assert!(desk.patient_error.as_deref().unwrap().contains("upstream down"));
}

#[tokio::test]
async fn change_without_patient_makes_no_call() {
    let (state, mock) = setup(directory());
    send(&state, get("/doctor", Some(SESSION))).await;
    send(&state, post_form("/doctor/change", Some(SESSION), "")).await;

    assert_eq!(mock.calls(), vec!["list_doctors tok".to_owned()]);
    let desk = desk_of(&state, "tok").await.unwrap();
    assert_eq!(desk.change_error.as_deref(), Some(MSG_SELECT_PATIENT_FIRST));

    let html = body_text(send(&state, get("/doctor", Some(SESSION))).await).await;
    assert!(html.contains(MSG_SELECT_PATIENT_FIRST));
    assert!(!html.contains("Patient Details"));
}

#[tokio::test]
async fn select_and_change_doctor() {
    let (state, mock) = setup(directory());
    send(&state, get("/doctor", Some(SESSION))).await;
    send(&state, post_form("/doctor/search", Some(SESSION), "uhid=UH1")).await;
    send(&state, post_form("/doctor/select", Some(SESSION), "doctor_id=1")).await;
    let response = send(&state, post_form("/doctor/change", Some(SESSION), "")).await;
    assert_eq!(location(&response), "/doctor");

    assert_eq!(mock.calls().last().map(String::as_str), Some("change_doctor tok u1 1"));
    let desk = desk_of(&state, "tok").await.unwrap();
    assert_eq!(desk.change_success.as_deref(), Some(MSG_DOCTOR_CHANGED));
    assert!(!desk.is_changing);
}

#[tokio::test]
async fn cancel_closes_panel() {
    let (state, _) = setup(directory());
    send(&state, post_form("/doctor/search", Some(SESSION), "uhid=UH1")).await;
    send(&state, post_form("/doctor/cancel", Some(SESSION), "")).await;

    let desk = desk_of(&state, "tok").await.unwrap();
    assert!(!desk.show_details);
    assert!(desk.patient.is_none());
    assert!(desk.search_term.is_empty());
}

#[tokio::test]
async fn rejected_token_ends_session() {
    let mock = MockDirectory { unauthorized: true, ..directory() };
    let (state, _) = setup(mock);

    let response = send(&state, post_form("/doctor/search", Some(SESSION), "uhid=UH1")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("authToken=;") && c.contains("Max-Age=0")));
    assert!(desk_of(&state, "tok").await.is_none());

    let response = send(&state, get("/doctor", Some(SESSION))).await;
    assert_eq!(location(&response), "/login");
}
