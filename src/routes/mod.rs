//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the HTML pages, their form actions, a JSON session
//! probe and the static assets. Middleware runs outermost first:
//! trace -> compression -> route guard -> auth context provider -> handler.

pub mod auth;
pub mod doctor;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::Html;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth_context::{AuthContext, provide_auth_context};
use crate::guard::route_guard;
use crate::state::AppState;
use crate::views::{LandingPage, NavView, ViewError};

pub fn app(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(landing))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/api/session", get(auth::session))
        .route("/doctor", get(doctor::page))
        .route("/doctor/search", post(doctor::search))
        .route("/doctor/select", post(doctor::select))
        .route("/doctor/change", post(doctor::change))
        .route("/doctor/cancel", post(doctor::cancel))
        .route("/healthz", get(healthz))
        .nest_service("/static", static_dir)
        .layer(middleware::from_fn_with_state(state.clone(), provide_auth_context))
        .layer(middleware::from_fn(route_guard))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /`: public landing page.
async fn landing(State(state): State<AppState>, ctx: AuthContext) -> Result<Html<String>, ViewError> {
    state.views.landing(&LandingPage { nav: NavView::from_context(&ctx) })
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
