//! Auth routes: login form, logout, session probe.

use axum::{Form, Json};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::auth_context::{AuthContext, AuthSnapshot, is_local_path};
use crate::state::AppState;
use crate::views::{LoginPage, NavView};

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    redirect: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    /// Carried over from the login page's `?redirect=` query.
    redirect: Option<String>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /login`: render the form, remembering where to go afterwards.
pub async fn login_page(State(state): State<AppState>, ctx: AuthContext, Query(query): Query<LoginQuery>) -> Response {
    let page = LoginPage {
        nav: NavView::from_context(&ctx),
        error: None,
        email: String::new(),
        redirect: query.redirect.filter(|r| is_local_path(r)),
    };
    state.views.login(&page).into_response()
}

/// `POST /login`: sign in, set the session cookies and redirect.
pub async fn login(
    State(state): State<AppState>,
    mut ctx: AuthContext,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Response {
    let query_redirect = form.redirect.as_deref().or(query.redirect.as_deref());
    match ctx.login(&form.email, &form.password, None, query_redirect).await {
        Ok(navigation) => {
            tracing::debug!(target_path = navigation.target(), "redirecting after login");
            (ctx.into_jar(), navigation).into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "login failed");
            let page = LoginPage {
                nav: NavView::from_context(&ctx),
                error: Some(err.to_string()),
                email: form.email,
                redirect: form.redirect.or(query.redirect).filter(|r| is_local_path(r)),
            };
            state.views.login(&page).into_response()
        }
    }
}

/// `POST /logout`: clear the session and its desk.
pub async fn logout(State(state): State<AppState>, mut ctx: AuthContext) -> Response {
    if let Some(token) = ctx.token() {
        state.drop_desk(&token).await;
    }
    let navigation = ctx.logout();
    tracing::info!("logged out");
    (ctx.into_jar(), navigation).into_response()
}

/// `GET /api/session`: the auth context as JSON.
pub async fn session(ctx: AuthContext) -> Json<AuthSnapshot> {
    Json(ctx.snapshot())
}
