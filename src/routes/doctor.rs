//! Doctor desk routes: the `/doctor` page and its form actions.
//!
//! DESIGN
//! ======
//! Every action follows post/redirect/get: it updates the session's desk and
//! answers `303 /doctor`, and the page handler renders whatever the desk now
//! holds. Remote calls happen between `begin_*` and `finish_*` with the desk
//! lock released. A 401 from the API ends the session, drops the desk and
//! sends the browser to `/login`.

use axum::Form;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::api::{ApiError, Reply};
use crate::auth_context::AuthContext;
use crate::desk::DoctorDesk;
use crate::guard::login_redirect_url;
use crate::session::{LOGIN_PATH, Navigation};
use crate::state::AppState;
use crate::views::{DoctorPage, NavView};

const DESK_PATH: &str = "/doctor";

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    uhid: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectForm {
    #[serde(default)]
    doctor_id: String,
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// A remote call after the session layer has looked at it.
enum Outcome<T> {
    /// Data or an inline error message for the desk.
    Settled(Result<T, String>),
    /// The API refused the token; the context has already logged out.
    Expired,
}

fn settle<T>(ctx: &mut AuthContext, result: Result<Reply<T>, ApiError>, action: &'static str) -> Outcome<T> {
    match result {
        Ok(reply) => match ctx.settle(reply) {
            Some(value) => Outcome::Settled(Ok(value)),
            None => Outcome::Expired,
        },
        Err(err) => {
            tracing::warn!(error = %err, action, "directory call failed");
            Outcome::Settled(Err(err.to_string()))
        }
    }
}

/// Session ended mid-request: forget the desk and go to the login page.
async fn expire(state: &AppState, token: &str, ctx: AuthContext) -> Response {
    state.drop_desk(token).await;
    (ctx.into_jar(), Navigation::InApp(LOGIN_PATH.to_owned())).into_response()
}

fn back_to_desk() -> Response {
    Redirect::to(DESK_PATH).into_response()
}

/// The session token, or a login redirect when there is none.
fn require_token(ctx: &AuthContext) -> Result<String, Response> {
    ctx.token()
        .ok_or_else(|| Redirect::to(&login_redirect_url(DESK_PATH)).into_response())
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /doctor`: load the doctor list on first visit, then render.
pub async fn page(State(state): State<AppState>, mut ctx: AuthContext) -> Response {
    let token = match require_token(&ctx) {
        Ok(token) => token,
        Err(response) => return response,
    };

    if state.with_desk(&token, DoctorDesk::begin_doctor_load).await {
        let result = state.directory.list_doctors(Some(&token)).await;
        match settle(&mut ctx, result, "list_doctors") {
            Outcome::Expired => return expire(&state, &token, ctx).await,
            Outcome::Settled(outcome) => {
                if let Err(message) = &outcome {
                    tracing::debug!(%message, "doctor list unavailable");
                }
                state.update_desk(&token, |desk| desk.finish_doctor_load(outcome)).await;
            }
        }
    }

    let desk = state.with_desk(&token, |desk| desk.clone()).await;
    let page = DoctorPage::new(NavView::from_context(&ctx), &desk);
    state.views.doctor(&page).into_response()
}

/// `POST /doctor/search`: look a patient up by UHID.
pub async fn search(State(state): State<AppState>, mut ctx: AuthContext, Form(form): Form<SearchForm>) -> Response {
    let token = match require_token(&ctx) {
        Ok(token) => token,
        Err(response) => return response,
    };

    let Some(ticket) = state.with_desk(&token, |desk| desk.begin_search(&form.uhid)).await else {
        return back_to_desk();
    };

    let result = state.directory.find_patient(Some(&token), &ticket.uhid).await;
    match settle(&mut ctx, result, "find_patient") {
        Outcome::Expired => expire(&state, &token, ctx).await,
        Outcome::Settled(outcome) => {
            state
                .update_desk(&token, |desk| desk.finish_search(&ticket, outcome))
                .await;
            back_to_desk()
        }
    }
}

/// `POST /doctor/select`: pick a doctor from the list.
pub async fn select(State(state): State<AppState>, ctx: AuthContext, Form(form): Form<SelectForm>) -> Response {
    let token = match require_token(&ctx) {
        Ok(token) => token,
        Err(response) => return response,
    };
    if !state.with_desk(&token, |desk| desk.select_doctor(&form.doctor_id)).await {
        tracing::debug!(doctor_id = %form.doctor_id, "ignoring unknown doctor selection");
    }
    back_to_desk()
}

/// `POST /doctor/change`: reassign the patient to the selected doctor.
pub async fn change(State(state): State<AppState>, mut ctx: AuthContext) -> Response {
    let token = match require_token(&ctx) {
        Ok(token) => token,
        Err(response) => return response,
    };

    let Some(ticket) = state.with_desk(&token, DoctorDesk::begin_change).await else {
        return back_to_desk();
    };

    let result = state
        .directory
        .change_doctor(Some(&token), &ticket.user_id, &ticket.doctor_id)
        .await;
    match settle(&mut ctx, result, "change_doctor") {
        Outcome::Expired => expire(&state, &token, ctx).await,
        Outcome::Settled(outcome) => {
            if outcome.is_ok() {
                tracing::info!(user_id = %ticket.user_id, doctor_id = %ticket.doctor_id, "doctor changed");
            }
            state.update_desk(&token, |desk| desk.finish_change(outcome)).await;
            back_to_desk()
        }
    }
}

/// `POST /doctor/cancel`: close the patient panel.
pub async fn cancel(State(state): State<AppState>, ctx: AuthContext) -> Response {
    let token = match require_token(&ctx) {
        Ok(token) => token,
        Err(response) => return response,
    };
    state.with_desk(&token, DoctorDesk::cancel).await;
    back_to_desk()
}
