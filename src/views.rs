//! HTML rendering.
//!
//! Templates live in `templates/` and are compiled into the binary. Tera
//! autoescapes every `.html` template, so view models carry raw strings.
//! View models are flattened here so templates never deal with `Option`
//! chains or the desk's internals.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use tera::{Context, Tera};

use crate::auth_context::AuthContext;
use crate::desk::DoctorDesk;

/// Shown for doctors without a profile image.
pub const DEFAULT_AVATAR: &str = "https://images.unsplash.com/photo-1559839734-2b71ea197ec2?w=40&h=40&fit=crop&crop=face";

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "page render failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

// =============================================================================
// VIEW MODELS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NavView {
    pub authenticated: bool,
    pub role: String,
}

impl NavView {
    #[must_use]
    pub fn from_context(ctx: &AuthContext) -> Self {
        Self {
            authenticated: ctx.is_authenticated(),
            role: ctx.user().map_or("User", |u| u.display_role()).to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LandingPage {
    pub nav: NavView,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub nav: NavView,
    pub error: Option<String>,
    pub email: String,
    pub redirect: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PatientView {
    pub name: String,
    pub uhid: String,
    pub mobile_number: String,
    pub assigned_doctor: String,
    pub has_assigned_doctor: bool,
    pub assigned_counselor: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorCard {
    pub id: String,
    pub name: String,
    pub image: String,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct DoctorPage {
    pub nav: NavView,
    pub search_term: String,
    pub is_searching: bool,
    pub patient_error: Option<String>,
    pub show_details: bool,
    pub patient: Option<PatientView>,
    pub selected_doctor_name: Option<String>,
    pub doctors: Vec<DoctorCard>,
    pub is_loading_doctors: bool,
    pub doctors_error: Option<String>,
    pub no_doctors: bool,
    pub is_changing: bool,
    pub change_error: Option<String>,
    pub change_success: Option<String>,
}

impl DoctorPage {
    #[must_use]
    pub fn new(nav: NavView, desk: &DoctorDesk) -> Self {
        let patient = desk.patient.as_ref().map(|p| PatientView {
            name: p.name.clone().unwrap_or_default(),
            uhid: p.uhid.clone().unwrap_or_default(),
            mobile_number: p.mobile_number.clone().unwrap_or_default(),
            assigned_doctor: p.assigned_doctor.clone().unwrap_or_default(),
            has_assigned_doctor: p.assigned_doctor.as_deref().is_some_and(|d| !d.is_empty()),
            assigned_counselor: p.assigned_counselor.clone().unwrap_or_default(),
        });
        let doctors = desk
            .doctors
            .iter()
            .map(|d| DoctorCard {
                id: d.id.clone(),
                name: d.name.clone(),
                image: d.image.clone().unwrap_or_else(|| DEFAULT_AVATAR.to_owned()),
                selected: desk.selected_doctor.as_deref() == Some(d.id.as_str()),
            })
            .collect::<Vec<_>>();

        Self {
            nav,
            search_term: desk.search_term.clone(),
            is_searching: desk.is_searching,
            patient_error: desk.patient_error.clone(),
            show_details: desk.show_details,
            patient,
            selected_doctor_name: desk.selected_doctor_name().map(str::to_owned),
            no_doctors: doctors.is_empty(),
            doctors,
            is_loading_doctors: desk.is_loading_doctors,
            doctors_error: desk.doctors_error.clone(),
            is_changing: desk.is_changing,
            change_error: desk.change_error.clone(),
            change_success: desk.change_success.clone(),
        }
    }
}

// =============================================================================
// RENDERER
// =============================================================================

pub struct Views {
    tera: Tera,
}

impl Views {
    /// Compile the embedded templates.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to parse.
    pub fn new() -> Result<Self, ViewError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("layout.html", include_str!("../templates/layout.html")),
            ("landing.html", include_str!("../templates/landing.html")),
            ("login.html", include_str!("../templates/login.html")),
            ("doctor.html", include_str!("../templates/doctor.html")),
        ])?;
        Ok(Self { tera })
    }

    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn landing(&self, page: &LandingPage) -> Result<Html<String>, ViewError> {
        self.render("landing.html", page)
    }

    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn login(&self, page: &LoginPage) -> Result<Html<String>, ViewError> {
        self.render("login.html", page)
    }

    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn doctor(&self, page: &DoctorPage) -> Result<Html<String>, ViewError> {
        self.render("doctor.html", page)
    }

    fn render<T: Serialize>(&self, name: &str, page: &T) -> Result<Html<String>, ViewError> {
        let context = Context::from_serialize(page)?;
        Ok(Html(self.tera.render(name, &context)?))
    }
}

#[cfg(test)]
#[path = "views_test.rs"]
mod tests;
