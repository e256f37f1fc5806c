//! Doctor desk: page state for patient search and doctor reassignment.
//!
//! SYSTEM CONTEXT
//! ==============
//! One desk per signed-in session, held in `AppState` and rendered by the
//! `/doctor` page. Route handlers drive it in two steps around every remote
//! call: a `begin_*` method validates input and flips the busy flag under the
//! lock, the lock is released for the network await, and a `finish_*` method
//! applies the outcome.
//!
//! STALE RESPONSES
//! ===============
//! Every search takes a [`SearchTicket`] stamped with a generation number.
//! Starting a new search or cancelling bumps the generation, so a slow reply
//! to an older search is dropped instead of overwriting newer state.

use crate::api::types::{ChangeReceipt, Doctor, Patient, PatientLookup};

pub const MSG_ENTER_UHID: &str = "Please enter UHID";
pub const MSG_PATIENT_NOT_FOUND: &str = "Patient not found";
pub const MSG_SELECT_PATIENT_FIRST: &str = "Please search and select a patient first.";
pub const MSG_SELECT_DOCTOR: &str = "Please select a doctor.";
pub const MSG_DOCTOR_CHANGED: &str = "Doctor changed successfully";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    pub uhid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTicket {
    pub user_id: String,
    pub doctor_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct DoctorDesk {
    // Patient search
    pub search_term: String,
    pub show_details: bool,
    pub patient: Option<Patient>,
    pub patient_error: Option<String>,
    pub is_searching: bool,
    search_generation: u64,

    // Doctor list
    pub doctors: Vec<Doctor>,
    pub selected_doctor: Option<String>,
    pub is_loading_doctors: bool,
    pub doctors_error: Option<String>,
    doctors_requested: bool,

    // Doctor change
    pub is_changing: bool,
    pub change_error: Option<String>,
    pub change_success: Option<String>,
}

impl DoctorDesk {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // DOCTOR LIST
    // =========================================================================

    /// Whether the doctor list still needs fetching. Marks it as loading.
    /// A failed load is retried on the next page view.
    pub fn begin_doctor_load(&mut self) -> bool {
        if self.doctors_requested {
            return false;
        }
        self.doctors_requested = true;
        self.is_loading_doctors = true;
        self.doctors_error = None;
        true
    }

    pub fn finish_doctor_load(&mut self, outcome: Result<Vec<Doctor>, String>) {
        self.is_loading_doctors = false;
        match outcome {
            Ok(doctors) => {
                self.selected_doctor = doctors.first().map(|d| d.id.clone());
                self.doctors = doctors;
                self.resolve_assigned_doctor();
            }
            Err(message) => {
                self.doctors_requested = false;
                self.doctors_error = Some(message);
            }
        }
    }

    pub fn select_doctor(&mut self, doctor_id: &str) -> bool {
        if !self.doctors.iter().any(|d| d.id == doctor_id) {
            return false;
        }
        self.selected_doctor = Some(doctor_id.to_owned());
        true
    }

    #[must_use]
    pub fn selected_doctor_name(&self) -> Option<&str> {
        let selected = self.selected_doctor.as_deref()?;
        self.doctors
            .iter()
            .find(|d| d.id == selected)
            .map(|d| d.name.as_str())
    }

    /// Select the doctor whose name matches the patient's assigned doctor.
    fn resolve_assigned_doctor(&mut self) {
        let Some(assigned) = self.patient.as_ref().and_then(|p| p.assigned_doctor.as_deref()) else {
            return;
        };
        let wanted = assigned.trim().to_lowercase();
        if let Some(found) = self
            .doctors
            .iter()
            .find(|d| d.name.trim().to_lowercase() == wanted)
        {
            self.selected_doctor = Some(found.id.clone());
        }
    }

    // =========================================================================
    // PATIENT SEARCH
    // =========================================================================

    /// Start a search for `term`. Returns `None` (with an inline error) when
    /// the term is blank.
    pub fn begin_search(&mut self, term: &str) -> Option<SearchTicket> {
        term.clone_into(&mut self.search_term);
        let uhid = term.trim();
        if uhid.is_empty() {
            self.patient_error = Some(MSG_ENTER_UHID.to_owned());
            return None;
        }

        self.search_generation += 1;
        self.is_searching = true;
        self.patient_error = None;
        self.show_details = false;
        self.patient = None;
        Some(SearchTicket { generation: self.search_generation, uhid: uhid.to_owned() })
    }

    #[must_use]
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.generation == self.search_generation
    }

    /// Apply a search outcome. Returns `false` if the ticket is stale.
    pub fn finish_search(&mut self, ticket: &SearchTicket, outcome: Result<PatientLookup, String>) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(uhid = %ticket.uhid, "discarding stale patient search");
            return false;
        }
        self.is_searching = false;
        match outcome {
            Ok(PatientLookup::Found(patient)) => {
                self.patient = Some(patient);
                self.show_details = true;
                self.resolve_assigned_doctor();
            }
            Ok(PatientLookup::Missing { message }) => {
                self.patient_error = Some(message.unwrap_or_else(|| MSG_PATIENT_NOT_FOUND.to_owned()));
            }
            Err(message) => self.patient_error = Some(message),
        }
        true
    }

    /// Close the patient panel and forget the search.
    pub fn cancel(&mut self) {
        self.search_generation += 1;
        self.is_searching = false;
        self.show_details = false;
        self.search_term.clear();
        self.patient = None;
        self.patient_error = None;
    }

    // =========================================================================
    // DOCTOR CHANGE
    // =========================================================================

    /// Validate and start a doctor change. `None` means nothing should be sent.
    pub fn begin_change(&mut self) -> Option<ChangeTicket> {
        if self.is_changing {
            return None;
        }
        self.change_error = None;
        self.change_success = None;

        let Some(user_id) = self.patient.as_ref().and_then(|p| p.user_id.clone()) else {
            self.change_error = Some(MSG_SELECT_PATIENT_FIRST.to_owned());
            return None;
        };
        let Some(doctor_id) = self.selected_doctor.clone() else {
            self.change_error = Some(MSG_SELECT_DOCTOR.to_owned());
            return None;
        };

        self.is_changing = true;
        Some(ChangeTicket { user_id, doctor_id })
    }

    pub fn finish_change(&mut self, outcome: Result<ChangeReceipt, String>) {
        self.is_changing = false;
        match outcome {
            Ok(receipt) => {
                self.change_success = Some(receipt.message.unwrap_or_else(|| MSG_DOCTOR_CHANGED.to_owned()));
            }
            Err(message) => self.change_error = Some(message),
        }
    }
}

#[cfg(test)]
#[path = "desk_test.rs"]
mod tests;
