//! Wire decoding for the scheduling API.
//!
//! The remote API is loosely typed: ids arrive as strings or numbers and the
//! doctor list uses two different field spellings. Everything is mapped into
//! one internal shape here so the rest of the crate never sees raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNKNOWN_DOCTOR: &str = "Unknown Doctor";

// =============================================================================
// LOOSE SCALARS
// =============================================================================

/// A scalar the API sends as either a string or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
    /// Objects, arrays: present but unusable.
    #[expect(dead_code)]
    Other(serde::de::IgnoredAny),
}

impl Loose {
    fn into_string(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(n) => Some(n.to_string()),
            Self::Flag(b) => Some(b.to_string()),
            Self::Other(_) => None,
        }
    }
}

fn loose(value: Option<Loose>) -> Option<String> {
    value.and_then(Loose::into_string)
}

fn decode_item<T: for<'de> Deserialize<'de> + Default>(value: &Value) -> T {
    T::deserialize(value).unwrap_or_default()
}

/// Non-empty `message` string from a response body.
#[must_use]
pub fn response_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_owned)
}

// =============================================================================
// DOCTORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDoctor {
    id: Option<Loose>,
    doctor_id: Option<Loose>,
    name: Option<Loose>,
    doctor_name: Option<Loose>,
    profile_image: Option<Loose>,
}

/// Normalise one doctor-list entry. `position` is 1-based.
#[must_use]
pub fn normalize_doctor(item: &Value, position: usize) -> Doctor {
    let raw: RawDoctor = decode_item(item);
    let id = loose(raw.id)
        .or_else(|| loose(raw.doctor_id))
        .unwrap_or_else(|| position.to_string());
    let name = loose(raw.name)
        .or_else(|| loose(raw.doctor_name))
        .unwrap_or_else(|| UNKNOWN_DOCTOR.to_owned());
    let image = loose(raw.profile_image).filter(|s| !s.is_empty());
    Doctor { id, name, image }
}

/// Decode `{ data: [...] }`. A missing or non-array `data` is an empty list.
#[must_use]
pub fn decode_doctor_list(body: &Value) -> Vec<Doctor> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(i, item)| normalize_doctor(item, i + 1))
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// PATIENTS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Patient {
    pub user_id: Option<String>,
    pub uhid: Option<String>,
    pub name: Option<String>,
    pub mobile_number: Option<String>,
    pub assigned_doctor: Option<String>,
    pub assigned_counselor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPatient {
    user_id: Option<Loose>,
    uhid: Option<Loose>,
    name: Option<Loose>,
    mobile_number: Option<Loose>,
    assigned_doctor: Option<Loose>,
    assigned_counselor: Option<Loose>,
}

impl From<RawPatient> for Patient {
    fn from(raw: RawPatient) -> Self {
        Self {
            user_id: loose(raw.user_id).filter(|s| !s.is_empty()),
            uhid: loose(raw.uhid),
            name: loose(raw.name),
            mobile_number: loose(raw.mobile_number),
            assigned_doctor: loose(raw.assigned_doctor),
            assigned_counselor: loose(raw.assigned_counselor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientLookup {
    Found(Patient),
    /// No `data` in the body; carries the remote `message` if one was sent.
    Missing { message: Option<String> },
}

#[must_use]
pub fn decode_patient_lookup(body: &Value) -> PatientLookup {
    match body.get("data") {
        Some(data @ Value::Object(_)) => PatientLookup::Found(decode_item::<RawPatient>(data).into()),
        _ => PatientLookup::Missing { message: response_message(body) },
    }
}

// =============================================================================
// DOCTOR CHANGE
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ChangeDoctorRequest<'a> {
    pub user_id: &'a str,
    pub doctor_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeReceipt {
    pub message: Option<String>,
}

#[must_use]
pub fn decode_change_receipt(body: &Value) -> ChangeReceipt {
    ChangeReceipt { message: response_message(body) }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
