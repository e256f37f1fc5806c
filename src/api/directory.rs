//! Patient/doctor directory operations on the remote admin API.
//!
//! The [`Directory`] trait is the seam the doctor desk talks to; the real
//! implementation goes through [`ApiClient`], tests substitute a mock.

use super::types::{
    ChangeDoctorRequest, ChangeReceipt, Doctor, PatientLookup, decode_change_receipt, decode_doctor_list,
    decode_patient_lookup,
};
use super::{ApiClient, ApiError, Reply};
use crate::config::ApiEndpoints;

/// Remote directory calls, each carrying the caller's session token.
#[async_trait::async_trait]
pub trait Directory: Send + Sync {
    /// Fetch and normalise the doctor list.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on network failure or an undecodable body.
    async fn list_doctors(&self, token: Option<&str>) -> Result<Reply<Vec<Doctor>>, ApiError>;

    /// Look a patient up by UHID.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on network failure or an undecodable body.
    async fn find_patient(&self, token: Option<&str>, uhid: &str) -> Result<Reply<PatientLookup>, ApiError>;

    /// Reassign the patient's doctor.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on network failure or an undecodable body.
    async fn change_doctor(
        &self,
        token: Option<&str>,
        user_id: &str,
        doctor_id: &str,
    ) -> Result<Reply<ChangeReceipt>, ApiError>;
}

pub struct RemoteDirectory {
    api: ApiClient,
    endpoints: ApiEndpoints,
}

impl RemoteDirectory {
    #[must_use]
    pub fn new(api: ApiClient, endpoints: ApiEndpoints) -> Self {
        Self { api, endpoints }
    }
}

/// `find-patient` URL with the UHID as an encoded query parameter.
pub(crate) fn find_patient_url(endpoints: &ApiEndpoints, uhid: &str) -> Result<String, ApiError> {
    url::Url::parse_with_params(&endpoints.find_patient_url(), &[("uhid", uhid)])
        .map(String::from)
        .map_err(|e| ApiError::Decode { status: 0, reason: format!("bad find-patient url: {e}") })
}

#[async_trait::async_trait]
impl Directory for RemoteDirectory {
    async fn list_doctors(&self, token: Option<&str>) -> Result<Reply<Vec<Doctor>>, ApiError> {
        let reply = self.api.get(&self.endpoints.doctor_list_url(), token).await?;
        Ok(reply.map(|body| decode_doctor_list(&body)))
    }

    async fn find_patient(&self, token: Option<&str>, uhid: &str) -> Result<Reply<PatientLookup>, ApiError> {
        let url = find_patient_url(&self.endpoints, uhid)?;
        let reply = self.api.get(&url, token).await?;
        Ok(reply.map(|body| decode_patient_lookup(&body)))
    }

    async fn change_doctor(
        &self,
        token: Option<&str>,
        user_id: &str,
        doctor_id: &str,
    ) -> Result<Reply<ChangeReceipt>, ApiError> {
        let body = ChangeDoctorRequest { user_id, doctor_id };
        let reply = self
            .api
            .patch(&self.endpoints.change_doctor_url(), token, &body)
            .await?;
        Ok(reply.map(|body| decode_change_receipt(&body)))
    }
}

#[cfg(test)]
#[path = "directory_test.rs"]
mod tests;
