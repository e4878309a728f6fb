//! Blocking HTTP backend for the case service.
//!
//! Cancellation is cooperative: the signal is checked before a request is
//! issued and again after the body is read, so a superseded call never
//! hands back a value.
use super::wire::{
    methodology_query, CaseResponse, ErrorBody, ProfilesResponse, SaveProfilesRequest,
    TraitsResponse, WorkHistoryResponse,
};
use super::{CaseProfiles, CaseService, CatalogService, ProfileService, ReadinessService};
use crate::catalog::TraitCatalog;
use crate::coordinator::CancelSignal;
use crate::error::ServiceError;
use crate::profile::{ProfileMethodology, ProfileSet};
use crate::readiness::ReadinessReport;
use crate::workflow::case_wizard::CaseRecord;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

/// HTTP client bound to one service base URL.
#[derive(Clone)]
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        HttpBackend {
            agent: config.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        cancel: Option<&CancelSignal>,
    ) -> Result<T, ServiceError> {
        check_cancel(cancel)?;
        let started = Instant::now();
        let mut request = self.agent.get(&self.url(path));
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        let response = request.call()?;
        let decoded = decode(response, path)?;
        tracing::debug!(
            path,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "GET completed"
        );
        check_cancel(cancel)?;
        Ok(decoded)
    }

    fn put_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        cancel: Option<&CancelSignal>,
    ) -> Result<T, ServiceError> {
        check_cancel(cancel)?;
        let started = Instant::now();
        let response = self.agent.put(&self.url(path)).send_json(body)?;
        let decoded = decode(response, path)?;
        tracing::debug!(
            path,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "PUT completed"
        );
        check_cancel(cancel)?;
        Ok(decoded)
    }
}

fn check_cancel(cancel: Option<&CancelSignal>) -> Result<(), ServiceError> {
    match cancel {
        Some(signal) => signal.ensure_live(),
        None => Ok(()),
    }
}

fn decode<T: DeserializeOwned>(
    mut response: ureq::http::Response<ureq::Body>,
    path: &str,
) -> Result<T, ServiceError> {
    let status = response.status().as_u16();
    let text = response.body_mut().read_to_string()?;
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| text.trim().to_string());
        tracing::debug!(path, status, %message, "service returned error status");
        return Err(ServiceError::Status { status, message });
    }
    serde_json::from_str(&text).map_err(|err| ServiceError::Decode(format!("{path}: {err}")))
}

impl CatalogService for HttpBackend {
    fn get_traits(&self) -> Result<TraitCatalog, ServiceError> {
        let response: TraitsResponse = self.get_json("/api/traits", &[], None)?;
        response.into_catalog()
    }
}

impl ReadinessService for HttpBackend {
    fn get_readiness(&self) -> Result<ReadinessReport, ServiceError> {
        self.get_json("/api/readiness", &[], None)
    }
}

impl ProfileService for HttpBackend {
    fn get_profiles(
        &self,
        case_id: i64,
        overrides: Option<ProfileMethodology>,
        cancel: &CancelSignal,
    ) -> Result<CaseProfiles, ServiceError> {
        let path = format!("/api/cases/{case_id}/profiles");
        let query = overrides.map(methodology_query);
        let query: &[(&str, &str)] = match query.as_ref() {
            Some(pairs) => pairs,
            None => &[],
        };
        let response: ProfilesResponse = self.get_json(&path, query, Some(cancel))?;
        Ok(response.into_case_profiles())
    }

    fn save_profiles(
        &self,
        case_id: i64,
        profiles: &ProfileSet,
        methodology: ProfileMethodology,
        cancel: &CancelSignal,
    ) -> Result<CaseProfiles, ServiceError> {
        let path = format!("/api/cases/{case_id}/profiles");
        let body = SaveProfilesRequest::new(profiles, methodology);
        let response: ProfilesResponse = self.put_json(&path, &body, Some(cancel))?;
        Ok(response.into_case_profiles())
    }
}

impl CaseService for HttpBackend {
    fn get_case(&self, case_id: i64, cancel: &CancelSignal) -> Result<CaseRecord, ServiceError> {
        let response: CaseResponse =
            self.get_json(&format!("/api/cases/{case_id}"), &[], Some(cancel))?;
        Ok(response.case)
    }

    fn work_history_count(
        &self,
        case_id: i64,
        cancel: &CancelSignal,
    ) -> Result<usize, ServiceError> {
        let response: WorkHistoryResponse = self.get_json(
            &format!("/api/cases/{case_id}/work-history-dots"),
            &[],
            Some(cancel),
        )?;
        Ok(response.rows.len())
    }
}
