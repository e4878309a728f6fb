//! In-memory case service shared by the integration tests.
#![allow(dead_code)]

use casework_core::coordinator::CancelSignal;
use casework_core::profile::{ProfileKey, ProfileMethodology, ProfileSet, RawProfileSet};
use casework_core::readiness::ReadinessReport;
use casework_core::service::{
    CaseProfiles, CaseService, CatalogService, ProfileService, ReadinessService,
};
use casework_core::workflow::case_wizard::CaseRecord;
use casework_core::{ServiceError, TraitCatalog};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct StoredCase {
    pub record: CaseRecord,
    pub work_history_count: usize,
    pub raw: RawProfileSet,
    pub methodology: ProfileMethodology,
}

/// Answers every collaborator trait from process memory.
pub struct InMemoryService {
    pub catalog: TraitCatalog,
    readiness: Mutex<Result<ReadinessReport, String>>,
    cases: Mutex<BTreeMap<i64, StoredCase>>,
    pub profile_requests: Mutex<Vec<(i64, Option<ProfileMethodology>)>>,
}

pub fn values(vector: &[i32]) -> Vec<Value> {
    vector.iter().map(|value| json!(value)).collect()
}

pub fn passing_report() -> ReadinessReport {
    serde_json::from_value(json!({"overall_status": "pass", "checks": []})).expect("report")
}

pub fn failing_report(message: &str, remediation: &[&str]) -> ReadinessReport {
    serde_json::from_value(json!({
        "overall_status": "fail",
        "checks": [
            {"id": "counts.jobs", "status": "pass", "severity": "blocker", "message": "jobs loaded"},
            {"id": "counts.county_metrics", "status": "fail", "severity": "blocker", "message": message}
        ],
        "remediation": remediation,
    }))
    .expect("report")
}

/// Complete intake record for `case_id`.
pub fn complete_record(case_id: i64) -> CaseRecord {
    CaseRecord {
        case_id,
        first_name: Some("Dana".to_string()),
        last_name: Some("Reyes".to_string()),
        address_line1: Some("12 Elm St".to_string()),
        city: Some("Springfield".to_string()),
        postal_code: Some("62701".to_string()),
        demographic_state_id: Some(17),
        demographic_county_id: Some(167),
        reason_for_referral: Some("Lumbar injury".to_string()),
    }
}

impl Default for InMemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryService {
    pub fn new() -> Self {
        InMemoryService {
            catalog: TraitCatalog::standard(),
            readiness: Mutex::new(Ok(passing_report())),
            cases: Mutex::new(BTreeMap::new()),
            profile_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_readiness(&self, report: Result<ReadinessReport, String>) {
        *self.readiness.lock().expect("lock") = report;
    }

    /// Store a case whose profile1 and profile2 come from work history and
    /// whose stored profile3/profile4 are the defaults.
    pub fn add_case(&self, record: CaseRecord, profile1: &[i32], profile2: &[i32]) {
        let defaults = self.catalog.default_profile();
        let raw = RawProfileSet {
            profile1: values(profile1),
            profile2: values(profile2),
            profile3: values(defaults),
            profile4: values(defaults),
            derived_profile1: None,
        };
        self.cases.lock().expect("lock").insert(
            record.case_id,
            StoredCase {
                record,
                work_history_count: 0,
                raw,
                methodology: ProfileMethodology::default(),
            },
        );
    }

    pub fn set_work_history_count(&self, case_id: i64, count: usize) {
        if let Some(case) = self.cases.lock().expect("lock").get_mut(&case_id) {
            case.work_history_count = count;
        }
    }

    pub fn stored(&self, case_id: i64) -> Option<StoredCase> {
        self.cases.lock().expect("lock").get(&case_id).cloned()
    }

    fn missing(case_id: i64) -> ServiceError {
        ServiceError::Status {
            status: 404,
            message: format!("case {case_id} not found"),
        }
    }
}

impl CatalogService for InMemoryService {
    fn get_traits(&self) -> Result<TraitCatalog, ServiceError> {
        Ok(self.catalog.clone())
    }
}

impl ReadinessService for InMemoryService {
    fn get_readiness(&self) -> Result<ReadinessReport, ServiceError> {
        self.readiness
            .lock()
            .expect("lock")
            .clone()
            .map_err(|message| ServiceError::Status {
                status: 503,
                message,
            })
    }
}

impl ProfileService for InMemoryService {
    fn get_profiles(
        &self,
        case_id: i64,
        overrides: Option<ProfileMethodology>,
        cancel: &CancelSignal,
    ) -> Result<CaseProfiles, ServiceError> {
        cancel.ensure_live()?;
        self.profile_requests
            .lock()
            .expect("lock")
            .push((case_id, overrides));
        let case = self.stored(case_id).ok_or_else(|| Self::missing(case_id))?;
        Ok(CaseProfiles {
            case_id,
            raw: case.raw,
            methodology: overrides.unwrap_or(case.methodology),
        })
    }

    fn save_profiles(
        &self,
        case_id: i64,
        profiles: &ProfileSet,
        methodology: ProfileMethodology,
        cancel: &CancelSignal,
    ) -> Result<CaseProfiles, ServiceError> {
        cancel.ensure_live()?;
        let mut cases = self.cases.lock().expect("lock");
        let case = cases.get_mut(&case_id).ok_or_else(|| Self::missing(case_id))?;
        case.raw = RawProfileSet {
            profile1: values(profiles.vector(ProfileKey::Profile1)),
            profile2: values(profiles.vector(ProfileKey::Profile2)),
            profile3: values(profiles.vector(ProfileKey::Profile3)),
            profile4: values(profiles.vector(ProfileKey::Profile4)),
            derived_profile1: Some(values(profiles.derived_profile1())),
        };
        case.methodology = methodology;
        Ok(CaseProfiles {
            case_id,
            raw: case.raw.clone(),
            methodology,
        })
    }
}

impl CaseService for InMemoryService {
    fn get_case(&self, case_id: i64, cancel: &CancelSignal) -> Result<CaseRecord, ServiceError> {
        cancel.ensure_live()?;
        self.stored(case_id)
            .map(|case| case.record)
            .ok_or_else(|| Self::missing(case_id))
    }

    fn work_history_count(
        &self,
        case_id: i64,
        cancel: &CancelSignal,
    ) -> Result<usize, ServiceError> {
        cancel.ensure_live()?;
        self.stored(case_id)
            .map(|case| case.work_history_count)
            .ok_or_else(|| Self::missing(case_id))
    }
}
