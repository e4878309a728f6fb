//! JSON shapes exchanged with the case service.
use crate::catalog::{TraitCatalog, TraitSpec};
use crate::error::ServiceError;
use crate::profile::{ProfileMethodology, ProfileMode, ProfileSet, RawProfileSet};
use crate::workflow::case_wizard::CaseRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct TraitsResponse {
    pub traits: Vec<TraitSpec>,
    #[serde(rename = "defaultProfile", default)]
    pub default_profile: Vec<i32>,
}

impl TraitsResponse {
    pub fn into_catalog(self) -> Result<TraitCatalog, ServiceError> {
        TraitCatalog::new(self.traits, self.default_profile)
            .map_err(|err| ServiceError::Decode(err.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct MethodologyBody {
    #[serde(default)]
    pub mode: ProfileMode,
    #[serde(default = "default_cap")]
    pub enforce_residual_cap: bool,
}

fn default_cap() -> bool {
    true
}

/// A missing `methodology` object means strict derivation with the cap on.
impl Default for MethodologyBody {
    fn default() -> Self {
        MethodologyBody {
            mode: ProfileMode::default(),
            enforce_residual_cap: default_cap(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct DerivedBody {
    #[serde(default)]
    pub profile1: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ProfilesBody {
    pub profile1: Vec<Value>,
    pub profile2: Vec<Value>,
    pub profile3: Vec<Value>,
    pub profile4: Vec<Value>,
    #[serde(default)]
    pub methodology: MethodologyBody,
    #[serde(default)]
    pub derived: DerivedBody,
}

/// `GET`/`PUT /api/cases/{id}/profiles` response.
#[derive(Debug, Deserialize)]
pub struct ProfilesResponse {
    #[serde(rename = "caseId")]
    pub case_id: i64,
    pub profiles: ProfilesBody,
}

impl ProfilesResponse {
    pub fn into_case_profiles(self) -> super::CaseProfiles {
        let body = self.profiles;
        super::CaseProfiles {
            case_id: self.case_id,
            raw: RawProfileSet {
                profile1: body.profile1,
                profile2: body.profile2,
                profile3: body.profile3,
                profile4: body.profile4,
                derived_profile1: body.derived.profile1,
            },
            methodology: ProfileMethodology {
                mode: body.methodology.mode,
                enforce_residual_cap: body.methodology.enforce_residual_cap,
            },
        }
    }
}

/// `PUT /api/cases/{id}/profiles` body.
#[derive(Debug, Serialize)]
pub struct SaveProfilesRequest {
    pub profile1: Vec<i32>,
    pub profile2: Vec<i32>,
    pub profile3: Vec<i32>,
    pub profile4: Vec<i32>,
    #[serde(rename = "clinicalOverrideMode")]
    pub clinical_override_mode: bool,
    #[serde(rename = "enforceResidualCap")]
    pub enforce_residual_cap: bool,
}

impl SaveProfilesRequest {
    pub fn new(profiles: &ProfileSet, methodology: ProfileMethodology) -> Self {
        use crate::profile::ProfileKey;
        SaveProfilesRequest {
            profile1: profiles.vector(ProfileKey::Profile1).to_vec(),
            profile2: profiles.vector(ProfileKey::Profile2).to_vec(),
            profile3: profiles.vector(ProfileKey::Profile3).to_vec(),
            profile4: profiles.vector(ProfileKey::Profile4).to_vec(),
            clinical_override_mode: !methodology.is_strict(),
            enforce_residual_cap: methodology.enforce_residual_cap,
        }
    }
}

/// Query flags understood by the profiles endpoint (`0`/`1`).
pub fn methodology_query(methodology: ProfileMethodology) -> [(&'static str, &'static str); 2] {
    let flag = |on: bool| if on { "1" } else { "0" };
    [
        ("clinicalOverrideMode", flag(!methodology.is_strict())),
        ("enforceResidualCap", flag(methodology.enforce_residual_cap)),
    ]
}

#[derive(Debug, Deserialize)]
pub struct CaseResponse {
    pub case: CaseRecord,
}

#[derive(Debug, Deserialize)]
pub struct WorkHistoryResponse {
    #[serde(default)]
    pub rows: Vec<Value>,
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
