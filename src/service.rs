//! External collaborators consumed by the core.
//!
//! The core never talks to the network directly; it goes through these
//! traits so sessions can run against the HTTP backend or in-memory fakes.
//! Calls that may be superseded take the coordinator's [`CancelSignal`].
use crate::catalog::TraitCatalog;
use crate::coordinator::CancelSignal;
use crate::error::ServiceError;
use crate::profile::{ProfileMethodology, ProfileSet, RawProfileSet};
use crate::readiness::ReadinessReport;
use crate::workflow::case_wizard::CaseRecord;

pub mod http;
pub mod wire;

pub use http::HttpBackend;

/// Profiles for one case as returned by the case service.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseProfiles {
    pub case_id: i64,
    pub raw: RawProfileSet,
    pub methodology: ProfileMethodology,
}

pub trait CatalogService {
    /// Trait catalog plus default profile; fetched once per session.
    fn get_traits(&self) -> Result<TraitCatalog, ServiceError>;
}

pub trait ReadinessService {
    fn get_readiness(&self) -> Result<ReadinessReport, ServiceError>;
}

pub trait ProfileService {
    /// Stored or derived profiles. `overrides` asks the service to re-derive
    /// under a specific methodology.
    fn get_profiles(
        &self,
        case_id: i64,
        overrides: Option<ProfileMethodology>,
        cancel: &CancelSignal,
    ) -> Result<CaseProfiles, ServiceError>;

    fn save_profiles(
        &self,
        case_id: i64,
        profiles: &ProfileSet,
        methodology: ProfileMethodology,
        cancel: &CancelSignal,
    ) -> Result<CaseProfiles, ServiceError>;
}

/// Case records and the work-history count the workflows read.
pub trait CaseService {
    fn get_case(&self, case_id: i64, cancel: &CancelSignal) -> Result<CaseRecord, ServiceError>;

    fn work_history_count(&self, case_id: i64, cancel: &CancelSignal)
        -> Result<usize, ServiceError>;
}
