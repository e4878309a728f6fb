//! Core of a vocational case-management tool.
//!
//! - [`profile`]: the four worker-trait vectors and their derivation rules
//! - [`adjust`]: bulk lowering, copying, and change counting
//! - [`readiness`]: the fail-closed data readiness gate
//! - [`workflow`]: step tables for the case wizard and the operational flow
//! - [`coordinator`]: latest-request-wins bookkeeping for async calls
//! - [`session`]: the per-user context tying these together
pub mod adjust;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod profile;
pub mod readiness;
pub mod service;
pub mod session;
pub mod workflow;

pub use catalog::{GroupFilter, TraitCatalog, TraitGroup};
pub use coordinator::{Completion, RequestCoordinator};
pub use error::{CoreError, ServiceError};
pub use profile::{ProfileKey, ProfileMethodology, ProfileMode, ProfileSet};
pub use readiness::{GateVerdict, ReadinessGate, ReadinessReport};
pub use session::{CaseSession, SessionEvent};
