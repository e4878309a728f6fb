//! Error taxonomy for the profile engine and its collaborators.
//!
//! Structural violations are rejected outright and leave prior state
//! untouched. Range violations never surface here: trait values are clamped.
//! A superseded request is not an error either; see
//! [`crate::coordinator::Completion::Stale`].
use crate::profile::{ProfileKey, ProfileMode};
use thiserror::Error;

/// Errors surfaced by core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An input vector does not have one value per catalog trait.
    #[error("{vector} must include {expected} values (got {found})")]
    ShapeMismatch {
        vector: &'static str,
        expected: usize,
        found: usize,
    },

    /// The target vector is derivation-only under the current methodology.
    #[error("{target} is derived in {mode} mode; switch to clinical_override to edit it")]
    InvalidTarget { target: ProfileKey, mode: ProfileMode },

    /// The readiness gate reported failure; `reason` is the gate's text verbatim.
    #[error("{reason}")]
    ReadinessBlocked { reason: String },

    /// A catalog trait declares `min > max`.
    #[error("trait {code} has min {min} greater than max {max}")]
    InvalidTraitBounds { code: String, min: i32, max: i32 },

    #[error("trait index {index} out of range for catalog of {len} traits")]
    TraitIndexOutOfRange { index: usize, len: usize },

    #[error("no case selected")]
    NoCaseSelected,

    #[error("profiles are not loaded yet")]
    ProfilesNotLoaded,

    /// Transport failure from an external collaborator, propagated unchanged.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Failures raised by external service wrappers.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("http transport: {0}")]
    Http(#[from] ureq::Error),

    /// Non-success status with the server's `error` text when present.
    #[error("{status}: {message}")]
    Status { status: u16, message: String },

    #[error("decode response: {0}")]
    Decode(String),

    /// The caller's cancel signal fired before the result was delivered.
    #[error("request cancelled")]
    Cancelled,
}

impl ServiceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ServiceError::Cancelled)
    }
}
