//! Four-vector worker-trait profile model.
//!
//! A case carries four trait vectors:
//!
//! ```text
//! profile1  work-history baseline    derived (editable only in clinical_override)
//! profile2  evaluative clinical      always editable
//! profile3  pre-injury composite     max(profile1, profile2) in strict_derived
//! profile4  post-injury residual     always editable, optionally capped by profile3
//! ```
//!
//! Every operation here is pure: it takes the current set by reference and
//! returns a new one, so a rejected operation leaves the caller's state as it
//! was. [`apply_rules`] re-establishes the invariants and must run after any
//! field change; it is idempotent.
use crate::catalog::{parse_bounded_int, TraitCatalog};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod derive;
pub mod vq;

pub use derive::{derive_profile1, max_profile, parse_trait_vector};
pub use vq::{vq_estimate, VqEstimates};

/// Names one of the four profile vectors.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKey {
    Profile1,
    Profile2,
    Profile3,
    Profile4,
}

impl ProfileKey {
    pub const ALL: [ProfileKey; 4] = [
        ProfileKey::Profile1,
        ProfileKey::Profile2,
        ProfileKey::Profile3,
        ProfileKey::Profile4,
    ];

    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKey::Profile1 => "profile1",
            ProfileKey::Profile2 => "profile2",
            ProfileKey::Profile3 => "profile3",
            ProfileKey::Profile4 => "profile4",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProfileKey::Profile1 => "Profile 1 (Work History Baseline)",
            ProfileKey::Profile2 => "Profile 2 (Evaluative)",
            ProfileKey::Profile3 => "Profile 3 (Pre-Injury Composite)",
            ProfileKey::Profile4 => "Profile 4 (Post-Injury Residual)",
        }
    }

    /// Vectors that strict_derived mode computes rather than accepts as input.
    pub fn is_derivation_only(&self) -> bool {
        matches!(self, ProfileKey::Profile1 | ProfileKey::Profile3)
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "profile1" | "p1" | "1" => Ok(ProfileKey::Profile1),
            "profile2" | "p2" | "2" => Ok(ProfileKey::Profile2),
            "profile3" | "p3" | "3" => Ok(ProfileKey::Profile3),
            "profile4" | "p4" | "4" => Ok(ProfileKey::Profile4),
            other => Err(format!("unknown profile {other:?} (expected profile1..profile4)")),
        }
    }
}

/// Methodology governing which vectors are derived.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMode {
    #[default]
    StrictDerived,
    ClinicalOverride,
}

impl ProfileMode {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileMode::StrictDerived => "strict_derived",
            ProfileMode::ClinicalOverride => "clinical_override",
        }
    }
}

impl fmt::Display for ProfileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "strict_derived" | "strict" => Ok(ProfileMode::StrictDerived),
            "clinical_override" | "override" => Ok(ProfileMode::ClinicalOverride),
            other => Err(format!(
                "unknown profile mode {other:?} (expected strict_derived or clinical_override)"
            )),
        }
    }
}

/// Mode plus the residual guardrail flag; loaded with a case and persisted on save.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct ProfileMethodology {
    pub mode: ProfileMode,
    pub enforce_residual_cap: bool,
}

impl Default for ProfileMethodology {
    fn default() -> Self {
        ProfileMethodology {
            mode: ProfileMode::StrictDerived,
            enforce_residual_cap: true,
        }
    }
}

impl ProfileMethodology {
    pub fn is_strict(&self) -> bool {
        self.mode == ProfileMode::StrictDerived
    }

    /// Whether `key` is read-only for direct edits under this methodology.
    pub fn is_locked(&self, key: ProfileKey) -> bool {
        self.is_strict() && key.is_derivation_only()
    }

    /// Reject edits to derivation-only vectors in strict mode.
    pub fn ensure_editable(&self, key: ProfileKey) -> Result<(), CoreError> {
        if self.is_locked(key) {
            return Err(CoreError::InvalidTarget {
                target: key,
                mode: self.mode,
            });
        }
        Ok(())
    }

    pub fn lock_flags(&self) -> LockFlags {
        LockFlags {
            profile1: self.is_locked(ProfileKey::Profile1),
            profile2: self.is_locked(ProfileKey::Profile2),
            profile3: self.is_locked(ProfileKey::Profile3),
            profile4: self.is_locked(ProfileKey::Profile4),
        }
    }
}

/// Which vectors are read-only for direct edits, keyed like the service payload.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct LockFlags {
    pub profile1: bool,
    pub profile2: bool,
    pub profile3: bool,
    pub profile4: bool,
}

/// Unvalidated vectors as they arrive from a form or the case service.
///
/// Elements stay loosely typed until [`load`] coerces them.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct RawProfileSet {
    pub profile1: Vec<serde_json::Value>,
    pub profile2: Vec<serde_json::Value>,
    pub profile3: Vec<serde_json::Value>,
    pub profile4: Vec<serde_json::Value>,
    /// Machine-derived baseline snapshot; `profile1` is used when absent.
    #[serde(default)]
    pub derived_profile1: Option<Vec<serde_json::Value>>,
}

/// Validated four-vector profile set for the active case.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ProfileSet {
    profile1: Vec<i32>,
    profile2: Vec<i32>,
    profile3: Vec<i32>,
    profile4: Vec<i32>,
    derived_profile1: Vec<i32>,
}

impl ProfileSet {
    /// Build a set from already-integer vectors, validating shape and clamping.
    ///
    /// Rules are not applied; pass the result through [`apply_rules`].
    pub fn from_vectors(
        catalog: &TraitCatalog,
        vectors: [Vec<i32>; 4],
        derived_profile1: Option<Vec<i32>>,
    ) -> Result<Self, CoreError> {
        let [profile1, profile2, profile3, profile4] = vectors;
        for (key, vector) in ProfileKey::ALL
            .iter()
            .zip([&profile1, &profile2, &profile3, &profile4])
        {
            check_shape(catalog, key.as_str(), vector.len())?;
        }
        if let Some(derived) = derived_profile1.as_ref() {
            check_shape(catalog, "derived_profile1", derived.len())?;
        }
        let derived_profile1 = derived_profile1.unwrap_or_else(|| profile1.clone());
        Ok(ProfileSet {
            profile1: catalog.clamp_vector(&profile1),
            profile2: catalog.clamp_vector(&profile2),
            profile3: catalog.clamp_vector(&profile3),
            profile4: catalog.clamp_vector(&profile4),
            derived_profile1: catalog.clamp_vector(&derived_profile1),
        })
    }

    pub fn vector(&self, key: ProfileKey) -> &[i32] {
        match key {
            ProfileKey::Profile1 => &self.profile1,
            ProfileKey::Profile2 => &self.profile2,
            ProfileKey::Profile3 => &self.profile3,
            ProfileKey::Profile4 => &self.profile4,
        }
    }

    pub(crate) fn vector_mut(&mut self, key: ProfileKey) -> &mut Vec<i32> {
        match key {
            ProfileKey::Profile1 => &mut self.profile1,
            ProfileKey::Profile2 => &mut self.profile2,
            ProfileKey::Profile3 => &mut self.profile3,
            ProfileKey::Profile4 => &mut self.profile4,
        }
    }

    /// Re-derivation snapshot strict mode restores `profile1` from.
    pub fn derived_profile1(&self) -> &[i32] {
        &self.derived_profile1
    }

    /// Number of traits (length of every vector).
    pub fn len(&self) -> usize {
        self.profile1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profile1.is_empty()
    }

    pub fn value(&self, key: ProfileKey, index: usize) -> Option<i32> {
        self.vector(key).get(index).copied()
    }

    pub fn vq_estimates(&self, catalog: &TraitCatalog) -> VqEstimates {
        VqEstimates {
            profile1: vq_estimate(catalog, &self.profile1),
            profile2: vq_estimate(catalog, &self.profile2),
            profile3: vq_estimate(catalog, &self.profile3),
            profile4: vq_estimate(catalog, &self.profile4),
        }
    }
}

fn check_shape(catalog: &TraitCatalog, vector: &'static str, found: usize) -> Result<(), CoreError> {
    if found != catalog.len() {
        return Err(CoreError::ShapeMismatch {
            vector,
            expected: catalog.len(),
            found,
        });
    }
    Ok(())
}

/// Coerce raw vectors into a valid profile set and apply the methodology rules.
///
/// Every vector must have one element per catalog trait. Out-of-range
/// elements are clamped and unparsable ones fall back to the catalog default
/// profile value (else the trait minimum); neither is an error.
pub fn load(
    catalog: &TraitCatalog,
    raw: &RawProfileSet,
    methodology: ProfileMethodology,
) -> Result<ProfileSet, CoreError> {
    let profile1 = coerce_vector(catalog, "profile1", &raw.profile1)?;
    let profile2 = coerce_vector(catalog, "profile2", &raw.profile2)?;
    let profile3 = coerce_vector(catalog, "profile3", &raw.profile3)?;
    let profile4 = coerce_vector(catalog, "profile4", &raw.profile4)?;
    let derived_profile1 = match raw.derived_profile1.as_ref() {
        Some(values) => coerce_vector(catalog, "derived_profile1", values)?,
        None => profile1.clone(),
    };
    let set = ProfileSet {
        profile1,
        profile2,
        profile3,
        profile4,
        derived_profile1,
    };
    Ok(apply_rules(catalog, &set, methodology))
}

fn coerce_vector(
    catalog: &TraitCatalog,
    vector: &'static str,
    values: &[serde_json::Value],
) -> Result<Vec<i32>, CoreError> {
    check_shape(catalog, vector, values.len())?;
    let defaults = catalog.default_profile();
    Ok(catalog
        .traits()
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (t, raw))| parse_bounded_int(raw, defaults.get(index).copied(), t.min, t.max))
        .collect())
}

/// Re-establish every profile invariant for `methodology`.
///
/// - all elements clamped to their trait bounds
/// - strict: `profile1` restored from the derivation snapshot and
///   `profile3[i] = max(profile1[i], profile2[i])`
/// - residual cap: `profile4[i] <= profile3[i]`
pub fn apply_rules(
    catalog: &TraitCatalog,
    set: &ProfileSet,
    methodology: ProfileMethodology,
) -> ProfileSet {
    let derived_profile1 = catalog.clamp_vector(&set.derived_profile1);
    let profile2 = catalog.clamp_vector(&set.profile2);
    let (profile1, profile3) = if methodology.is_strict() {
        let profile1 = derived_profile1.clone();
        let profile3 = max_profile(catalog, &profile1, &profile2);
        (profile1, profile3)
    } else {
        (
            catalog.clamp_vector(&set.profile1),
            catalog.clamp_vector(&set.profile3),
        )
    };
    let mut profile4 = catalog.clamp_vector(&set.profile4);
    if methodology.enforce_residual_cap {
        for (value, ceiling) in profile4.iter_mut().zip(&profile3) {
            *value = (*value).min(*ceiling);
        }
    }
    ProfileSet {
        profile1,
        profile2,
        profile3,
        profile4,
        derived_profile1,
    }
}

/// Set one cell, clamp it, and re-apply the rules.
pub fn set_trait_value(
    catalog: &TraitCatalog,
    set: &ProfileSet,
    methodology: ProfileMethodology,
    key: ProfileKey,
    index: usize,
    value: i32,
) -> Result<ProfileSet, CoreError> {
    methodology.ensure_editable(key)?;
    if index >= set.len() {
        return Err(CoreError::TraitIndexOutOfRange {
            index,
            len: set.len(),
        });
    }
    let mut next = set.clone();
    next.vector_mut(key)[index] = catalog.clamp(index, value);
    Ok(apply_rules(catalog, &next, methodology))
}

/// Move the set to a new methodology.
///
/// Switching clinical_override -> strict_derived is lossy by contract: manual
/// edits to `profile1`/`profile3` are replaced by the derivation.
/// `profile2` and `profile4` carry over (subject to the residual cap).
pub fn switch_methodology(
    catalog: &TraitCatalog,
    set: &ProfileSet,
    from: ProfileMethodology,
    to: ProfileMethodology,
) -> ProfileSet {
    let next = apply_rules(catalog, set, to);
    if !from.is_strict() && to.is_strict() {
        let discarded = [ProfileKey::Profile1, ProfileKey::Profile3]
            .iter()
            .map(|key| {
                set.vector(*key)
                    .iter()
                    .zip(next.vector(*key))
                    .filter(|(before, after)| before != after)
                    .count()
            })
            .sum::<usize>();
        if discarded > 0 {
            tracing::info!(discarded, "strict_derived re-derivation discarded manual edits");
        }
    }
    next
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
