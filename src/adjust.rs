//! Bulk adjustment operations over a profile set.
//!
//! Each operation is all-or-nothing: structural rejections (`InvalidTarget`)
//! return before anything is copied, and range violations are clamped.
use crate::catalog::{GroupFilter, TraitCatalog};
use crate::error::CoreError;
use crate::profile::{apply_rules, ProfileKey, ProfileMethodology, ProfileSet};
use serde::Serialize;

/// Lower every trait of `target` selected by `group` by `amount` levels.
///
/// Values clamp at the trait minimum. `profile1`/`profile3` are refused in
/// strict mode because they are derivation-only there.
pub fn lower(
    catalog: &TraitCatalog,
    set: &ProfileSet,
    methodology: ProfileMethodology,
    target: ProfileKey,
    amount: i32,
    group: GroupFilter,
) -> Result<ProfileSet, CoreError> {
    methodology.ensure_editable(target)?;
    let mut next = set.clone();
    let vector = next.vector_mut(target);
    for index in catalog.indices(group) {
        if let Some(value) = vector.get_mut(index) {
            *value = catalog.clamp(index, value.saturating_sub(amount));
        }
    }
    Ok(apply_rules(catalog, &next, methodology))
}

/// Copy `from` into `to` element-wise, then clamp and re-apply rules.
///
/// Operationally this is `profile3 -> profile4`: seed the residual profile
/// from the pre-injury composite before lowering it.
pub fn copy_vector(
    catalog: &TraitCatalog,
    set: &ProfileSet,
    methodology: ProfileMethodology,
    from: ProfileKey,
    to: ProfileKey,
) -> Result<ProfileSet, CoreError> {
    methodology.ensure_editable(to)?;
    let mut next = set.clone();
    let source = catalog.clamp_vector(set.vector(from));
    *next.vector_mut(to) = source;
    Ok(apply_rules(catalog, &next, methodology))
}

/// Frozen copy of a profile set taken at load/reset/save time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentBaseline {
    vectors: [Vec<i32>; 4],
}

impl AdjustmentBaseline {
    pub fn capture(set: &ProfileSet) -> Self {
        AdjustmentBaseline {
            vectors: ProfileKey::ALL.map(|key| set.vector(key).to_vec()),
        }
    }

    pub fn vector(&self, key: ProfileKey) -> &[i32] {
        match key {
            ProfileKey::Profile1 => &self.vectors[0],
            ProfileKey::Profile2 => &self.vectors[1],
            ProfileKey::Profile3 => &self.vectors[2],
            ProfileKey::Profile4 => &self.vectors[3],
        }
    }
}

/// Count trait indices where any of the four vectors differs from `baseline`.
///
/// A progress signal only; never used to gate correctness.
pub fn changed_trait_count(current: &ProfileSet, baseline: &AdjustmentBaseline) -> usize {
    let width = ProfileKey::ALL
        .iter()
        .map(|key| current.vector(*key).len().max(baseline.vector(*key).len()))
        .max()
        .unwrap_or(0);
    (0..width)
        .filter(|index| {
            ProfileKey::ALL.iter().any(|key| {
                current.vector(*key).get(*index) != baseline.vector(*key).get(*index)
            })
        })
        .count()
}

/// Which vector the adjustment controls act on.
///
/// In strict mode a focus on a derivation-only vector falls back to `profile2`.
pub fn effective_focus(requested: ProfileKey, methodology: ProfileMethodology) -> ProfileKey {
    if methodology.is_locked(requested) {
        ProfileKey::Profile2
    } else {
        requested
    }
}

/// Snapshot of adjustment progress for display layers.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct AdjustmentProgress {
    pub changed_traits: usize,
    pub focus: ProfileKey,
    pub group_filter: String,
}

#[cfg(test)]
#[path = "adjust_tests.rs"]
mod tests;
