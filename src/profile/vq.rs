//! Legacy vocational-quotient estimate for a profile vector.
//!
//! Linear model recovered from the legacy database: an intercept plus one
//! weight per standard-catalog trait. Traits past the 24th carry no weight.
use crate::catalog::TraitCatalog;
use serde::Serialize;

const VQ_INTERCEPT: f64 = 34.56707;

const VQ_WEIGHTS: [f64; 24] = [
    5.299567, 2.213121, 1.424168, 2.241977, 1.783972, 1.95779, 1.648707, 1.631036, 2.126616,
    1.403101, 1.431217, 1.84953, 0.774892, -0.165864, 0.776669, 4.542681, 0.201044, 1.470938,
    0.330026, 0.504727, 0.371165, 1.217675, -0.200072, 0.298293,
];

/// Method tag reported alongside estimates.
pub const VQ_METHOD: &str = "legacy_profile_vq_formula_v1";

/// VQ estimate for each of the four vectors.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct VqEstimates {
    pub profile1: f64,
    pub profile2: f64,
    pub profile3: f64,
    pub profile4: f64,
}

/// Estimate VQ for `vector` after clamping it to catalog bounds; rounded to 4 places.
pub fn vq_estimate(catalog: &TraitCatalog, vector: &[i32]) -> f64 {
    let score = catalog
        .clamp_vector(vector)
        .iter()
        .enumerate()
        .fold(VQ_INTERCEPT, |acc, (index, value)| {
            acc + f64::from(*value) * VQ_WEIGHTS.get(index).copied().unwrap_or(0.0)
        });
    (score * 10_000.0).round() / 10_000.0
}
