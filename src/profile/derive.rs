//! Work-history baseline derivation.
use crate::catalog::TraitCatalog;

/// Element-wise max of two vectors, clamped to trait bounds.
pub fn max_profile(catalog: &TraitCatalog, a: &[i32], b: &[i32]) -> Vec<i32> {
    a.iter()
        .zip(b)
        .enumerate()
        .map(|(index, (left, right))| catalog.clamp(index, (*left).max(*right)))
        .collect()
}

/// Derive `profile1` from the trait vectors of a case's recorded jobs.
///
/// Each trait takes the highest demand seen across jobs (starting from the
/// trait minimum). Vectors of the wrong length are skipped; with no usable
/// job the catalog default profile is returned.
pub fn derive_profile1(catalog: &TraitCatalog, job_vectors: &[Vec<i32>]) -> Vec<i32> {
    let usable: Vec<&Vec<i32>> = job_vectors
        .iter()
        .filter(|vector| vector.len() == catalog.len())
        .collect();
    if usable.is_empty() {
        return catalog.default_profile().to_vec();
    }
    catalog
        .traits()
        .iter()
        .enumerate()
        .map(|(index, t)| {
            let peak = usable
                .iter()
                .map(|vector| vector[index])
                .fold(t.min, i32::max);
            t.clamp(peak)
        })
        .collect()
}

/// Parse a stored job trait vector.
///
/// Accepts a digit string with one digit per trait (`"322232..."`) or
/// separator-delimited integers (`"3, 2, 2 ..."`). Returns `None` when the
/// result does not have one value per trait.
pub fn parse_trait_vector(catalog: &TraitCatalog, text: &str) -> Option<Vec<i32>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.len() == catalog.len() && text.bytes().all(|b| b.is_ascii_digit()) {
        return Some(text.bytes().map(|b| i32::from(b - b'0')).collect());
    }
    let values: Vec<i32> = text
        .split(|ch: char| ch.is_whitespace() || ch == ',' || ch == ';')
        .filter(|token| !token.is_empty())
        .map(str::parse::<i32>)
        .collect::<Result<_, _>>()
        .ok()?;
    (values.len() == catalog.len()).then_some(values)
}
