//! Trait catalog: the ordered list of scored worker-trait dimensions.
//!
//! The catalog is supplied externally (see [`crate::service::CatalogService`])
//! and is immutable once built. Every profile vector is indexed by catalog
//! position, and a trait's group is a pure function of that position.
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse trait families used for filtering and bulk adjustments.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TraitGroup {
    Ged,
    Apt,
    Pd,
    Ec,
}

impl TraitGroup {
    pub const ALL: [TraitGroup; 4] = [TraitGroup::Ged, TraitGroup::Apt, TraitGroup::Pd, TraitGroup::Ec];

    /// Group for a catalog index: 0-2 GED, 3-10 aptitudes, 11-16 physical, 17+ environmental.
    pub fn for_index(index: usize) -> TraitGroup {
        match index {
            0..=2 => TraitGroup::Ged,
            3..=10 => TraitGroup::Apt,
            11..=16 => TraitGroup::Pd,
            _ => TraitGroup::Ec,
        }
    }

    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            TraitGroup::Ged => "ged",
            TraitGroup::Apt => "apt",
            TraitGroup::Pd => "pd",
            TraitGroup::Ec => "ec",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TraitGroup::Ged => "GED",
            TraitGroup::Apt => "Aptitudes",
            TraitGroup::Pd => "Physical",
            TraitGroup::Ec => "Environmental",
        }
    }
}

impl fmt::Display for TraitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope for group-restricted views and adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupFilter {
    #[default]
    All,
    Only(TraitGroup),
}

impl GroupFilter {
    pub fn matches(&self, group: TraitGroup) -> bool {
        match self {
            GroupFilter::All => true,
            GroupFilter::Only(only) => *only == group,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupFilter::All => "all",
            GroupFilter::Only(group) => group.as_str(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GroupFilter::All => "All",
            GroupFilter::Only(group) => group.label(),
        }
    }
}

impl fmt::Display for GroupFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(GroupFilter::All),
            "ged" => Ok(GroupFilter::Only(TraitGroup::Ged)),
            "apt" => Ok(GroupFilter::Only(TraitGroup::Apt)),
            "pd" => Ok(GroupFilter::Only(TraitGroup::Pd)),
            "ec" => Ok(GroupFilter::Only(TraitGroup::Ec)),
            other => Err(format!(
                "unknown trait group {other:?} (expected all, ged, apt, pd, or ec)"
            )),
        }
    }
}

/// Trait definition as delivered by the catalog service (group is positional).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TraitSpec {
    pub code: String,
    pub label: String,
    pub min: i32,
    pub max: i32,
}

/// One catalog entry with its derived group.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct TraitDef {
    pub code: String,
    pub label: String,
    pub group: TraitGroup,
    pub min: i32,
    pub max: i32,
}

impl TraitDef {
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }
}

/// Ordered, validated trait catalog plus the default profile used as a
/// parse fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitCatalog {
    traits: Vec<TraitDef>,
    default_profile: Vec<i32>,
}

impl TraitCatalog {
    /// Build a catalog from service-shaped specs.
    ///
    /// `default_profile` may be empty (trait minimums are used instead);
    /// otherwise it must have one value per trait.
    pub fn new(specs: Vec<TraitSpec>, default_profile: Vec<i32>) -> Result<Self, CoreError> {
        if !default_profile.is_empty() && default_profile.len() != specs.len() {
            return Err(CoreError::ShapeMismatch {
                vector: "default_profile",
                expected: specs.len(),
                found: default_profile.len(),
            });
        }
        let mut traits = Vec::with_capacity(specs.len());
        for (index, spec) in specs.into_iter().enumerate() {
            if spec.min > spec.max {
                return Err(CoreError::InvalidTraitBounds {
                    code: spec.code,
                    min: spec.min,
                    max: spec.max,
                });
            }
            traits.push(TraitDef {
                code: spec.code,
                label: spec.label,
                group: TraitGroup::for_index(index),
                min: spec.min,
                max: spec.max,
            });
        }
        let default_profile = if default_profile.is_empty() {
            traits.iter().map(|t| t.min).collect()
        } else {
            traits
                .iter()
                .zip(default_profile)
                .map(|(t, value)| t.clamp(value))
                .collect()
        };
        Ok(TraitCatalog {
            traits,
            default_profile,
        })
    }

    /// The 24-trait catalog shipped with the reference dataset.
    pub fn standard() -> Self {
        let traits = STANDARD_TRAITS
            .iter()
            .enumerate()
            .map(|(index, (code, label, min, max))| TraitDef {
                code: (*code).to_string(),
                label: (*label).to_string(),
                group: TraitGroup::for_index(index),
                min: *min,
                max: *max,
            })
            .collect();
        TraitCatalog {
            traits,
            default_profile: STANDARD_DEFAULT_PROFILE.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    pub fn traits(&self) -> &[TraitDef] {
        &self.traits
    }

    pub fn get(&self, index: usize) -> Option<&TraitDef> {
        self.traits.get(index)
    }

    pub fn default_profile(&self) -> &[i32] {
        &self.default_profile
    }

    /// Catalog indices selected by `filter`, in catalog order.
    pub fn indices(&self, filter: GroupFilter) -> Vec<usize> {
        self.traits
            .iter()
            .enumerate()
            .filter(|(_, t)| filter.matches(t.group))
            .map(|(index, _)| index)
            .collect()
    }

    /// Clamp `value` into the bounds of trait `index`.
    ///
    /// Indices past the catalog are returned unchanged; callers validate shape first.
    pub fn clamp(&self, index: usize, value: i32) -> i32 {
        match self.traits.get(index) {
            Some(t) => t.clamp(value),
            None => value,
        }
    }

    /// Clamp every element of `vector` into its trait's bounds.
    pub fn clamp_vector(&self, vector: &[i32]) -> Vec<i32> {
        vector
            .iter()
            .enumerate()
            .map(|(index, value)| self.clamp(index, *value))
            .collect()
    }
}

/// Coerce a loosely-typed form or wire value into a bounded trait level.
///
/// Integers and numeric strings are truncated toward zero (leading-integer
/// semantics, so `"4.7"` and `"4 levels"` both read as 4) and clamped to
/// `[min, max]`. Anything unparsable yields `fallback` (normally the default
/// profile value), else `min`; the fallback is clamped as well.
pub fn parse_bounded_int(raw: &serde_json::Value, fallback: Option<i32>, min: i32, max: i32) -> i32 {
    let parsed = match raw {
        serde_json::Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.is_finite())
                .map(|value| value.trunc() as i64)
        }),
        serde_json::Value::String(text) => parse_leading_int(text),
        _ => None,
    };
    match parsed {
        Some(value) => value.clamp(i64::from(min), i64::from(max)) as i32,
        None => fallback.unwrap_or(min).clamp(min, max),
    }
}

fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map(|(pos, _)| pos)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Saturate oversized literals; they clamp to the trait bound anyway.
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

const STANDARD_TRAITS: [(&str, &str, i32, i32); 24] = [
    ("GEDR", "Reasoning", 1, 6),
    ("GEDM", "Math", 1, 6),
    ("GEDL", "Language", 1, 6),
    ("APTS", "Spatial Perception", 1, 5),
    ("APTP", "Form Perception", 1, 5),
    ("APTQ", "Clerical Perception", 1, 5),
    ("APTK", "Motor Coordination", 1, 5),
    ("APTF", "Finger Dexterity", 1, 5),
    ("APTM", "Manual Dexterity", 1, 5),
    ("APTE", "Eye-Hand-Foot", 1, 5),
    ("APTC", "Color Discrimination", 1, 5),
    ("PD1", "Strength", 1, 5),
    ("PD2", "Climb/Balance", 0, 1),
    ("PD3", "Stoop/Kneel/Crouch", 0, 1),
    ("PD4", "Reach/Handle/Finger/Feel", 0, 1),
    ("PD5", "Talk/Hear", 0, 1),
    ("PD6", "See", 0, 1),
    ("EC1", "Weather Exposure", 1, 3),
    ("EC2", "Extreme Cold", 0, 1),
    ("EC3", "Extreme Heat", 0, 1),
    ("EC4", "Damp/Wet/Humid", 0, 1),
    ("EC5", "Noise/Vibration", 0, 1),
    ("EC6", "Hazards", 0, 1),
    ("EC7", "Dust/Fumes/Odors", 0, 1),
];

const STANDARD_DEFAULT_PROFILE: [i32; 24] = [
    3, 2, 2, 2, 3, 2, 3, 2, 3, 2, 2, 2, 0, 0, 1, 0, 1, 2, 0, 0, 0, 1, 0, 0,
];

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
