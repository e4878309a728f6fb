//! Property-based tests for the profile rules and bulk adjustments.
//!
//! Runs against the standard 24-trait catalog with raw inputs well outside
//! every trait's bounds.

use casework_core::adjust::{self, AdjustmentBaseline};
use casework_core::profile::{self, RawProfileSet};
use casework_core::{
    GroupFilter, ProfileKey, ProfileMethodology, ProfileMode, ProfileSet, TraitCatalog,
    TraitGroup,
};
use proptest::prelude::*;
use serde_json::json;

const TRAITS: usize = 24;

fn raw_vector() -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::vec(-10i64..20, TRAITS)
}

fn methodology() -> impl Strategy<Value = ProfileMethodology> {
    (any::<bool>(), any::<bool>()).prop_map(|(strict, cap)| ProfileMethodology {
        mode: if strict {
            ProfileMode::StrictDerived
        } else {
            ProfileMode::ClinicalOverride
        },
        enforce_residual_cap: cap,
    })
}

fn group_filter() -> impl Strategy<Value = GroupFilter> {
    prop_oneof![
        Just(GroupFilter::All),
        Just(GroupFilter::Only(TraitGroup::Ged)),
        Just(GroupFilter::Only(TraitGroup::Apt)),
        Just(GroupFilter::Only(TraitGroup::Pd)),
        Just(GroupFilter::Only(TraitGroup::Ec)),
    ]
}

fn raw_set(vectors: [Vec<i64>; 4]) -> RawProfileSet {
    let [p1, p2, p3, p4] = vectors.map(|v| v.into_iter().map(|x| json!(x)).collect::<Vec<_>>());
    RawProfileSet {
        profile1: p1,
        profile2: p2,
        profile3: p3,
        profile4: p4,
        derived_profile1: None,
    }
}

fn load(vectors: [Vec<i64>; 4], methodology: ProfileMethodology) -> (TraitCatalog, ProfileSet) {
    let catalog = TraitCatalog::standard();
    let set = profile::load(&catalog, &raw_set(vectors), methodology).expect("well-shaped input");
    (catalog, set)
}

fn assert_invariants(
    catalog: &TraitCatalog,
    set: &ProfileSet,
    methodology: ProfileMethodology,
) -> Result<(), TestCaseError> {
    for key in ProfileKey::ALL {
        for (index, value) in set.vector(key).iter().enumerate() {
            let def = &catalog.traits()[index];
            prop_assert!(
                (def.min..=def.max).contains(value),
                "{} trait {} = {} outside [{}, {}]",
                key,
                def.code,
                value,
                def.min,
                def.max
            );
        }
    }
    if methodology.is_strict() {
        for index in 0..set.len() {
            prop_assert_eq!(
                set.vector(ProfileKey::Profile3)[index],
                set.vector(ProfileKey::Profile1)[index].max(set.vector(ProfileKey::Profile2)[index])
            );
        }
        prop_assert_eq!(set.vector(ProfileKey::Profile1), set.derived_profile1());
    }
    if methodology.enforce_residual_cap {
        for index in 0..set.len() {
            prop_assert!(
                set.vector(ProfileKey::Profile4)[index] <= set.vector(ProfileKey::Profile3)[index]
            );
        }
    }
    Ok(())
}

proptest! {
    /// Loaded sets satisfy every rule of their methodology.
    #[test]
    fn prop_load_establishes_invariants(
        p1 in raw_vector(),
        p2 in raw_vector(),
        p3 in raw_vector(),
        p4 in raw_vector(),
        methodology in methodology(),
    ) {
        let (catalog, set) = load([p1, p2, p3, p4], methodology);
        assert_invariants(&catalog, &set, methodology)?;
    }

    /// Re-applying the rules to a conforming set changes nothing.
    #[test]
    fn prop_apply_rules_is_idempotent(
        p1 in raw_vector(),
        p2 in raw_vector(),
        p3 in raw_vector(),
        p4 in raw_vector(),
        methodology in methodology(),
    ) {
        let (catalog, set) = load([p1, p2, p3, p4], methodology);
        prop_assert_eq!(profile::apply_rules(&catalog, &set, methodology), set);
    }

    /// Lowering touches only the filtered traits and floors at the minimum.
    #[test]
    fn prop_lower_is_floored_and_scoped(
        p1 in raw_vector(),
        p2 in raw_vector(),
        p4 in raw_vector(),
        amount in 0i32..7,
        group in group_filter(),
        methodology in methodology(),
    ) {
        let (catalog, set) = load([p1, p2.clone(), p2, p4], methodology);
        let next = adjust::lower(&catalog, &set, methodology, ProfileKey::Profile4, amount, group)
            .expect("profile4 is always editable");
        assert_invariants(&catalog, &next, methodology)?;
        let selected = catalog.indices(group);
        for (index, def) in catalog.traits().iter().enumerate() {
            let before = set.vector(ProfileKey::Profile4)[index];
            let after = next.vector(ProfileKey::Profile4)[index];
            if selected.contains(&index) {
                prop_assert_eq!(after, (before - amount).max(def.min));
            } else {
                prop_assert_eq!(after, before);
            }
        }
    }

    /// Strict mode refuses derivation-only targets and leaves the set alone.
    #[test]
    fn prop_strict_rejects_derived_targets(
        p1 in raw_vector(),
        p2 in raw_vector(),
        amount in 0i32..7,
        group in group_filter(),
    ) {
        let methodology = ProfileMethodology::default();
        let (catalog, set) = load([p1, p2.clone(), p2.clone(), p2], methodology);
        for target in [ProfileKey::Profile1, ProfileKey::Profile3] {
            prop_assert!(adjust::lower(&catalog, &set, methodology, target, amount, group).is_err());
            prop_assert!(adjust::copy_vector(&catalog, &set, methodology, ProfileKey::Profile2, target).is_err());
        }
    }

    /// With a residual baseline equal to the composite, copy-then-lower
    /// changes exactly the selected traits that sit above their minimum.
    #[test]
    fn prop_copy_then_lower_counts_movable_traits(
        p1 in raw_vector(),
        p2 in raw_vector(),
        amount in 1i32..7,
        group in group_filter(),
    ) {
        let methodology = ProfileMethodology::default();
        // profile4 above every maximum is capped down to profile3.
        let (catalog, set) = load([p1, p2.clone(), p2, vec![99; TRAITS]], methodology);
        let baseline = AdjustmentBaseline::capture(&set);
        let copied = adjust::copy_vector(&catalog, &set, methodology, ProfileKey::Profile3, ProfileKey::Profile4)
            .expect("copy");
        prop_assert_eq!(adjust::changed_trait_count(&copied, &baseline), 0);

        let lowered = adjust::lower(&catalog, &copied, methodology, ProfileKey::Profile4, amount, group)
            .expect("lower");
        let expected = catalog
            .indices(group)
            .into_iter()
            .filter(|index| set.vector(ProfileKey::Profile3)[*index] > catalog.traits()[*index].min)
            .count();
        prop_assert_eq!(adjust::changed_trait_count(&lowered, &baseline), expected);
    }
}

#[test]
fn short_vectors_are_rejected_not_padded() {
    let catalog = TraitCatalog::standard();
    let mut raw = raw_set([vec![1; TRAITS], vec![1; TRAITS], vec![1; TRAITS], vec![1; TRAITS]]);
    raw.profile2.pop();
    assert!(profile::load(&catalog, &raw, ProfileMethodology::default()).is_err());
}
