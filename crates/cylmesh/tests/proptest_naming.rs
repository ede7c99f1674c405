//! Property-based tests for stack naming and script generation.
//!
//! Run with: cargo test -p cylmesh -- proptest

use cylmesh::{GeoScript, LayerSpec, StackError, StackParameters, StackSpec, assign_names};
use hashbrown::HashSet;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Layer names that cannot collide with each other or with a generated
/// `_top`/`_bottom` suffix or a positional default.
fn arb_unique_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[A-Za-z][A-Za-z0-9]{0,7}", 1..=max)
        .prop_map(|set| set.into_iter().collect())
}

fn arb_thicknesses(n: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01..100.0f64, n)
}

// =============================================================================
// Naming properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_unique_names_give_distinct_groups(names in arb_unique_names(12)) {
        let layers: Vec<LayerSpec> = names.iter().map(|n| LayerSpec::new(1.0).named(n.clone())).collect();
        let physical = assign_names(&layers).unwrap();

        prop_assert_eq!(physical.volumes.len(), names.len());
        prop_assert_eq!(physical.surfaces.len(), names.len() + 1);
        prop_assert_eq!(&physical.volumes, &names);

        let all: HashSet<&String> = physical.volumes.iter().chain(physical.surfaces.iter()).collect();
        prop_assert_eq!(all.len(), 2 * names.len() + 1);
    }

    #[test]
    fn proptest_unnamed_layers_are_numbered(n in 1usize..40) {
        let physical = assign_names(&vec![LayerSpec::new(1.0); n]).unwrap();
        let expected: Vec<String> = (1..=n).map(|i| i.to_string()).collect();
        prop_assert_eq!(physical.volumes, expected);
        prop_assert_eq!(physical.surfaces[0].as_str(), "1_bottom");
        prop_assert_eq!(physical.surfaces[n].clone(), format!("{}_top", n));
    }

    #[test]
    fn proptest_repeated_name_always_collides(
        names in arb_unique_names(6),
        dup in 0usize..6,
        at in 0usize..7,
    ) {
        let mut names = names;
        let dup = names[dup % names.len()].clone();
        let at = at % (names.len() + 1);
        names.insert(at, dup);

        let layers: Vec<LayerSpec> = names.iter().map(|n| LayerSpec::new(1.0).named(n.clone())).collect();
        let is_collision = matches!(assign_names(&layers), Err(StackError::NamingCollision { .. }));
        prop_assert!(is_collision);
    }

    #[test]
    fn proptest_tags_are_dense_and_unique(n in 1usize..30) {
        let physical = assign_names(&vec![LayerSpec::new(1.0); n]).unwrap();
        let mut tags: Vec<i32> = (0..physical.surfaces.len())
            .map(|i| physical.surface_tag(i))
            .chain((0..physical.volumes.len()).map(|i| physical.volume_tag(i)))
            .collect();
        tags.sort_unstable();
        let expected: Vec<i32> = (1..=(2 * n + 1) as i32).collect();
        prop_assert_eq!(tags, expected);
    }
}

// =============================================================================
// Script properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_script_has_one_extrusion_per_layer(
        (layers, subdivided) in (1usize..10).prop_flat_map(|n| {
            (arb_thicknesses(n), prop::collection::vec(prop::option::of(1u32..8), n))
        })
    ) {
        let n = layers.len();
        let specified = subdivided.iter().filter(|s| s.is_some()).count();
        let params = StackParameters {
            subdivisions: Some(subdivided),
            ..StackParameters::new(0.5, 3.0, layers)
        };
        let spec = StackSpec::from_parameters(&params).unwrap();
        let script = GeoScript::new(&spec);
        let text = script.as_str();

        prop_assert_eq!(text.matches("Extrude {").count(), n);
        prop_assert_eq!(text.matches("Layers{").count(), specified);
        prop_assert_eq!(text.matches("Physical Surface(").count(), n + 1);
        prop_assert_eq!(text.matches("Physical Volume(").count(), n);
        prop_assert_eq!(spec.to_parameters().layers, params.layers);
    }
}
