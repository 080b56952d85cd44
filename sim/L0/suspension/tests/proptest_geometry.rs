//! Property-based tests for geometry normalization and stroke bounds.
//!
//! Run with: cargo test -p sim-suspension -- proptest

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use proptest::prelude::*;
use sim_suspension::{
    CylinderKinematics, GeometryParameter, GeometryState, GeometryUpdate, KinematicsProvider,
};

// =============================================================================
// Strategies
// =============================================================================

fn arb_parameter() -> impl Strategy<Value = GeometryParameter> {
    (0..GeometryParameter::ALL.len()).prop_map(|i| GeometryParameter::ALL[i])
}

fn arb_request() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -1.0..25.0f64,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
    ]
}

/// A geometry reached through a random sequence of updates.
fn arb_geometry() -> impl Strategy<Value = GeometryState> {
    prop::collection::vec((arb_parameter(), arb_request()), 0..8).prop_map(|edits| {
        let mut geometry = GeometryState::default();
        for (parameter, value) in edits {
            geometry.set_parameter(parameter, value);
        }
        geometry
    })
}

// =============================================================================
// Invariants
// =============================================================================

proptest! {
    #[test]
    fn proptest_normalize_is_idempotent(
        geometry in arb_geometry(),
        parameter in arb_parameter(),
        request in arb_request(),
    ) {
        let (once, _) = geometry.normalize_parameter(parameter, request);
        let (twice, corrections) = geometry.normalize_parameter(parameter, once);
        prop_assert_eq!(once, twice);
        prop_assert!(corrections.is_empty());
    }

    #[test]
    fn proptest_normalized_values_are_finite_and_physical(
        geometry in arb_geometry(),
        parameter in arb_parameter(),
        request in arb_request(),
    ) {
        let (value, _) = geometry.normalize_parameter(parameter, request);
        let (lo, hi) = parameter.physical_range();
        prop_assert!(value.is_finite());
        prop_assert!(value >= lo && value <= hi);
    }

    #[test]
    fn proptest_stroke_bounds_ordered(
        body in 0.05..3.0f64,
        piston in 0.002..0.2f64,
        dead_rod in 0.0..0.5f64,
        dead_head in 0.0..0.5f64,
    ) {
        match CylinderKinematics::stroke_bounds(body, piston, dead_rod, dead_head) {
            Ok(bounds) => {
                prop_assert!(bounds.min <= bounds.max);
                prop_assert_eq!(bounds.min, dead_rod);
            }
            Err(err) => {
                prop_assert!(err.is_degenerate());
                prop_assert!(body < piston + dead_rod + dead_head);
            }
        }
    }

    #[test]
    fn proptest_effective_range_inside_cylinder(geometry in arb_geometry()) {
        if let Ok(bounds) = geometry.stroke_bounds() {
            let range = geometry.effective_stroke_range().unwrap();
            prop_assert!(range.min <= range.max);
            prop_assert!(range.max <= bounds.max + 1e-12);
            prop_assert!(range.max >= bounds.min);
        }
    }

    #[test]
    fn proptest_applied_update_validates_cleanly_when_reachable(
        stroke in 0.01..0.2f64,
    ) {
        let update = GeometryUpdate::new().with(GeometryParameter::Stroke, stroke);
        let (geometry, corrections) = GeometryState::from_update(&update);
        prop_assert!(corrections.is_empty());
        prop_assert!(geometry.report().valid);

        let kinematics = geometry.kinematics().unwrap();
        let (lo, hi) = kinematics.angle_range();
        prop_assert!(lo < hi);
    }
}
