//! Scale estimation and normalization integration tests.
//!
//! Verifies the properties the rest of the pipeline relies on:
//! - the extent does not depend on how positions are batched or ordered
//! - keep-ratio scaling uses one factor for both axes
//! - normalize followed by denormalize is the identity
//! - every accumulated position lands in the unit square

use ndarray::{array, Array2, Array3};
use proptest::prelude::*;
use trajectory_extractor::{BoundingExtent, ScaleEstimator, SpatialAxis, TrajectoryError};

fn positions(points: &[(f64, f64)]) -> Array2<f64> {
    let flat: Vec<f64> = points.iter().flat_map(|&(x, y)| [x, y]).collect();
    Array2::from_shape_vec((points.len(), 2), flat).unwrap()
}

fn coordinate() -> impl Strategy<Value = f64> {
    -1.0e4..1.0e4
}

fn point_cloud() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((coordinate(), coordinate()), 2..64).prop_filter(
        "extent must span both axes",
        |pts| {
            let spans = |f: fn(&(f64, f64)) -> f64| {
                let (lo, hi) = pts
                    .iter()
                    .map(f)
                    .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
                hi - lo > 1e-6
            };
            spans(|p| p.0) && spans(|p| p.1)
        },
    )
}

#[test]
fn test_rectangle_scene() {
    let mut estimator = ScaleEstimator::new();
    estimator
        .accumulate(&array![[0.0, 0.0], [10.0, 5.0]])
        .unwrap();
    let scale = estimator.finalize(true).unwrap();

    assert_eq!(scale.factors().sx, 0.1);
    assert_eq!(scale.factors().sy, 0.1);

    let out = scale.normalize(&array![[10.0, 5.0]], true).unwrap();
    assert!((out[[0, 0]] - 1.0).abs() < 1e-12);
    assert!((out[[0, 1]] - 0.5).abs() < 1e-12);
}

#[test]
fn test_independent_axes() {
    let mut estimator = ScaleEstimator::new();
    estimator
        .accumulate(&array![[0.0, 0.0], [10.0, 5.0]])
        .unwrap();
    let scale = estimator.finalize(false).unwrap();

    let out = scale.normalize(&array![[10.0, 5.0]], true).unwrap();
    assert!((out[[0, 0]] - 1.0).abs() < 1e-12);
    assert!((out[[0, 1]] - 1.0).abs() < 1e-12);
}

#[test]
fn test_batched_3d_predictions() {
    let mut estimator = ScaleEstimator::new();
    estimator
        .accumulate(&array![[-2.0, 1.0], [6.0, 3.0]])
        .unwrap();
    let scale = estimator.finalize(true).unwrap();

    // [batch × time × 2], as produced by a sequence model
    let predictions = Array3::from_shape_fn((3, 4, 2), |(b, t, c)| {
        0.1 * (b as f64) + 0.05 * (t as f64) + 0.01 * (c as f64)
    });
    let metres = scale.denormalize(&predictions, true).unwrap();
    assert_eq!(metres.shape(), &[3, 4, 2]);

    let back = scale.normalize(&metres, true).unwrap();
    for (a, b) in back.iter().zip(predictions.iter()) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn test_velocity_scaling_ignores_offset() {
    let mut estimator = ScaleEstimator::new();
    estimator
        .accumulate(&array![[100.0, 200.0], [110.0, 205.0]])
        .unwrap();
    let scale = estimator.finalize(true).unwrap();

    let v = scale.normalize(&array![[1.0, -1.0]], false).unwrap();
    assert!((v[[0, 0]] - 0.1).abs() < 1e-12);
    assert!((v[[0, 1]] + 0.1).abs() < 1e-12);
}

#[test]
fn test_degenerate_axis_rejected() {
    let mut estimator = ScaleEstimator::new();
    estimator
        .accumulate(&array![[0.0, 3.0], [4.0, 3.0]])
        .unwrap();

    match estimator.finalize(false) {
        Err(TrajectoryError::DegenerateExtent { axis, .. }) => assert_eq!(axis, SpatialAxis::Y),
        other => panic!("expected DegenerateExtent, got {other:?}"),
    }
}

#[test]
fn test_finalize_without_points() {
    assert!(matches!(
        ScaleEstimator::new().finalize(true),
        Err(TrajectoryError::EmptyExtent)
    ));
}

#[test]
fn test_in_place_matches_copy() {
    let mut estimator = ScaleEstimator::new();
    estimator.accumulate(&array![[0.0, 0.0], [8.0, 4.0]]).unwrap();
    let scale = estimator.finalize(true).unwrap();

    let original = array![[2.0, 1.0], [8.0, 4.0]];
    let copied = scale.normalize(&original, true).unwrap();

    let mut buffer = original.clone();
    scale.normalize_in_place(&mut buffer, true).unwrap();
    assert_eq!(buffer, copied);
}

proptest! {
    #[test]
    fn prop_extent_independent_of_batching(pts in point_cloud(), split in 0usize..64) {
        let split = split.min(pts.len());

        let mut whole = ScaleEstimator::new();
        whole.accumulate(&positions(&pts)).unwrap();

        let mut first = ScaleEstimator::new();
        first.accumulate_points(pts[..split].iter().copied());
        let mut second = ScaleEstimator::new();
        second.accumulate_points(pts[split..].iter().rev().copied());
        second.merge(&first);

        prop_assert_eq!(whole.extent(), second.extent());
        prop_assert_eq!(whole.point_count(), second.point_count());
    }

    #[test]
    fn prop_keep_ratio_uses_one_factor(pts in point_cloud()) {
        let mut estimator = ScaleEstimator::new();
        estimator.accumulate(&positions(&pts)).unwrap();
        let scale = estimator.finalize(true).unwrap();

        let factors = scale.factors();
        prop_assert_eq!(factors.sx, factors.sy);

        let extent = scale.extent();
        let expected = (1.0 / extent.width()).min(1.0 / extent.height());
        prop_assert!((factors.sx - expected).abs() <= 1e-12 * expected.abs().max(1.0));
    }

    #[test]
    fn prop_normalized_inside_unit_square(pts in point_cloud(), keep_ratio in any::<bool>()) {
        let data = positions(&pts);
        let mut estimator = ScaleEstimator::new();
        estimator.accumulate(&data).unwrap();
        let scale = estimator.finalize(keep_ratio).unwrap();

        let out = scale.normalize(&data, true).unwrap();
        for v in out.iter() {
            prop_assert!(*v >= -1e-9 && *v <= 1.0 + 1e-9, "value {} outside [0, 1]", v);
        }
    }

    #[test]
    fn prop_denormalize_inverts_normalize(
        pts in point_cloud(),
        probe in prop::collection::vec((coordinate(), coordinate()), 1..16),
        keep_ratio in any::<bool>(),
        shift in any::<bool>(),
    ) {
        let mut estimator = ScaleEstimator::new();
        estimator.accumulate(&positions(&pts)).unwrap();
        let scale = estimator.finalize(keep_ratio).unwrap();

        let data = positions(&probe);
        let back = scale
            .denormalize(&scale.normalize(&data, shift).unwrap(), shift)
            .unwrap();
        for (a, b) in back.iter().zip(data.iter()) {
            prop_assert!((a - b).abs() <= 1e-6 * b.abs().max(1.0));
        }
    }

    #[test]
    fn prop_extent_contains_every_point(pts in point_cloud()) {
        let mut extent = BoundingExtent::empty();
        for &(x, y) in &pts {
            extent.include(x, y);
        }
        for &(x, y) in &pts {
            prop_assert!(extent.contains(x, y));
        }
    }
}
