//! Contour engine properties
//!
//! Tests include:
//! - Exact-match, threshold, ordering, mirroring and shape contracts
//! - Input rejection
//! - Property-based tests with proptest

use equal_loudness::contour::{
    Column, ContourEngine, ContourRequest, Edition, Squeezed, MIRROR_ANCHOR_HZ,
};
use equal_loudness::volume::{CalibrationPoint, VolumeMapper};
use equal_loudness::ContourError;
use proptest::prelude::*;

const TOLERANCE: f64 = 1e-9;

fn engine() -> ContourEngine {
    ContourEngine::for_edition(Edition::Iso2023).unwrap()
}

// ========== Contracts ==========

#[test]
fn table_frequencies_match_the_fast_path() {
    let e = engine();
    let phons = [0.0, 10.0, 40.0, 60.0, 80.0, 100.0];
    let fast = e.evaluate(&ContourRequest::new(phons)).unwrap();
    let interpolated = e
        .evaluate(&ContourRequest::new(phons).at_frequencies(e.table().frequencies()))
        .unwrap();

    assert_eq!(fast.spl.shape(), interpolated.spl.shape());
    for (a, b) in fast.spl.as_slice().iter().zip(interpolated.spl.as_slice()) {
        assert!((a - b).abs() < TOLERANCE, "fast={a} interpolated={b}");
    }
}

#[test]
fn zero_phon_is_the_threshold_curve() {
    let e = engine();
    let at_table = e.evaluate(&ContourRequest::new([0.0])).unwrap();
    assert_eq!(
        at_table.spl.column(0).unwrap(),
        e.table().column(Column::Threshold)
    );

    for f in [30.0, 700.0, 3000.0, 11_000.0] {
        let spl = e.spl(0.0, f).unwrap();
        let threshold = e.coefficients_at(f, 0).unwrap().threshold;
        assert_eq!(spl, threshold);
    }
}

#[test]
fn frequency_grid_keeps_query_order() {
    let e = engine();
    let query = vec![8000.0, 50.0, 16_000.0, 1000.0, 50.0];
    let c = e
        .evaluate(&ContourRequest::new([30.0, 70.0]).at_frequencies(query.clone()))
        .unwrap();
    assert_eq!(c.frequency_axis(), query);
    for (r, &f) in query.iter().enumerate() {
        assert_eq!(c.frequencies.row(r).unwrap(), &[f, f]);
    }
}

#[test]
fn mirror_anchor_is_hit_exactly_at_20_khz() {
    let e = engine();
    for mirror in [0, 5, 28] {
        let row = e.table().row(mirror).unwrap();
        let at_anchor = e.coefficients_at(MIRROR_ANCHOR_HZ, mirror).unwrap();
        assert!((at_anchor.alpha - row.alpha).abs() < TOLERANCE);
        assert!((at_anchor.transfer - row.transfer).abs() < TOLERANCE);
        assert!((at_anchor.threshold - row.threshold).abs() < TOLERANCE);
    }
}

#[test]
fn mirrored_coefficients_approach_the_20_hz_row() {
    let e = engine();
    let target = e.table().row(0).unwrap();
    let distance = |f: f64| {
        let c = e.coefficients_at(f, 0).unwrap();
        (c.threshold - target.threshold).abs() + (c.transfer - target.transfer).abs()
    };
    assert!(distance(19_000.0) < distance(16_000.0));
    assert!(distance(19_900.0) < distance(19_000.0));
}

#[test]
fn negative_frequency_is_rejected() {
    let e = engine();
    let err = e
        .evaluate(&ContourRequest::new([40.0]).at_frequencies([-1.0]))
        .unwrap_err();
    assert_eq!(
        err,
        ContourError::InvalidFrequency {
            index: 0,
            value: -1.0
        }
    );
}

#[test]
fn calibration_point_is_a_fixed_point_of_the_mapper() {
    let c = CalibrationPoint::default();
    let v = VolumeMapper::new(c).spl_to_volume(c.spl_at_gain);
    assert!((v - c.gain / c.reference_rms).abs() < TOLERANCE);
}

#[test]
fn three_by_three_shape() {
    let e = engine();
    let c = e
        .evaluate(
            &ContourRequest::new([40.0, 60.0, 80.0]).at_frequencies([100.0, 1000.0, 10_000.0]),
        )
        .unwrap();
    assert_eq!(c.spl.shape(), (3, 3));
    assert_eq!(c.frequencies.shape(), (3, 3));
    assert_eq!(c.frequencies.row(0).unwrap(), &[100.0; 3]);
    assert_eq!(c.frequencies.row(2).unwrap(), &[10_000.0; 3]);
    assert!(c.warnings.is_empty());
}

#[test]
fn single_point_squeezes_to_a_scalar() {
    let e = engine();
    let c = e
        .evaluate(&ContourRequest::new([60.0]).at_frequencies([1000.0]))
        .unwrap();
    let (spl, freq) = c.squeezed();
    assert!(matches!(spl, Squeezed::Scalar(_)));
    assert_eq!(freq, Squeezed::Scalar(1000.0));
}

#[test]
fn warnings_do_not_change_values() {
    let e = engine();
    let loud = e
        .evaluate(&ContourRequest::new([95.0]).at_frequencies([1000.0]))
        .unwrap();
    assert!(!loud.warnings.is_empty());
    assert_eq!(loud.spl.get(0, 0), Some(e.spl(95.0, 1000.0).unwrap()));
}

// ========== Property-Based Tests ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Louder levels always need more pressure at a fixed frequency
    #[test]
    fn spl_grows_with_phon(
        f in 20.0_f64..12_500.0,
        p in 20.0_f64..90.0,
        step in 1.0_f64..10.0,
    ) {
        let e = engine();
        let quiet = e.spl(p, f).unwrap();
        let loud = e.spl(p + step, f).unwrap();
        prop_assert!(loud > quiet, "f={} p={} quiet={} loud={}", f, p, quiet, loud);
    }

    /// Output shape and frequency pairing hold for arbitrary queries
    #[test]
    fn shape_matches_query(
        freqs in prop::collection::vec(0.0_f64..24_000.0, 1..20),
        phons in prop::collection::vec(0.0_f64..100.0, 1..5),
    ) {
        let e = engine();
        let c = e
            .evaluate(&ContourRequest::new(phons.clone()).at_frequencies(freqs.clone()))
            .unwrap();
        prop_assert_eq!(c.spl.shape(), (freqs.len(), phons.len()));
        prop_assert_eq!(c.frequency_axis(), freqs);
        prop_assert_eq!(c.phons, phons);
    }

    /// Evaluation is a pure function of its inputs
    #[test]
    fn evaluation_is_deterministic(
        freqs in prop::collection::vec(20.0_f64..20_000.0, 1..10),
        p in 0.0_f64..100.0,
        mirror in 0_usize..29,
    ) {
        let e = engine();
        let request = ContourRequest::new([p]).at_frequencies(freqs).mirror(mirror);
        let fresh = ContourEngine::for_edition(Edition::Iso2023).unwrap();
        let a = e.evaluate(&request).unwrap();
        let b = fresh.evaluate(&request).unwrap();
        // Compare bit patterns so NaN cells (levels the model cannot reach) still count as equal.
        let bits = |g: &[f64]| g.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(a.spl.as_slice()), bits(b.spl.as_slice()));
        prop_assert_eq!(a.warnings, b.warnings);
    }

    /// Any negative frequency anywhere in the query aborts the call
    #[test]
    fn any_negative_frequency_fails(
        mut freqs in prop::collection::vec(0.0_f64..20_000.0, 0..10),
        bad in -20_000.0_f64..-1e-9,
        pos in 0_usize..10,
    ) {
        let idx = pos.min(freqs.len());
        freqs.insert(idx, bad);
        let err = engine()
            .evaluate(&ContourRequest::new([40.0]).at_frequencies(freqs))
            .unwrap_err();
        prop_assert_eq!(err, ContourError::InvalidFrequency { index: idx, value: bad });
    }
}
