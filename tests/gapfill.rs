//! End-to-end checks of the seasonal gap-filler on realistic records

use chrono::NaiveDate;
use manglar::{na_seadec, DecompositionModel, InterpolationMethod, TimeSeries};

/// Ten years of a monthly NDVI-like record: slow trend, strong annual
/// cycle, small deterministic wiggle standing in for noise.
fn ndvi_like(i: usize) -> f64 {
    0.55 + 0.0008 * i as f64
        + 0.12 * (std::f64::consts::TAU * i as f64 / 12.0).sin()
        + 0.01 * (2.3 * i as f64).sin()
}

fn monthly(values: Vec<f64>) -> TimeSeries {
    TimeSeries::monthly(NaiveDate::from_ymd_opt(1996, 1, 1).unwrap(), values)
        .expect("valid monthly series")
}

#[test]
fn test_single_missing_month_lands_near_seasonal_neighbor_mean() {
    let mut values: Vec<f64> = (0..120).map(ndvi_like).collect();
    let truth = values[63];
    values[63] = f64::NAN;

    let filled = na_seadec(
        &monthly(values),
        InterpolationMethod::Linear,
        DecompositionModel::Additive,
    )
    .expect("gap fill succeeds");

    let got = filled.values()[63];
    assert!(got.is_finite(), "missing month must be filled");
    assert!(
        (got - truth).abs() < 0.02,
        "filled {} too far from truth {}",
        got,
        truth
    );

    // neighbor mean adjusted by the seasonal offset of the missing month
    let seasonal = |i: usize| 0.12 * (std::f64::consts::TAU * i as f64 / 12.0).sin();
    let neighbor_mean = (filled.values()[62] + filled.values()[64]) / 2.0;
    let expected = neighbor_mean + seasonal(63) - (seasonal(62) + seasonal(64)) / 2.0;
    assert!(
        (got - expected).abs() < 0.02,
        "filled {} should track the seasonally adjusted neighbor mean {}",
        got,
        expected
    );
}

#[test]
fn test_synthetic_holes_reproduce_withheld_values() {
    let original: Vec<f64> = (0..120).map(ndvi_like).collect();
    let holes = [7usize, 8, 23, 50, 51, 52, 90, 118];

    let mut withheld = original.clone();
    for &i in &holes {
        withheld[i] = f64::NAN;
    }

    let filled = na_seadec(
        &monthly(withheld),
        InterpolationMethod::Linear,
        DecompositionModel::Additive,
    )
    .expect("gap fill succeeds");

    for &i in &holes {
        let err = (filled.values()[i] - original[i]).abs();
        assert!(
            err < 0.03,
            "position {}: filled {} vs original {} (err {})",
            i,
            filled.values()[i],
            original[i],
            err
        );
    }
}

#[test]
fn test_filling_beats_plain_interpolation_on_seasonal_data() {
    // a hole at a seasonal peak: straight interpolation between neighbors
    // cuts the peak off, the seasonal filler should not
    let original: Vec<f64> = (0..120).map(ndvi_like).collect();
    let peak = 63; // March-ish, near the sine maximum for this phase
    let mut withheld = original.clone();
    withheld[peak] = f64::NAN;
    let series = monthly(withheld);

    let seasonal_fill = na_seadec(
        &series,
        InterpolationMethod::Linear,
        DecompositionModel::Additive,
    )
    .expect("gap fill succeeds");
    let straight_fill =
        manglar::interpolate(&series, InterpolationMethod::Linear).expect("interpolation");

    let seasonal_err = (seasonal_fill.values()[peak] - original[peak]).abs();
    let straight_err = (straight_fill.values()[peak] - original[peak]).abs();
    assert!(
        seasonal_err <= straight_err,
        "seasonal fill (err {}) should not lose to straight interpolation (err {})",
        seasonal_err,
        straight_err
    );
}

#[test]
fn test_observed_values_pass_through_bitwise() {
    let mut values: Vec<f64> = (0..96).map(ndvi_like).collect();
    values[30] = f64::NAN;
    values[31] = f64::NAN;
    let series = monthly(values.clone());

    let filled = na_seadec(
        &series,
        InterpolationMethod::Linear,
        DecompositionModel::Additive,
    )
    .expect("gap fill succeeds");

    for (i, (got, want)) in filled.values().iter().zip(values.iter()).enumerate() {
        if i != 30 && i != 31 {
            assert_eq!(got, want, "observed value at {} changed", i);
        }
    }
    assert_eq!(filled.index(), series.index());
}

#[test]
fn test_complete_record_is_returned_unchanged() {
    let series = monthly((0..120).map(ndvi_like).collect());
    let filled = na_seadec(
        &series,
        InterpolationMethod::Nearest,
        DecompositionModel::Additive,
    )
    .expect("gap fill succeeds");
    assert_eq!(filled.values(), series.values());
}

#[test]
fn test_short_record_is_rejected() {
    let mut values: Vec<f64> = (0..20).map(ndvi_like).collect();
    values[4] = f64::NAN;
    let result = na_seadec(
        &monthly(values),
        InterpolationMethod::Linear,
        DecompositionModel::Additive,
    );
    assert!(result.is_err(), "two full cycles are required");
}
