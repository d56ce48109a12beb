//! Gap interpolation for regularly sampled series
//!
//! Fills missing (NaN) observations from the surrounding observed values.
//! Interior gaps are interpolated; runs at either boundary take the nearest
//! observed value so the result is always a complete series.

use crate::types::{ManglarError, ManglarResult, TimeSeries};

/// Interpolation method used to fill missing observations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMethod {
    /// Straight line between the nearest observed neighbors
    Linear,
    /// Value of the closest observed neighbor (earlier neighbor on ties)
    Nearest,
}

impl Default for InterpolationMethod {
    fn default() -> Self {
        InterpolationMethod::Linear
    }
}

/// Fill every missing observation in `series`.
///
/// Observed values are never modified. Fails if the series holds no
/// observed value at all.
pub fn interpolate(
    series: &TimeSeries,
    method: InterpolationMethod,
) -> ManglarResult<TimeSeries> {
    let filled = fill_values(series.values(), method)?;
    Ok(series.with_values(filled))
}

/// Core fill on a raw value slice, shared with the gap-filler.
pub(crate) fn fill_values(values: &[f64], method: InterpolationMethod) -> ManglarResult<Vec<f64>> {
    let observed: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, _)| i)
        .collect();

    if observed.is_empty() {
        return Err(ManglarError::InvalidSeries(
            "cannot interpolate a series with no observed values".to_string(),
        ));
    }
    if observed.len() == values.len() {
        return Ok(values.to_vec());
    }

    let mut out = values.to_vec();
    match method {
        InterpolationMethod::Linear => {
            let first = observed[0];
            let last = observed[observed.len() - 1];
            for v in out.iter_mut().take(first) {
                *v = values[first];
            }
            for v in out.iter_mut().skip(last + 1) {
                *v = values[last];
            }
            for w in observed.windows(2) {
                let (prev, next) = (w[0], w[1]);
                if next - prev < 2 {
                    continue;
                }
                let span = (next - prev) as f64;
                for i in prev + 1..next {
                    let t = (i - prev) as f64 / span;
                    out[i] = values[prev] + (values[next] - values[prev]) * t;
                }
            }
        }
        InterpolationMethod::Nearest => {
            for i in 0..values.len() {
                if values[i].is_finite() {
                    continue;
                }
                let pos = observed.partition_point(|&o| o < i);
                let next = observed.get(pos).copied();
                let prev = if pos > 0 { Some(observed[pos - 1]) } else { None };
                let source = match (prev, next) {
                    (Some(p), Some(n)) => {
                        if i - p <= n - i {
                            p
                        } else {
                            n
                        }
                    }
                    (Some(p), None) => p,
                    (None, Some(n)) => n,
                    // observed is non-empty, so one side always exists
                    (None, None) => continue,
                };
                out[i] = values[source];
            }
        }
    }

    log::debug!(
        "interpolated {} of {} positions with {:?}",
        values.len() - observed.len(),
        values.len(),
        method
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(values: Vec<f64>) -> TimeSeries {
        TimeSeries::monthly(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn test_linear_interior_gap() {
        let filled = interpolate(&series(vec![1.0, f64::NAN, 3.0]), InterpolationMethod::Linear)
            .unwrap();
        assert_relative_eq!(filled.values()[1], 2.0);
    }

    #[test]
    fn test_linear_long_gap_is_evenly_spaced() {
        let filled = interpolate(
            &series(vec![0.0, f64::NAN, f64::NAN, f64::NAN, 4.0]),
            InterpolationMethod::Linear,
        )
        .unwrap();
        assert_relative_eq!(filled.values()[1], 1.0);
        assert_relative_eq!(filled.values()[2], 2.0);
        assert_relative_eq!(filled.values()[3], 3.0);
    }

    #[test]
    fn test_boundary_runs_take_nearest_value() {
        let filled = interpolate(
            &series(vec![f64::NAN, f64::NAN, 5.0, 6.0, f64::NAN]),
            InterpolationMethod::Linear,
        )
        .unwrap();
        assert_relative_eq!(filled.values()[0], 5.0);
        assert_relative_eq!(filled.values()[1], 5.0);
        assert_relative_eq!(filled.values()[4], 6.0);
    }

    #[test]
    fn test_nearest_prefers_earlier_on_tie() {
        let filled = interpolate(
            &series(vec![1.0, f64::NAN, 9.0]),
            InterpolationMethod::Nearest,
        )
        .unwrap();
        assert_relative_eq!(filled.values()[1], 1.0);
    }

    #[test]
    fn test_observed_values_untouched() {
        let input = series(vec![1.5, f64::NAN, 2.5, 3.5]);
        let filled = interpolate(&input, InterpolationMethod::Linear).unwrap();
        assert_relative_eq!(filled.values()[0], 1.5);
        assert_relative_eq!(filled.values()[2], 2.5);
        assert_relative_eq!(filled.values()[3], 3.5);
    }

    #[test]
    fn test_all_missing_is_an_error() {
        let result = interpolate(&series(vec![f64::NAN, f64::NAN]), InterpolationMethod::Linear);
        assert!(result.is_err());
    }

    #[test]
    fn test_complete_series_passes_through() {
        let input = series(vec![1.0, 2.0, 3.0]);
        let filled = interpolate(&input, InterpolationMethod::Nearest).unwrap();
        assert_eq!(filled.values(), input.values());
    }
}
