//! Pairwise correlation with significance testing
//!
//! Pearson r with a two-sided p-value from the Student's t distribution,
//! assembled into a named square matrix with optional triangle and
//! significance masking, plus the autocorrelation and cross-correlation
//! sequences the correlogram plots consume.

use ndarray::Array2;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::types::{ManglarError, ManglarResult, TimeTable};

/// Options for [`corr_matrix`]
#[derive(Debug, Clone)]
pub struct CorrMatrixOptions {
    /// Keep only the lower triangle and the diagonal
    pub half: bool,
    /// Hide entries whose p-value exceeds the significance threshold
    pub hide_insignificant: bool,
    /// Two-sided p-value threshold used by `hide_insignificant`
    pub significance_threshold: f64,
}

impl Default for CorrMatrixOptions {
    fn default() -> Self {
        CorrMatrixOptions {
            half: false,
            hide_insignificant: false,
            significance_threshold: 0.05,
        }
    }
}

/// Named square correlation matrix with aligned p-values.
///
/// Rows and columns share one variable order. Masked coefficients are NaN;
/// the p-value matrix is never masked.
#[derive(Debug, Clone)]
pub struct CorrMatrix {
    names: Vec<String>,
    r: Array2<f64>,
    p: Array2<f64>,
}

impl CorrMatrix {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Correlation coefficients, NaN where masked
    pub fn r(&self) -> &Array2<f64> {
        &self.r
    }

    /// Two-sided p-values for every pair
    pub fn p_values(&self) -> &Array2<f64> {
        &self.p
    }

    /// Number of variables on each axis
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Pearson correlation coefficient and two-sided p-value.
///
/// The p-value comes from `t = r * sqrt((n - 2) / (1 - r^2))` against a
/// Student's t distribution with n - 2 degrees of freedom. Constant input
/// has no defined correlation and yields NaN for both.
pub fn pearson(x: &[f64], y: &[f64]) -> ManglarResult<(f64, f64)> {
    if x.len() != y.len() {
        return Err(ManglarError::Correlation(format!(
            "series lengths differ: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 3 {
        return Err(ManglarError::Correlation(format!(
            "need at least 3 paired observations, got {}",
            n
        )));
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return Ok((f64::NAN, f64::NAN));
    }

    let r = (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0);
    let df = (n - 2) as f64;
    if 1.0 - r * r <= f64::EPSILON {
        // perfect correlation saturates the t statistic
        return Ok((r, 0.0));
    }
    let t = r * (df / (1.0 - r * r)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| ManglarError::Correlation(format!("t distribution: {}", e)))?;
    let p = 2.0 * (1.0 - dist.cdf(t.abs()));
    Ok((r, p.clamp(0.0, 1.0)))
}

/// Pairwise correlation matrix over the selected variables.
///
/// Every pair including self-pairs is tested; the matrix is symmetric with
/// a unit diagonal before masking. `variables: None` selects every column.
pub fn corr_matrix(
    table: &TimeTable,
    variables: Option<&[&str]>,
    options: &CorrMatrixOptions,
) -> ManglarResult<CorrMatrix> {
    let names: Vec<String> = match variables {
        Some(v) => v.iter().map(|s| (*s).to_string()).collect(),
        None => table.names().to_vec(),
    };
    if names.is_empty() {
        return Err(ManglarError::Correlation(
            "no variables selected".to_string(),
        ));
    }

    let k = names.len();
    let mut r = Array2::from_elem((k, k), f64::NAN);
    let mut p = Array2::from_elem((k, k), f64::NAN);
    for i in 0..k {
        let xi = table.column(&names[i])?;
        for j in 0..=i {
            let xj = table.column(&names[j])?;
            let (rij, pij) = pearson(xi, xj)?;
            r[[i, j]] = rij;
            r[[j, i]] = rij;
            p[[i, j]] = pij;
            p[[j, i]] = pij;
        }
    }

    if options.hide_insignificant {
        for i in 0..k {
            for j in 0..k {
                if !(p[[i, j]] <= options.significance_threshold) {
                    r[[i, j]] = f64::NAN;
                }
            }
        }
    }
    if options.half {
        for i in 0..k {
            for j in i + 1..k {
                r[[i, j]] = f64::NAN;
            }
        }
    }

    log::debug!("built {}x{} correlation matrix", k, k);
    Ok(CorrMatrix { names, r, p })
}

/// Autocorrelation sequence for lags 0..=max_lag, normalized so lag 0 is 1.
pub fn acf(x: &[f64], max_lag: usize) -> ManglarResult<Vec<f64>> {
    if x.is_empty() || max_lag >= x.len() {
        return Err(ManglarError::Correlation(format!(
            "max lag {} requires a longer series than {} points",
            max_lag,
            x.len()
        )));
    }
    let n = x.len();
    let mean = x.iter().sum::<f64>() / n as f64;
    let var = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    if var == 0.0 {
        return Err(ManglarError::Correlation(
            "autocorrelation of a constant series is undefined".to_string(),
        ));
    }

    let mut out = Vec::with_capacity(max_lag + 1);
    for lag in 0..=max_lag {
        let mut acc = 0.0;
        for t in 0..n - lag {
            acc += (x[t] - mean) * (x[t + lag] - mean);
        }
        out.push(acc / (n as f64 * var));
    }
    Ok(out)
}

/// Cross-correlation of `x` led by `lag` against `y`, for lags 0..=max_lag.
pub fn ccf(x: &[f64], y: &[f64], max_lag: usize) -> ManglarResult<Vec<f64>> {
    if x.len() != y.len() {
        return Err(ManglarError::Correlation(format!(
            "series lengths differ: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    if x.is_empty() || max_lag >= x.len() {
        return Err(ManglarError::Correlation(format!(
            "max lag {} requires a longer series than {} points",
            max_lag,
            x.len()
        )));
    }
    let n = x.len();
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;
    let sd_x = (x.iter().map(|v| (v - mean_x) * (v - mean_x)).sum::<f64>() / n as f64).sqrt();
    let sd_y = (y.iter().map(|v| (v - mean_y) * (v - mean_y)).sum::<f64>() / n as f64).sqrt();
    if sd_x == 0.0 || sd_y == 0.0 {
        return Err(ManglarError::Correlation(
            "cross-correlation of a constant series is undefined".to_string(),
        ));
    }

    let mut out = Vec::with_capacity(max_lag + 1);
    for lag in 0..=max_lag {
        let mut acc = 0.0;
        for t in 0..n - lag {
            acc += (x[t + lag] - mean_x) * (y[t] - mean_y);
        }
        out.push(acc / (n as f64 * sd_x * sd_y));
    }
    Ok(out)
}

/// Approximate 95% confidence bound for a correlogram, 1.96 / sqrt(n).
pub fn confidence_interval(n: usize) -> f64 {
    if n == 0 {
        return f64::NAN;
    }
    1.96 / (n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::NaiveDate;

    fn monthly_index(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(1998, 1, 1).unwrap();
        (0..n)
            .map(|i| start.checked_add_months(chrono::Months::new(i as u32)).unwrap())
            .collect()
    }

    fn linear(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    fn alternating(n: usize) -> Vec<f64> {
        (0..n).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect()
    }

    #[test]
    fn test_pearson_known_value() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 2.0, 3.0, 4.0, 6.0];
        let (r, p) = pearson(&x, &y).unwrap();
        assert_relative_eq!(r, 12.0 / 148.0_f64.sqrt(), epsilon = 1e-12);
        assert!(p > 0.0 && p < 0.005, "p = {}", p);
    }

    #[test]
    fn test_pearson_perfect_pairs() {
        let x = linear(20);
        let inverted: Vec<f64> = x.iter().map(|v| -2.0 * v + 3.0).collect();
        let (r_pos, p_pos) = pearson(&x, &x).unwrap();
        let (r_neg, p_neg) = pearson(&x, &inverted).unwrap();
        assert_relative_eq!(r_pos, 1.0);
        assert_relative_eq!(r_neg, -1.0);
        assert_relative_eq!(p_pos, 0.0);
        assert_relative_eq!(p_neg, 0.0);
    }

    #[test]
    fn test_pearson_constant_input_is_nan() {
        let (r, p) = pearson(&[1.0; 10], &linear(10)).unwrap();
        assert!(r.is_nan());
        assert!(p.is_nan());
    }

    #[test]
    fn test_pearson_rejects_short_or_mismatched_input() {
        assert!(pearson(&[1.0, 2.0], &[3.0, 4.0]).is_err());
        assert!(pearson(&linear(5), &linear(6)).is_err());
    }

    fn sample_table() -> TimeTable {
        let n = 30;
        let x = linear(n);
        let driven: Vec<f64> = x
            .iter()
            .zip(alternating(n))
            .map(|(v, a)| 2.0 * v + 0.1 * a)
            .collect();
        TimeTable::from_columns(
            monthly_index(n),
            vec![
                ("x".to_string(), x),
                ("driven".to_string(), driven),
                ("noise".to_string(), alternating(n)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_matrix_symmetric_with_unit_diagonal() {
        let m = corr_matrix(&sample_table(), None, &CorrMatrixOptions::default()).unwrap();
        assert_eq!(m.len(), 3);
        for i in 0..3 {
            assert_relative_eq!(m.r()[[i, i]], 1.0);
            for j in 0..3 {
                assert_relative_eq!(m.r()[[i, j]], m.r()[[j, i]]);
                assert_relative_eq!(m.p_values()[[i, j]], m.p_values()[[j, i]]);
            }
        }
    }

    #[test]
    fn test_half_masks_strict_upper_triangle() {
        let options = CorrMatrixOptions {
            half: true,
            ..CorrMatrixOptions::default()
        };
        let m = corr_matrix(&sample_table(), None, &options).unwrap();
        for i in 0..m.len() {
            for j in 0..m.len() {
                if j > i {
                    assert!(m.r()[[i, j]].is_nan());
                } else {
                    assert!(m.r()[[i, j]].is_finite());
                }
            }
        }
    }

    #[test]
    fn test_hide_insignificant_never_reveals_weak_entries() {
        let options = CorrMatrixOptions {
            hide_insignificant: true,
            ..CorrMatrixOptions::default()
        };
        let m = corr_matrix(&sample_table(), None, &options).unwrap();
        let mut masked = 0;
        for i in 0..m.len() {
            for j in 0..m.len() {
                if m.r()[[i, j]].is_finite() {
                    assert!(m.p_values()[[i, j]] <= options.significance_threshold);
                } else {
                    masked += 1;
                }
            }
        }
        // the alternating column correlates with nothing but itself
        assert!(masked >= 2, "expected masked entries, got {}", masked);
    }

    #[test]
    fn test_variable_selection_and_missing_column() {
        let table = sample_table();
        let m = corr_matrix(&table, Some(&["driven", "x"]), &CorrMatrixOptions::default())
            .unwrap();
        assert_eq!(m.names(), &["driven".to_string(), "x".to_string()]);
        assert!(corr_matrix(&table, Some(&["absent"]), &CorrMatrixOptions::default()).is_err());
    }

    #[test]
    fn test_acf_of_seasonal_signal() {
        let x: Vec<f64> = (0..120)
            .map(|i| (std::f64::consts::TAU * i as f64 / 12.0).sin())
            .collect();
        let acf = acf(&x, 12).unwrap();
        assert_relative_eq!(acf[0], 1.0);
        assert!(acf[6] < -0.8, "half cycle should anticorrelate: {}", acf[6]);
        assert!(acf[12] > 0.8, "full cycle should correlate: {}", acf[12]);
    }

    #[test]
    fn test_ccf_recovers_known_lag() {
        let x: Vec<f64> = (0..200).map(|i| (0.7 * i as f64).sin()).collect();
        let shifted: Vec<f64> = (0..200)
            .map(|i| if i >= 3 { x[i - 3] } else { 0.0 })
            .collect();
        let ccf = ccf(&shifted, &x, 6).unwrap();
        let best = ccf
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(lag, _)| lag)
            .unwrap();
        assert_eq!(best, 3);
        assert!(ccf[3] > 0.8);
    }

    #[test]
    fn test_confidence_interval() {
        assert_abs_diff_eq!(confidence_interval(100), 0.196, epsilon = 1e-12);
        assert!(confidence_interval(0).is_nan());
    }
}
