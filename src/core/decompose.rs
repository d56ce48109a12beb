//! Seasonal decomposition of regular time series
//!
//! Splits a series into trend, seasonal, and residual components. The trend
//! is a centered moving average over one seasonal cycle; positions within
//! half a cycle of either boundary are filled by extending a least-squares
//! line through the nearest cycle of computed trend values. The seasonal
//! component is built from period-position means of the detrended series and
//! tiled across the full length, so it is never extrapolated.

use crate::types::{ManglarError, ManglarResult, TimeSeries};

/// Decomposition model relating the components to the observations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompositionModel {
    /// observed = trend + seasonal + residual
    Additive,
    /// observed = trend * seasonal * residual
    Multiplicative,
}

impl Default for DecompositionModel {
    fn default() -> Self {
        DecompositionModel::Additive
    }
}

/// Aligned component series produced by [`seasonal_decompose`]
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub observed: Vec<f64>,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
    pub model: DecompositionModel,
    pub period: usize,
}

impl Decomposition {
    /// Observations with the seasonal component removed (trend + residual
    /// for the additive model, trend * residual for the multiplicative one).
    pub fn deseasonalized(&self) -> Vec<f64> {
        match self.model {
            DecompositionModel::Additive => self
                .trend
                .iter()
                .zip(&self.residual)
                .map(|(t, r)| t + r)
                .collect(),
            DecompositionModel::Multiplicative => self
                .trend
                .iter()
                .zip(&self.residual)
                .map(|(t, r)| t * r)
                .collect(),
        }
    }

    /// Observations with the trend component removed.
    pub fn detrended(&self) -> Vec<f64> {
        match self.model {
            DecompositionModel::Additive => self
                .observed
                .iter()
                .zip(&self.trend)
                .map(|(o, t)| o - t)
                .collect(),
            DecompositionModel::Multiplicative => self
                .observed
                .iter()
                .zip(&self.trend)
                .map(|(o, t)| o / t)
                .collect(),
        }
    }
}

/// Decompose a series, taking the period from its inferred frequency.
pub fn seasonal_decompose(
    series: &TimeSeries,
    model: DecompositionModel,
) -> ManglarResult<Decomposition> {
    let period = series.frequency()?.period();
    decompose_with_period(series.values(), period, model)
}

/// Decompose raw values with an explicit period.
pub fn decompose_with_period(
    values: &[f64],
    period: usize,
    model: DecompositionModel,
) -> ManglarResult<Decomposition> {
    if period < 2 {
        return Err(ManglarError::Decomposition(format!(
            "period must be at least 2, got {}",
            period
        )));
    }
    if values.len() < 2 * period {
        return Err(ManglarError::Decomposition(format!(
            "need at least two full cycles ({} points), got {}",
            2 * period,
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ManglarError::Decomposition(
            "series contains missing values, interpolate before decomposing".to_string(),
        ));
    }
    if model == DecompositionModel::Multiplicative && values.iter().any(|v| *v <= 0.0) {
        return Err(ManglarError::Decomposition(
            "multiplicative model requires strictly positive values".to_string(),
        ));
    }

    let mut trend = moving_average_trend(values, period);
    extend_trend_to_boundaries(&mut trend, period);

    let detrended: Vec<f64> = match model {
        DecompositionModel::Additive => {
            values.iter().zip(&trend).map(|(v, t)| v - t).collect()
        }
        DecompositionModel::Multiplicative => {
            values.iter().zip(&trend).map(|(v, t)| v / t).collect()
        }
    };

    let seasonal = tile_seasonal(&detrended, period, model);

    let residual: Vec<f64> = match model {
        DecompositionModel::Additive => detrended
            .iter()
            .zip(&seasonal)
            .map(|(d, s)| d - s)
            .collect(),
        DecompositionModel::Multiplicative => detrended
            .iter()
            .zip(&seasonal)
            .map(|(d, s)| d / s)
            .collect(),
    };

    log::debug!(
        "decomposed {} points with period {} ({:?} model)",
        values.len(),
        period,
        model
    );

    Ok(Decomposition {
        observed: values.to_vec(),
        trend,
        seasonal,
        residual,
        model,
        period,
    })
}

/// Centered moving average over one cycle. Even periods use a window of
/// period + 1 samples with half weight on both endpoints; odd periods use a
/// flat window. Positions within half a cycle of either end stay NaN.
fn moving_average_trend(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let half = period / 2;
    let mut trend = vec![f64::NAN; n];

    if period % 2 == 0 {
        for center in half..n - half {
            let mut acc = 0.5 * values[center - half] + 0.5 * values[center + half];
            for k in center - half + 1..center + half {
                acc += values[k];
            }
            trend[center] = acc / period as f64;
        }
    } else {
        for center in half..n - half {
            let mut acc = 0.0;
            for k in center - half..=center + half {
                acc += values[k];
            }
            trend[center] = acc / period as f64;
        }
    }
    trend
}

/// Replace the NaN runs at both ends of the trend with values from a
/// least-squares line fitted through the nearest cycle of defined points.
fn extend_trend_to_boundaries(trend: &mut [f64], period: usize) {
    let n = trend.len();
    let front = match trend.iter().position(|v| v.is_finite()) {
        Some(i) => i,
        None => return,
    };
    let back = match trend.iter().rposition(|v| v.is_finite()) {
        Some(i) => i,
        None => return,
    };

    if front > 0 {
        let end = usize::min(front + period, back);
        let (slope, intercept) = fit_line(trend, front, end);
        for (i, v) in trend.iter_mut().enumerate().take(front) {
            *v = slope * i as f64 + intercept;
        }
    }
    if back + 1 < n {
        let start = usize::max(front, back.saturating_sub(period));
        let (slope, intercept) = fit_line(trend, start, back + 1);
        for (i, v) in trend.iter_mut().enumerate().skip(back + 1) {
            *v = slope * i as f64 + intercept;
        }
    }
}

/// Ordinary least squares line through (i, trend[i]) for i in start..end.
fn fit_line(trend: &[f64], start: usize, end: usize) -> (f64, f64) {
    let n = (end - start) as f64;
    let mut sx = 0.0;
    let mut sy = 0.0;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, y) in trend.iter().enumerate().take(end).skip(start) {
        let x = i as f64;
        sx += x;
        sy += y;
        sxx += x * x;
        sxy += x * y;
    }
    let denom = n * sxx - sx * sx;
    if denom.abs() < f64::EPSILON {
        return (0.0, sy / n.max(1.0));
    }
    let slope = (n * sxy - sx * sy) / denom;
    let intercept = (sy - slope * sx) / n;
    (slope, intercept)
}

/// Period-position means of the detrended series, centered (additive) or
/// normalized (multiplicative), tiled to the full series length.
fn tile_seasonal(detrended: &[f64], period: usize, model: DecompositionModel) -> Vec<f64> {
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, v) in detrended.iter().enumerate() {
        sums[i % period] += v;
        counts[i % period] += 1;
    }
    let mut means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, c)| s / *c as f64)
        .collect();

    let grand = means.iter().sum::<f64>() / period as f64;
    match model {
        DecompositionModel::Additive => {
            for m in &mut means {
                *m -= grand;
            }
        }
        DecompositionModel::Multiplicative => {
            for m in &mut means {
                *m /= grand;
            }
        }
    }

    (0..detrended.len()).map(|i| means[i % period]).collect()
}
