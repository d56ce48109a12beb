//! Seasonally aware gap filling
//!
//! The na_seadec scheme known from the imputeTS family: strip the seasonal
//! component, interpolate the seasonal-free remainder across the holes, and
//! add the seasonal component back. Filled values follow both the long-term
//! trend and the seasonal pattern; observed values pass through untouched.

use crate::core::decompose::{seasonal_decompose, DecompositionModel};
use crate::core::interpolate::{fill_values, InterpolationMethod};
use crate::types::{ManglarResult, TimeSeries};

/// Fill missing observations while preserving trend and seasonality.
///
/// Steps: naively interpolate to get a complete series, decompose it,
/// combine trend and residual into a seasonal-free base, reintroduce the
/// original holes into that base, interpolate it again, add the seasonal
/// component back, and take the result only at originally-missing positions.
pub fn na_seadec(
    series: &TimeSeries,
    method: InterpolationMethod,
    model: DecompositionModel,
) -> ManglarResult<TimeSeries> {
    let missing = series.missing_positions();
    if missing.is_empty() {
        return Ok(series.clone());
    }
    log::debug!(
        "seasonal gap fill: {} of {} values missing",
        missing.len(),
        series.len()
    );

    let naive = fill_values(series.values(), method)?;
    let components = seasonal_decompose(&series.with_values(naive), model)?;

    let mut base = components.deseasonalized();
    for &i in &missing {
        base[i] = f64::NAN;
    }
    let base_filled = fill_values(&base, method)?;

    let mut out = series.values().to_vec();
    for &i in &missing {
        out[i] = match model {
            DecompositionModel::Additive => base_filled[i] + components.seasonal[i],
            DecompositionModel::Multiplicative => base_filled[i] * components.seasonal[i],
        };
    }
    Ok(series.with_values(out))
}
