//! Trend removal for tabular series

use crate::core::decompose::{seasonal_decompose, DecompositionModel};
use crate::types::{ManglarResult, TimeTable};

/// Subtract the decomposed trend from each selected variable.
///
/// Returns a copy of the table with the selected columns replaced by their
/// detrended values; non-selected columns pass through unchanged.
/// `variables: None` selects every column. Requesting a column the table
/// does not hold is an error. Decomposition is additive, so each replaced
/// column is observed minus trend.
pub fn detrend(table: &TimeTable, variables: Option<&[&str]>) -> ManglarResult<TimeTable> {
    let selected: Vec<String> = match variables {
        Some(names) => names.iter().map(|s| (*s).to_string()).collect(),
        None => table.names().to_vec(),
    };

    let mut out = table.clone();
    for name in &selected {
        let series = table.series(name)?;
        let components = seasonal_decompose(&series, DecompositionModel::Additive)?;
        out.insert(name.clone(), components.detrended())?;
        log::debug!("removed trend from '{}'", name);
    }
    Ok(out)
}
