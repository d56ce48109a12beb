//! Decomposition panel grid
//!
//! One column per variable, five rows of components (observed, trend,
//! detrended, seasonal, anomalies), with optional translucent stripes
//! marking ENSO phases behind every panel.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use plotters::prelude::*;

use crate::core::decompose::{seasonal_decompose, DecompositionModel};
use crate::types::{ManglarError, ManglarResult, TimeTable};

/// ENSO phase label aligned to a table's time index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsoPhase {
    Neutral,
    /// La Niña cold phase, drawn as a blue stripe
    Nina,
    /// El Niño warm phase, drawn as a red stripe
    Nino,
}

/// Options for [`plot_components`]
#[derive(Debug, Clone)]
pub struct ComponentsPlotOptions {
    /// Output image size in pixels
    pub size: (u32, u32),
    /// Phase labels, one per index entry
    pub phases: Option<Vec<EnsoPhase>>,
    /// Vertical padding of each panel as a fraction of the series maximum,
    /// also the headroom the phase stripes span
    pub scale: f64,
    /// Display titles per variable name; absent entries fall back to the name
    pub titles: HashMap<String, String>,
}

impl Default for ComponentsPlotOptions {
    fn default() -> Self {
        ComponentsPlotOptions {
            size: (1400, 900),
            phases: None,
            scale: 0.05,
            titles: HashMap::new(),
        }
    }
}

const COMPONENT_ROWS: [&str; 5] = ["Observed", "Trend", "Detrended", "Seasonal", "Anomalies"];

/// Render the component grid for every decomposable variable in the table.
///
/// Variables whose decomposition fails (too short, missing values) are
/// skipped with a warning, mirroring how the study treated incomplete
/// columns. Fails if no variable can be decomposed or if the phase overlay
/// does not match the index length.
pub fn plot_components(
    table: &TimeTable,
    path: impl AsRef<Path>,
    options: &ComponentsPlotOptions,
) -> ManglarResult<()> {
    if let Some(phases) = &options.phases {
        if phases.len() != table.len() {
            return Err(ManglarError::Plot(format!(
                "phase overlay has {} entries for {} index entries",
                phases.len(),
                table.len()
            )));
        }
    }

    let mut panels: Vec<(String, [Vec<f64>; 5])> = Vec::new();
    for name in table.names() {
        let series = table.series(name)?;
        match seasonal_decompose(&series, DecompositionModel::Additive) {
            Ok(d) => {
                let detrended = d.detrended();
                panels.push((
                    name.clone(),
                    [d.observed, d.trend, detrended, d.seasonal, d.residual],
                ));
            }
            Err(e) => {
                log::warn!("skipping '{}' in component plot: {}", name, e);
            }
        }
    }
    if panels.is_empty() {
        return Err(ManglarError::Plot(
            "no variable in the table could be decomposed".to_string(),
        ));
    }

    let dates = table.index();
    let root = BitMapBackend::new(path.as_ref(), options.size).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((COMPONENT_ROWS.len(), panels.len()));

    for (col, (name, components)) in panels.iter().enumerate() {
        let title = options.titles.get(name).unwrap_or(name);
        for (row, values) in components.iter().enumerate() {
            let area = &areas[row * panels.len() + col];
            draw_panel(
                area,
                dates,
                values,
                if row == 0 { Some(title) } else { None },
                if col == 0 { Some(COMPONENT_ROWS[row]) } else { None },
                if row == COMPONENT_ROWS.len() - 1 {
                    Some("Time [Y]")
                } else {
                    None
                },
                options,
            )?;
        }
    }

    root.present()?;
    log::info!(
        "wrote component plot for {} variables to {}",
        panels.len(),
        path.as_ref().display()
    );
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    dates: &[NaiveDate],
    values: &[f64],
    caption: Option<&str>,
    y_label: Option<&str>,
    x_label: Option<&str>,
    options: &ComponentsPlotOptions,
) -> ManglarResult<()>
where
    DB::ErrorType: 'static,
{
    let y_max = values.iter().fold(f64::MIN, |a, &b| a.max(b));
    let y_min = values.iter().fold(f64::MAX, |a, &b| a.min(b));
    let lo = y_min - options.scale * y_max;
    let mut hi = y_max + options.scale * y_max;
    if hi <= lo {
        hi = lo + 1.0;
    }

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(6)
        .x_label_area_size(if x_label.is_some() { 28 } else { 14 })
        .y_label_area_size(if y_label.is_some() { 48 } else { 34 });
    if let Some(text) = caption {
        builder.caption(text, ("sans-serif", 14));
    }
    let mut chart = builder.build_cartesian_2d(dates[0]..dates[dates.len() - 1], lo..hi)?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .disable_y_mesh()
        .x_labels(6)
        .y_labels(4)
        .label_style(("sans-serif", 10));
    if let Some(text) = y_label {
        mesh.y_desc(text);
    }
    if let Some(text) = x_label {
        mesh.x_desc(text);
    }
    mesh.draw()?;

    if let Some(phases) = &options.phases {
        for (phase, color) in [(EnsoPhase::Nina, BLUE), (EnsoPhase::Nino, RED)] {
            chart.draw_series(phase_runs(phases, phase).into_iter().map(|(s, e)| {
                let x1 = dates[usize::min(e + 1, dates.len() - 1)];
                Rectangle::new([(dates[s], lo), (x1, hi)], color.mix(0.2).filled())
            }))?;
        }
    }

    chart.draw_series(LineSeries::new(
        dates.iter().zip(values).map(|(d, v)| (*d, *v)),
        &BLACK,
    ))?;
    Ok(())
}

/// Contiguous index runs labeled with the given phase, as (start, end) pairs.
fn phase_runs(phases: &[EnsoPhase], which: EnsoPhase) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    for (i, p) in phases.iter().enumerate() {
        if *p == which {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            runs.push((s, i - 1));
        }
    }
    if let Some(s) = start {
        runs.push((s, phases.len() - 1));
    }
    runs
}
