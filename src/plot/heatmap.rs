//! Correlation-matrix heatmap
//!
//! One colored cell per coefficient on a diverging palette fixed to
//! [-1, 1], the first variable at the top-left. Masked (NaN) entries stay
//! blank. Labels, tick names, and the optional colorbar follow the study's
//! paired-matrix figures.

use std::path::Path;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::core::correlation::CorrMatrix;
use crate::types::{ManglarError, ManglarResult};

/// Options for [`plot_corr_matrix`]
#[derive(Debug, Clone)]
pub struct HeatmapOptions {
    /// Output image size in pixels
    pub size: (u32, u32),
    /// Write the rounded coefficient at each unmasked cell center
    pub show_labels: bool,
    /// Draw a vertical palette bar at the right edge
    pub show_colorbar: bool,
    /// Color of the per-cell value labels
    pub label_color: RGBColor,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        HeatmapOptions {
            size: (860, 720),
            show_labels: true,
            show_colorbar: false,
            label_color: BLACK,
        }
    }
}

const COLORBAR_WIDTH: u32 = 90;

/// Render a correlation matrix as a heatmap.
pub fn plot_corr_matrix(
    matrix: &CorrMatrix,
    path: impl AsRef<Path>,
    options: &HeatmapOptions,
) -> ManglarResult<()> {
    let k = matrix.len();
    if k == 0 {
        return Err(ManglarError::Plot("empty correlation matrix".to_string()));
    }

    let root = BitMapBackend::new(path.as_ref(), options.size).into_drawing_area();
    root.fill(&WHITE)?;
    let (main, bar) = if options.show_colorbar {
        let (m, b) = root.split_horizontally(options.size.0 - COLORBAR_WIDTH);
        (m, Some(b))
    } else {
        (root.clone(), None)
    };

    let names = matrix.names();
    let main_width = if options.show_colorbar {
        options.size.0 - COLORBAR_WIDTH
    } else {
        options.size.0
    };
    // ticks sit on cell boundaries, the offsets nudge labels to cell centers
    let half_cell_x = (main_width.saturating_sub(140) / k as u32 / 2) as i32;
    let half_cell_y = (options.size.1.saturating_sub(70) / k as u32 / 2) as i32;

    let mut chart = ChartBuilder::on(&main)
        .margin(12)
        .top_x_label_area_size(44)
        .y_label_area_size(110)
        .build_cartesian_2d(0f64..k as f64, k as f64..0f64)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(k + 1)
        .y_labels(k + 1)
        .x_label_offset(half_cell_x)
        .y_label_offset(half_cell_y)
        .x_label_formatter(&|v| boundary_label(names, *v))
        .y_label_formatter(&|v| boundary_label(names, *v))
        .label_style(("sans-serif", 13))
        .draw()?;

    chart.draw_series(cell_indices(k).filter_map(|(i, j)| {
        let v = matrix.r()[[i, j]];
        v.is_finite().then(|| {
            Rectangle::new(
                [(j as f64, i as f64), (j as f64 + 1.0, i as f64 + 1.0)],
                spectral_color(v).filled(),
            )
        })
    }))?;

    if options.show_labels {
        let style = ("sans-serif", 13)
            .into_font()
            .color(&options.label_color)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(cell_indices(k).filter_map(|(i, j)| {
            let v = matrix.r()[[i, j]];
            v.is_finite().then(|| {
                Text::new(
                    format!("{:.2}", v),
                    (j as f64 + 0.5, i as f64 + 0.5),
                    style.clone(),
                )
            })
        }))?;
    }

    if let Some(bar) = bar {
        let mut bar_chart = ChartBuilder::on(&bar)
            .margin(12)
            .top_x_label_area_size(44)
            .y_label_area_size(40)
            .build_cartesian_2d(0f64..1f64, -1f64..1f64)?;
        bar_chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(0)
            .y_labels(5)
            .label_style(("sans-serif", 12))
            .draw()?;
        let steps = 128;
        bar_chart.draw_series((0..steps).map(|s| {
            let v0 = -1.0 + 2.0 * s as f64 / steps as f64;
            let v1 = -1.0 + 2.0 * (s + 1) as f64 / steps as f64;
            Rectangle::new(
                [(0.0, v0), (1.0, v1)],
                spectral_color((v0 + v1) / 2.0).filled(),
            )
        }))?;
    }

    root.present()?;
    log::info!(
        "wrote {}x{} correlation heatmap to {}",
        k,
        k,
        path.as_ref().display()
    );
    Ok(())
}

fn cell_indices(k: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..k).flat_map(move |i| (0..k).map(move |j| (i, j)))
}

/// Variable name for a tick that lands on a cell boundary, blank otherwise.
fn boundary_label(names: &[String], v: f64) -> String {
    let idx = v.round();
    if (v - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    names.get(idx as usize).cloned().unwrap_or_default()
}

/// Diverging ramp over [-1, 1]: red through pale yellow to blue-violet,
/// matching the Spectral palette's endpoints.
fn spectral_color(v: f64) -> RGBColor {
    let t = (v.clamp(-1.0, 1.0) + 1.0) / 2.0;
    let (from, to, local) = if t < 0.5 {
        ((158u8, 1u8, 66u8), (255u8, 255u8, 191u8), t * 2.0)
    } else {
        ((255u8, 255u8, 191u8), (94u8, 79u8, 162u8), (t - 0.5) * 2.0)
    };
    let lerp =
        |a: u8, b: u8| -> u8 { (a as f64 + (b as f64 - a as f64) * local).round() as u8 };
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}
