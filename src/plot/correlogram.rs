//! Stem-plot grid for autocorrelation and cross-correlation sequences
//!
//! Lays out up to four correlograms on one canvas: a single full-size
//! panel, two stacked rows, or a 2x2 grid. Each panel draws one stem per
//! lag, a zero line, and the +/-ci confidence bounds.

use std::path::Path;

use plotters::prelude::*;

use crate::types::{ManglarError, ManglarResult};

/// Options for [`plot_correlograms`]
#[derive(Debug, Clone)]
pub struct CorrelogramOptions {
    /// Output image size in pixels
    pub size: (u32, u32),
    /// Shared y-axis limits as (low, high)
    pub y_limits: (f64, f64),
}

impl Default for CorrelogramOptions {
    fn default() -> Self {
        CorrelogramOptions {
            size: (900, 700),
            y_limits: (-1.0, 1.0),
        }
    }
}

/// Render titled correlation sequences as stem plots, at most four.
///
/// `ci` is the confidence bound drawn symmetrically around zero, typically
/// [`crate::core::correlation::confidence_interval`] of the sample count.
pub fn plot_correlograms(
    series: &[(String, Vec<f64>)],
    ci: f64,
    path: impl AsRef<Path>,
    options: &CorrelogramOptions,
) -> ManglarResult<()> {
    if series.is_empty() {
        return Err(ManglarError::Plot("no series supplied".to_string()));
    }
    if series.len() > 4 {
        return Err(ManglarError::Plot(format!(
            "can plot at most four series, got {}",
            series.len()
        )));
    }
    let (y_lo, y_hi) = options.y_limits;
    if y_lo >= y_hi {
        return Err(ManglarError::Plot(format!(
            "y limits must be ordered low to high, got ({}, {})",
            y_lo, y_hi
        )));
    }

    let root = BitMapBackend::new(path.as_ref(), options.size).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = match series.len() {
        1 => vec![root.clone()],
        2 => root.split_evenly((2, 1)),
        _ => root.split_evenly((2, 2)),
    };

    let bound_color = RGBColor(128, 128, 128);
    for ((title, values), area) in series.iter().zip(&areas) {
        if values.is_empty() {
            return Err(ManglarError::Plot(format!("series '{}' is empty", title)));
        }
        let lags = values.len() as i32;
        let mut chart = ChartBuilder::on(area)
            .caption(title, ("sans-serif", 16))
            .margin(8)
            .x_label_area_size(28)
            .y_label_area_size(40)
            .build_cartesian_2d(-1i32..lags, y_lo..y_hi)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels((values.len() / 4).max(2))
            .y_labels(5)
            .x_desc("Lag")
            .label_style(("sans-serif", 11))
            .draw()?;

        chart.draw_series(std::iter::once(PathElement::new(
            vec![(-1, 0.0), (lags, 0.0)],
            BLACK.stroke_width(1),
        )))?;
        for bound in [ci, -ci] {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(-1, bound), (lags, bound)],
                bound_color.stroke_width(1),
            )))?;
        }

        chart.draw_series(values.iter().enumerate().map(|(lag, v)| {
            PathElement::new(vec![(lag as i32, 0.0), (lag as i32, *v)], &BLACK)
        }))?;
        chart.draw_series(
            values
                .iter()
                .enumerate()
                .map(|(lag, v)| Circle::new((lag as i32, *v), 3, BLACK.filled())),
        )?;
    }

    root.present()?;
    log::info!(
        "wrote {} correlograms to {}",
        series.len(),
        path.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stems(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (std::f64::consts::TAU * i as f64 / 12.0).cos() * 0.8)
            .collect()
    }

    fn named(count: usize) -> Vec<(String, Vec<f64>)> {
        (0..count)
            .map(|i| (format!("series {}", i), stems(25)))
            .collect()
    }

    #[test]
    fn test_renders_single_panel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acf.png");
        plot_correlograms(&named(1), 0.196, &path, &CorrelogramOptions::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_renders_quad_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.png");
        plot_correlograms(&named(4), 0.196, &path, &CorrelogramOptions::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_more_than_four_series_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = plot_correlograms(
            &named(5),
            0.196,
            dir.path().join("too_many.png"),
            &CorrelogramOptions::default(),
        );
        assert!(matches!(result, Err(ManglarError::Plot(_))));
    }

    #[test]
    fn test_inverted_y_limits_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let options = CorrelogramOptions {
            y_limits: (1.0, -1.0),
            ..CorrelogramOptions::default()
        };
        let result = plot_correlograms(&named(2), 0.196, dir.path().join("b.png"), &options);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = plot_correlograms(
            &[],
            0.196,
            dir.path().join("empty.png"),
            &CorrelogramOptions::default(),
        );
        assert!(result.is_err());
    }
}
