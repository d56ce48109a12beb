//! Plot rendering
//!
//! Presentation helpers built on plotters. Every function renders straight
//! to a file path and propagates drawing failures; nothing here holds state
//! or retries.

pub mod components;
pub mod correlogram;
pub mod heatmap;

// Re-export main types
pub use components::{plot_components, ComponentsPlotOptions, EnsoPhase};
pub use correlogram::{plot_correlograms, CorrelogramOptions};
pub use heatmap::{plot_corr_matrix, HeatmapOptions};
