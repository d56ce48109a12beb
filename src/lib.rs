//! manglar: time-series and raster utilities for coastal mangrove monitoring
//!
//! This library carries the analysis toolkit of a lagoon monitoring study:
//! seasonal gap-filling and decomposition of monthly series, correlation
//! analysis with significance testing, plotting helpers for the study's
//! figures, and the raster-to-NetCDF and satellite-imagery pipelines that
//! feed the record.

pub mod core;
pub mod io;
pub mod plot;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    BoundingBox, Frequency, ManglarError, ManglarResult, RasterCube, TimeSeries, TimeTable,
};

pub use core::{
    acf, ccf, confidence_interval, corr_matrix, detrend, interpolate, na_seadec, pearson,
    seasonal_decompose, CorrMatrix, CorrMatrixOptions, Decomposition, DecompositionModel,
    InterpolationMethod,
};

pub use io::{read_site_stacks, write_cube, write_site_products, PlatformClient};

pub use plot::{
    plot_components, plot_corr_matrix, plot_correlograms, ComponentsPlotOptions,
    CorrelogramOptions, EnsoPhase, HeatmapOptions,
};
