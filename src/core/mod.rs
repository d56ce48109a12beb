//! Core time-series analysis modules

pub mod correlation;
pub mod decompose;
pub mod detrend;
pub mod gapfill;
pub mod interpolate;

// Re-export main types
pub use correlation::{
    acf, ccf, confidence_interval, corr_matrix, pearson, CorrMatrix, CorrMatrixOptions,
};
pub use decompose::{decompose_with_period, seasonal_decompose, Decomposition, DecompositionModel};
pub use detrend::detrend;
pub use gapfill::na_seadec;
pub use interpolate::{interpolate, InterpolationMethod};
