use chrono::{Months, NaiveDate};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Real-valued raster sample type
pub type RasterValue = f32;

/// Single-band raster plane (rows x columns)
pub type RasterPlane = Array2<RasterValue>;

/// Stacked raster data for one variable (latitude x longitude x time)
pub type RasterCube = Array3<RasterValue>;

/// Sampling frequency of a regular time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Monthly,
    Quarterly,
}

impl Frequency {
    /// Number of observations in one seasonal cycle
    pub fn period(&self) -> usize {
        match self {
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Quarterly => write!(f, "quarterly"),
        }
    }
}

/// One observed variable on a regular date index.
///
/// Missing observations are stored as `f64::NAN`. The index is strictly
/// increasing and always the same length as the values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    index: Vec<NaiveDate>,
    values: Vec<f64>,
    name: Option<String>,
}

impl TimeSeries {
    /// Build a series from an explicit index, validating the invariants.
    pub fn new(index: Vec<NaiveDate>, values: Vec<f64>) -> ManglarResult<Self> {
        if index.len() != values.len() {
            return Err(ManglarError::InvalidSeries(format!(
                "index length {} does not match value length {}",
                index.len(),
                values.len()
            )));
        }
        if index.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ManglarError::InvalidSeries(
                "index timestamps must be strictly increasing".to_string(),
            ));
        }
        Ok(TimeSeries {
            index,
            values,
            name: None,
        })
    }

    /// Build a monthly series starting at `start`, one value per month.
    pub fn monthly(start: NaiveDate, values: Vec<f64>) -> ManglarResult<Self> {
        let mut index = Vec::with_capacity(values.len());
        for i in 0..values.len() {
            let date = start
                .checked_add_months(Months::new(i as u32))
                .ok_or_else(|| {
                    ManglarError::InvalidSeries(format!(
                        "monthly index overflows the calendar at position {}",
                        i
                    ))
                })?;
            index.push(date);
        }
        Self::new(index, values)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Same index and name, new values (lengths must already agree).
    pub fn with_values(&self, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), self.index.len());
        TimeSeries {
            index: self.index.clone(),
            values,
            name: self.name.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Positions holding a missing (non-finite) observation
    pub fn missing_positions(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_finite())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_missing(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Infer the sampling frequency from the index spacing.
    pub fn frequency(&self) -> ManglarResult<Frequency> {
        if self.index.len() < 2 {
            return Err(ManglarError::InvalidSeries(
                "need at least two timestamps to infer a frequency".to_string(),
            ));
        }
        let mut monthly = true;
        let mut quarterly = true;
        for w in self.index.windows(2) {
            let days = (w[1] - w[0]).num_days();
            monthly &= (28..=31).contains(&days);
            quarterly &= (89..=92).contains(&days);
        }
        if monthly {
            Ok(Frequency::Monthly)
        } else if quarterly {
            Ok(Frequency::Quarterly)
        } else {
            Err(ManglarError::InvalidSeries(
                "index spacing is neither monthly nor quarterly".to_string(),
            ))
        }
    }
}

/// Column-oriented table of variables sharing one date index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeTable {
    index: Vec<NaiveDate>,
    names: Vec<String>,
    columns: HashMap<String, Vec<f64>>,
}

impl TimeTable {
    pub fn new(index: Vec<NaiveDate>) -> ManglarResult<Self> {
        if index.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ManglarError::InvalidSeries(
                "index timestamps must be strictly increasing".to_string(),
            ));
        }
        Ok(TimeTable {
            index,
            names: Vec::new(),
            columns: HashMap::new(),
        })
    }

    pub fn from_columns(
        index: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> ManglarResult<Self> {
        let mut table = Self::new(index)?;
        for (name, values) in columns {
            table.insert(name, values)?;
        }
        Ok(table)
    }

    /// Add or replace a column. Column order is insertion order.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> ManglarResult<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(ManglarError::InvalidSeries(format!(
                "column '{}' has {} values but the index has {} entries",
                name,
                values.len(),
                self.index.len()
            )));
        }
        if !self.columns.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    /// Column names in insertion order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn column(&self, name: &str) -> ManglarResult<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ManglarError::ColumnNotFound(name.to_string()))
    }

    /// Extract one column as a named series sharing this table's index.
    pub fn series(&self, name: &str) -> ManglarResult<TimeSeries> {
        let values = self.column(name)?.to_vec();
        Ok(TimeSeries::new(self.index.clone(), values)?.with_name(name))
    }
}

/// Geographic bounding box in degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

/// Error types for analysis and pipeline operations
#[derive(Debug, thiserror::Error)]
pub enum ManglarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Decomposition error: {0}")]
    Decomposition(String),

    #[error("Correlation error: {0}")]
    Correlation(String),

    #[error("Raster error: {0}")]
    Raster(String),

    #[error("Plot error: {0}")]
    Plot(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ManglarError
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ManglarError::Plot(err.to_string())
    }
}

/// Result type for analysis operations
pub type ManglarResult<T> = Result<T, ManglarError>;
