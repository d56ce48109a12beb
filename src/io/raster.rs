//! Per-site raster stack reader
//!
//! Reads a directory of per-date multi-band GeoTIFFs for one monitoring
//! site and assembles surface-temperature and NDVI cubes on (latitude,
//! longitude, time). Acquisition dates come from the file names; the
//! coordinate axes come from the first file's geotransform. Temperature is
//! converted from Kelvin to Celsius, and samples failing the NDVI quality
//! mask are set to NaN in both cubes.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gdal::Dataset;
use ndarray::{s, Array2, Array3};
use regex::Regex;

use crate::types::{ManglarError, ManglarResult, RasterCube, RasterPlane};

/// Band holding surface temperature in Kelvin in the study's composites
pub const TEMPERATURE_BAND: usize = 5;
/// Band holding NDVI in the study's composites
pub const NDVI_BAND: usize = 6;
/// Sentinel marking invalid NDVI samples
pub const NDVI_SENTINEL: f32 = -3e5;
/// NDVI magnitude beyond which a sample is treated as invalid
pub const NDVI_LIMIT: f32 = 1.5;
/// Offset between Kelvin and Celsius
pub const KELVIN_OFFSET: f32 = 273.15;

/// One variable stacked over time with its coordinate vectors
#[derive(Debug, Clone)]
pub struct RasterStack {
    /// Data cube on (latitude, longitude, time)
    pub data: RasterCube,
    /// Latitude of each row, descending from the top edge
    pub latitude: Vec<f64>,
    /// Longitude of each column, ascending from the left edge
    pub longitude: Vec<f64>,
    /// Acquisition date of each time slice
    pub time: Vec<NaiveDate>,
}

/// Temperature and NDVI stacks read from one site directory
#[derive(Debug)]
pub struct SiteStacks {
    pub temperature: RasterStack,
    pub ndvi: RasterStack,
}

/// Read and stack every dated GeoTIFF in a site directory.
pub fn read_site_stacks(dir: impl AsRef<Path>) -> ManglarResult<SiteStacks> {
    let dir = dir.as_ref();
    let files = dated_rasters(dir)?;
    if files.is_empty() {
        return Err(ManglarError::Raster(format!(
            "no dated GeoTIFF files in {}",
            dir.display()
        )));
    }
    log::info!("reading {} dated rasters from {}", files.len(), dir.display());

    let first = Dataset::open(&files[0].1)?;
    let (width, height) = first.raster_size();
    let geo_transform = first.geo_transform()?;
    let (latitude, longitude) = coordinate_axes(&geo_transform, width, height);
    drop(first);

    let count = files.len();
    let mut temperature = Array3::<f32>::zeros((height, width, count));
    let mut ndvi = Array3::<f32>::zeros((height, width, count));
    let mut time = Vec::with_capacity(count);

    for (t, (date, path)) in files.iter().enumerate() {
        let dataset = Dataset::open(path)?;
        if dataset.raster_size() != (width, height) {
            return Err(ManglarError::Raster(format!(
                "{} is {:?}, expected {:?}",
                path.display(),
                dataset.raster_size(),
                (width, height)
            )));
        }
        if (dataset.raster_count() as usize) < NDVI_BAND {
            return Err(ManglarError::Raster(format!(
                "{} has {} bands, need at least {}",
                path.display(),
                dataset.raster_count(),
                NDVI_BAND
            )));
        }
        log::debug!("stacking {} at slot {}", path.display(), t);
        temperature
            .slice_mut(s![.., .., t])
            .assign(&read_band(&dataset, TEMPERATURE_BAND)?);
        ndvi.slice_mut(s![.., .., t])
            .assign(&read_band(&dataset, NDVI_BAND)?);
        time.push(*date);
    }

    convert_and_mask(&mut temperature, &mut ndvi);

    Ok(SiteStacks {
        temperature: RasterStack {
            data: temperature,
            latitude: latitude.clone(),
            longitude: longitude.clone(),
            time: time.clone(),
        },
        ndvi: RasterStack {
            data: ndvi,
            latitude,
            longitude,
            time,
        },
    })
}

/// GeoTIFFs in `dir` carrying a YYYY-MM-DD acquisition date in the file
/// name, sorted by date. Files without a parsable date are skipped.
fn dated_rasters(dir: &Path) -> ManglarResult<Vec<(NaiveDate, PathBuf)>> {
    let date_pattern = Regex::new(r"(\d{4}-\d{2}-\d{2})")
        .map_err(|e| ManglarError::Raster(format!("date pattern: {}", e)))?;

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_tiff = path
            .extension()
            .map(|e| {
                e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff")
            })
            .unwrap_or(false);
        if !is_tiff {
            continue;
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        match date_pattern
            .captures(&stem)
            .and_then(|c| c.get(1))
            .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok())
        {
            Some(date) => files.push((date, path)),
            None => log::warn!("skipping {} (no acquisition date in name)", path.display()),
        }
    }
    files.sort_by_key(|(date, _)| *date);
    Ok(files)
}

fn read_band(dataset: &Dataset, band: usize) -> ManglarResult<RasterPlane> {
    let (width, height) = dataset.raster_size();
    let rasterband = dataset.rasterband(band as isize)?;
    let data = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;
    Array2::from_shape_vec((height, width), data.data)
        .map_err(|e| ManglarError::Raster(format!("band {} shape: {}", band, e)))
}

/// Latitude (descending from the top edge) and longitude (ascending from
/// the left edge) axes spanning the raster bounds.
fn coordinate_axes(geo_transform: &[f64; 6], width: usize, height: usize) -> (Vec<f64>, Vec<f64>) {
    let left = geo_transform[0];
    let right = geo_transform[0] + width as f64 * geo_transform[1];
    let top = geo_transform[3];
    let bottom = geo_transform[3] + height as f64 * geo_transform[5];

    let longitude = linspace(left, right, width);
    let mut latitude = linspace(bottom, top, height);
    latitude.reverse();
    (latitude, longitude)
}

fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![start];
    }
    let step = (stop - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Kelvin to Celsius plus the NDVI quality mask, applied to both cubes.
pub(crate) fn convert_and_mask(temperature: &mut RasterCube, ndvi: &mut RasterCube) {
    temperature.mapv_inplace(|v| v - KELVIN_OFFSET);
    ndarray::Zip::from(&mut *temperature)
        .and(&*ndvi)
        .for_each(|t, &n| {
            if is_invalid_ndvi(n) {
                *t = f32::NAN;
            }
        });
    ndvi.mapv_inplace(|v| if is_invalid_ndvi(v) { f32::NAN } else { v });
}

fn is_invalid_ndvi(v: f32) -> bool {
    v == NDVI_SENTINEL || v > NDVI_LIMIT || v < -NDVI_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_coordinate_axes_span_the_bounds() {
        let gt = [-75.0, 0.1, 0.0, 11.0, 0.0, -0.1];
        let (latitude, longitude) = coordinate_axes(&gt, 5, 4);

        assert_eq!(longitude.len(), 5);
        assert_relative_eq!(longitude[0], -75.0);
        assert_relative_eq!(longitude[4], -74.5);

        assert_eq!(latitude.len(), 4);
        assert_relative_eq!(latitude[0], 11.0);
        assert_relative_eq!(latitude[3], 10.6);
        assert!(latitude.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_mask_hits_sentinel_and_out_of_range_in_both_cubes() {
        let mut temperature = Array3::from_shape_vec(
            (1, 4, 1),
            vec![300.0, 301.0, 302.0, 303.0],
        )
        .unwrap();
        let mut ndvi =
            Array3::from_shape_vec((1, 4, 1), vec![0.4, NDVI_SENTINEL, 2.0, -1.6]).unwrap();

        convert_and_mask(&mut temperature, &mut ndvi);

        assert_relative_eq!(temperature[[0, 0, 0]], 300.0 - 273.15, epsilon = 1e-4);
        assert_relative_eq!(ndvi[[0, 0, 0]], 0.4);
        for col in 1..4 {
            assert!(temperature[[0, col, 0]].is_nan(), "temp col {}", col);
            assert!(ndvi[[0, col, 0]].is_nan(), "ndvi col {}", col);
        }
    }

    #[test]
    fn test_valid_extremes_survive_the_mask() {
        let mut temperature =
            Array3::from_shape_vec((1, 2, 1), vec![273.15, 273.15]).unwrap();
        let mut ndvi = Array3::from_shape_vec((1, 2, 1), vec![1.5, -1.5]).unwrap();
        convert_and_mask(&mut temperature, &mut ndvi);
        assert_relative_eq!(ndvi[[0, 0, 0]], 1.5);
        assert_relative_eq!(ndvi[[0, 1, 0]], -1.5);
        assert_relative_eq!(temperature[[0, 0, 0]], 0.0);
    }

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(0.0, 1.0, 11);
        assert_eq!(v.len(), 11);
        assert_relative_eq!(v[0], 0.0);
        assert_relative_eq!(v[10], 1.0);
        assert_relative_eq!(v[5], 0.5);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let result = read_site_stacks("/nonexistent/raster/dir");
        assert!(result.is_err());
    }
}
