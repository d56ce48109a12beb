//! Labeled-cube NetCDF writer
//!
//! Serializes an assembled raster stack to a NetCDF file with named
//! (latitude, longitude, time) dimensions and coordinate variables, so the
//! products can be reopened by any labeled-array tooling. Time is encoded
//! as days since the Unix epoch.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::io::raster::{RasterStack, SiteStacks};
use crate::types::{ManglarError, ManglarResult};

/// Description attribute written on the NDVI product
pub const NDVI_DESCRIPTION: &str =
    "NDVI obtained from LANDSAT images from 1996 to 2021 on GEE.";
/// Description attribute written on the surface-temperature product
pub const TEMPERATURE_DESCRIPTION: &str =
    "Surface Temperature from STBAND from LANDSAT images (1996 to 2021).";
/// Unit attribute written on the surface-temperature product
pub const TEMPERATURE_UNIT: &str = "°C";

/// Write one variable's cube to `path` with full coordinate labeling.
///
/// The data variable is stored as f32 on (latitude, longitude, time) with a
/// NaN fill value, a `description` attribute, and an optional `unit`
/// attribute. Time steps are stored as integer days since 1970-01-01.
pub fn write_cube(
    path: &Path,
    name: &str,
    stack: &RasterStack,
    description: &str,
    unit: Option<&str>,
) -> ManglarResult<()> {
    let (n_lat, n_lon, n_time) = stack.data.dim();
    if n_lat != stack.latitude.len()
        || n_lon != stack.longitude.len()
        || n_time != stack.time.len()
    {
        return Err(ManglarError::Raster(format!(
            "cube shape ({}, {}, {}) does not match coordinate lengths ({}, {}, {})",
            n_lat,
            n_lon,
            n_time,
            stack.latitude.len(),
            stack.longitude.len(),
            stack.time.len()
        )));
    }

    let mut file = netcdf::create(path)?;
    file.add_dimension("latitude", n_lat)?;
    file.add_dimension("longitude", n_lon)?;
    file.add_dimension("time", n_time)?;

    let mut latitude = file.add_variable::<f64>("latitude", &["latitude"])?;
    latitude.put_values(&stack.latitude, ..)?;

    let mut longitude = file.add_variable::<f64>("longitude", &["longitude"])?;
    longitude.put_values(&stack.longitude, ..)?;

    let days = days_since_epoch(&stack.time);
    let mut time = file.add_variable::<i64>("time", &["time"])?;
    time.put_attribute("units", "days since 1970-01-01")?;
    time.put_attribute("calendar", "proleptic_gregorian")?;
    time.put_values(&days, ..)?;

    let mut var = file.add_variable::<f32>(name, &["latitude", "longitude", "time"])?;
    var.set_fill_value(f32::NAN)?;
    var.put_attribute("description", description)?;
    if let Some(unit) = unit {
        var.put_attribute("unit", unit)?;
    }

    // Cubes assembled by the raster reader are contiguous; anything else
    // gets flattened in logical order first.
    let owned;
    let values = match stack.data.as_slice() {
        Some(values) => values,
        None => {
            owned = stack.data.iter().copied().collect::<Vec<f32>>();
            owned.as_slice()
        }
    };
    var.put_values(values, ..)?;

    log::info!(
        "wrote {} ({} x {} x {}) to {}",
        name,
        n_lat,
        n_lon,
        n_time,
        path.display()
    );
    Ok(())
}

/// Write both site products under `out_dir` as `{site}_ndvi.nc` and
/// `{site}_temperature.nc`, returning the two paths in that order.
pub fn write_site_products(
    site: &str,
    stacks: &SiteStacks,
    out_dir: &Path,
) -> ManglarResult<(PathBuf, PathBuf)> {
    let ndvi_path = out_dir.join(format!("{}_ndvi.nc", site));
    write_cube(&ndvi_path, "NDVI", &stacks.ndvi, NDVI_DESCRIPTION, None)?;

    let temperature_path = out_dir.join(format!("{}_temperature.nc", site));
    write_cube(
        &temperature_path,
        "Surface Temperature",
        &stacks.temperature,
        TEMPERATURE_DESCRIPTION,
        Some(TEMPERATURE_UNIT),
    )?;

    Ok((ndvi_path, temperature_path))
}

fn days_since_epoch(dates: &[NaiveDate]) -> Vec<i64> {
    let epoch = NaiveDate::default();
    dates.iter().map(|date| (*date - epoch).num_days()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn sample_stack() -> RasterStack {
        let mut data = Array3::from_elem((2, 3, 2), 0.0f32);
        for (i, value) in data.iter_mut().enumerate() {
            *value = i as f32;
        }
        data[[1, 2, 0]] = f32::NAN;
        RasterStack {
            data,
            latitude: vec![11.05, 11.04],
            longitude: vec![-74.86, -74.85, -74.84],
            time: vec![
                NaiveDate::from_ymd_opt(1996, 1, 13).unwrap(),
                NaiveDate::from_ymd_opt(1996, 2, 14).unwrap(),
            ],
        }
    }

    #[test]
    fn round_trips_values_and_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ndvi.nc");
        let stack = sample_stack();
        write_cube(&path, "NDVI", &stack, NDVI_DESCRIPTION, None).unwrap();

        let file = netcdf::open(&path).unwrap();
        let var = file.variable("NDVI").unwrap();
        let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        assert_eq!(dims, vec![2, 3, 2]);

        let values = var.get_values::<f32, _>(..).unwrap();
        let expected = stack.data.as_slice().unwrap();
        assert_eq!(values.len(), expected.len());
        for (got, want) in values.iter().zip(expected) {
            if want.is_nan() {
                assert!(got.is_nan());
            } else {
                assert_eq!(got, want);
            }
        }

        let latitude = file.variable("latitude").unwrap();
        assert_eq!(latitude.get_values::<f64, _>(..).unwrap(), stack.latitude);
        let longitude = file.variable("longitude").unwrap();
        assert_eq!(longitude.get_values::<f64, _>(..).unwrap(), stack.longitude);
    }

    #[test]
    fn encodes_time_as_days_since_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ndvi.nc");
        write_cube(&path, "NDVI", &sample_stack(), NDVI_DESCRIPTION, None).unwrap();

        let file = netcdf::open(&path).unwrap();
        let time = file.variable("time").unwrap();
        let days = time.get_values::<i64, _>(..).unwrap();
        assert_eq!(days, vec![9508, 9540]);
    }

    #[test]
    fn rejects_mismatched_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.nc");
        let mut stack = sample_stack();
        stack.latitude.pop();
        let err = write_cube(&path, "NDVI", &stack, NDVI_DESCRIPTION, None).unwrap_err();
        assert!(matches!(err, ManglarError::Raster(_)));
    }

    #[test]
    fn site_products_follow_naming_convention() {
        let dir = tempfile::tempdir().unwrap();
        let stacks = SiteStacks {
            temperature: sample_stack(),
            ndvi: sample_stack(),
        };
        let (ndvi, temperature) =
            write_site_products("mallorquin", &stacks, dir.path()).unwrap();
        assert!(ndvi.ends_with("mallorquin_ndvi.nc"));
        assert!(temperature.ends_with("mallorquin_temperature.nc"));
        assert!(ndvi.exists());
        assert!(temperature.exists());
    }

    #[test]
    fn days_since_epoch_handles_epoch_and_later() {
        let dates = vec![
            NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(1970, 1, 31).unwrap(),
            NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
        ];
        assert_eq!(days_since_epoch(&dates), vec![0, 30, 18992]);
    }
}
