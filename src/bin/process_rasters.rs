//! Convert each site's raster archive into labeled NetCDF cubes.
//!
//! Reads the dated GeoTIFF stack under `data/raster/{site}/` for every
//! monitoring site and writes `data/processed/{site}_ndvi.nc` and
//! `data/processed/{site}_temperature.nc`. Paths and the site list are
//! fixed by the study layout; there are no flags.

use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Env};
use log::info;

use manglar::io::netcdf::write_site_products;
use manglar::io::raster::read_site_stacks;

const SITES: [&str; 3] = ["mallorquin", "totumo", "virgen"];
const RASTER_DIR: &str = "data/raster";
const PROCESSED_DIR: &str = "data/processed";

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let out_dir = Path::new(PROCESSED_DIR);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    for site in SITES {
        let site_dir = Path::new(RASTER_DIR).join(site);
        info!("processing site '{}' from {}", site, site_dir.display());

        let stacks = read_site_stacks(&site_dir)
            .with_context(|| format!("reading rasters for '{}'", site))?;
        let (ndvi, temperature) = write_site_products(site, &stacks, out_dir)
            .with_context(|| format!("writing products for '{}'", site))?;

        info!(
            "finished '{}': {} and {}",
            site,
            ndvi.display(),
            temperature.display()
        );
    }

    Ok(())
}
