//! I/O modules for site rasters, NetCDF products, and platform imagery

pub mod imagery;
pub mod netcdf;
pub mod raster;

// Re-export main types
pub use imagery::{FeatureCollection, Mission, PlatformClient, Visualization, MISSIONS};
pub use netcdf::{write_cube, write_site_products};
pub use raster::{read_site_stacks, RasterStack, SiteStacks};
