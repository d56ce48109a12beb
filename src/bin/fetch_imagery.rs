//! Download per-date true-color composites for every monitoring site.
//!
//! Authenticates to the imagery platform with the token in
//! `MANGLAR_EE_TOKEN`, looks each site up in the study's forest collection,
//! and walks the three Landsat missions' acquisition dates, writing one PNG
//! per site and date under `data/images/{site}/`. Failures on a single date
//! are logged and skipped; the batch keeps going.

use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Env};
use log::{info, warn};

use manglar::io::imagery::{PlatformClient, Visualization, FOREST_ASSET, MISSIONS};
use manglar::types::BoundingBox;

const IMAGE_DIR: &str = "data/images";

/// Display window per site (west, south, east, north)
const SITES: [(&str, BoundingBox); 3] = [
    (
        "mallorquin",
        BoundingBox {
            min_lon: -74.91404810273207,
            max_lon: -74.82934525005177,
            min_lat: 11.028868816913656,
            max_lat: 11.062596879860857,
        },
    ),
    (
        "totumo",
        BoundingBox {
            min_lon: -75.25896861605656,
            max_lon: -75.21347135428282,
            min_lat: 10.690516171754405,
            max_lat: 10.760405796055716,
        },
    ),
    (
        "virgen",
        BoundingBox {
            min_lon: -75.51173334636263,
            max_lon: -75.4639732791029,
            min_lat: 10.409937971541012,
            max_lat: 10.512366397279758,
        },
    ),
];

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let client = PlatformClient::from_env().context("creating platform client")?;
    let forests = client
        .fetch_feature_collection(FOREST_ASSET)
        .context("fetching the forest collection")?;
    let vis = Visualization::default();

    for (site, zoom) in SITES {
        let feature = forests
            .find(site)
            .with_context(|| format!("site '{}' missing from the forest collection", site))?;
        let roi = feature.geometry.bounding_box()?;

        let site_dir = Path::new(IMAGE_DIR).join(site);
        std::fs::create_dir_all(&site_dir)
            .with_context(|| format!("creating {}", site_dir.display()))?;

        for mission in &MISSIONS {
            let dates = client
                .list_scene_dates(mission, &roi)
                .with_context(|| format!("listing {} scenes over '{}'", mission.name, site))?;
            info!("{}: {} scenes from {}", site, dates.len(), mission.name);

            for date in dates {
                let path = site_dir.join(format!("{}.png", date));
                match client.fetch_composite(mission, date, &zoom, &vis) {
                    Ok(bytes) => {
                        std::fs::write(&path, bytes)
                            .with_context(|| format!("writing {}", path.display()))?;
                        info!("wrote {}", path.display());
                    }
                    Err(e) => {
                        // acquisition is best-effort batch retrieval
                        warn!("skipping {} {}: {}", site, date, e);
                    }
                }
            }
        }
    }

    Ok(())
}
