//! Cloud Earth-observation platform client
//!
//! Blocking HTTP access to the imagery backend behind the study: fetch the
//! lagoon feature collection, list scene acquisition dates per Landsat
//! mission over a site, and render true-color composites to PNG bytes.
//! Authentication is a bearer token taken from the environment; every
//! request is a single attempt with no retries.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::types::{BoundingBox, ManglarError, ManglarResult};

/// Environment variable holding the platform bearer token
pub const TOKEN_VAR: &str = "MANGLAR_EE_TOKEN";
/// Production platform endpoint
pub const PLATFORM_URL: &str = "https://earthengine.googleapis.com/v1";
/// Asset path of the study's lagoon forest collection
pub const FOREST_ASSET: &str = "projects/ee-sebnarvaez-mangroves/assets/forests";

/// One satellite mission contributing scenes to the composite record
#[derive(Debug, Clone, Copy)]
pub struct Mission {
    pub name: &'static str,
    /// Surface-reflectance collection identifier on the platform
    pub collection: &'static str,
    /// First and last acquisition years the study pulled from this mission
    pub years: (i32, i32),
    /// Red, green, blue band names in this mission's numbering
    pub rgb_bands: [&'static str; 3],
}

/// Landsat missions covering the 1996-2021 study period, in order
pub const MISSIONS: [Mission; 3] = [
    Mission {
        name: "Landsat 5 TM",
        collection: "LANDSAT/LT05/C02/T1_L2",
        years: (1996, 1998),
        rgb_bands: ["SR_B3", "SR_B2", "SR_B1"],
    },
    Mission {
        name: "Landsat 7 ETM+",
        collection: "LANDSAT/LE07/C02/T1_L2",
        years: (1999, 2013),
        rgb_bands: ["SR_B3", "SR_B2", "SR_B1"],
    },
    Mission {
        name: "Landsat 8 OLI",
        collection: "LANDSAT/LC08/C02/T1_L2",
        years: (2014, 2021),
        rgb_bands: ["SR_B4", "SR_B3", "SR_B2"],
    },
];

/// RGB stretch applied to rendered composites
#[derive(Debug, Clone, Copy)]
pub struct Visualization {
    pub min: f64,
    pub max: f64,
    pub gamma: f64,
}

impl Default for Visualization {
    fn default() -> Self {
        Visualization {
            min: 0.0,
            max: 0.3,
            gamma: 1.3,
        }
    }
}

/// GeoJSON feature collection as served by the platform
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// First feature whose `key` property matches.
    pub fn find(&self, key: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.properties.key == key)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    pub properties: FeatureProperties,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureProperties {
    /// Site key, e.g. "mallorquin"
    pub key: String,
}

/// Site geometry, carried only as deeply as the bounding box needs
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

impl Geometry {
    /// Axis-aligned bounds over every position in the geometry.
    pub fn bounding_box(&self) -> ManglarResult<BoundingBox> {
        let mut bbox: Option<BoundingBox> = None;
        for position in self.positions() {
            if position.len() < 2 {
                continue;
            }
            let (lon, lat) = (position[0], position[1]);
            match bbox.as_mut() {
                Some(b) => {
                    b.min_lon = b.min_lon.min(lon);
                    b.max_lon = b.max_lon.max(lon);
                    b.min_lat = b.min_lat.min(lat);
                    b.max_lat = b.max_lat.max(lat);
                }
                None => {
                    bbox = Some(BoundingBox {
                        min_lon: lon,
                        max_lon: lon,
                        min_lat: lat,
                        max_lat: lat,
                    });
                }
            }
        }
        bbox.ok_or_else(|| ManglarError::Platform("geometry has no coordinates".to_string()))
    }

    fn positions(&self) -> Box<dyn Iterator<Item = &[f64]> + '_> {
        match self {
            Geometry::Polygon(rings) => Box::new(rings.iter().flatten().map(Vec::as_slice)),
            Geometry::MultiPolygon(polygons) => {
                Box::new(polygons.iter().flatten().flatten().map(Vec::as_slice))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SceneListing {
    dates: Vec<NaiveDate>,
}

/// Blocking client for the imagery platform
pub struct PlatformClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl PlatformClient {
    /// Client against the production endpoint, token from [`TOKEN_VAR`].
    pub fn from_env() -> ManglarResult<Self> {
        let token = std::env::var(TOKEN_VAR)
            .map_err(|_| ManglarError::Platform(format!("{} is not set", TOKEN_VAR)))?;
        Self::new(PLATFORM_URL, token)
    }

    /// Client against an explicit endpoint, e.g. a local stub in tests.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> ManglarResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(PlatformClient {
            client,
            base_url,
            token: token.into(),
        })
    }

    /// Fetch a feature collection asset as GeoJSON.
    pub fn fetch_feature_collection(&self, asset: &str) -> ManglarResult<FeatureCollection> {
        let url = format!("{}/{}:getFeatures", self.base_url, asset);
        log::debug!("fetching feature collection {}", asset);
        let response = self.client.get(&url).bearer_auth(&self.token).send()?;
        if !response.status().is_success() {
            return Err(ManglarError::Platform(format!(
                "feature collection fetch failed: {}",
                response.status()
            )));
        }
        Ok(response.json()?)
    }

    /// Acquisition dates with a scene over `region`, sorted and deduplicated.
    pub fn list_scene_dates(
        &self,
        mission: &Mission,
        region: &BoundingBox,
    ) -> ManglarResult<Vec<NaiveDate>> {
        let url = format!("{}/{}:listScenes", self.base_url, mission.collection);
        log::debug!("listing {} scenes over {}", mission.name, bbox_param(region));
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[
                ("region", bbox_param(region)),
                ("start", format!("{}-01-01", mission.years.0)),
                ("end", format!("{}-12-31", mission.years.1)),
            ])
            .send()?;
        if !response.status().is_success() {
            return Err(ManglarError::Platform(format!(
                "scene listing for {} failed: {}",
                mission.name,
                response.status()
            )));
        }
        let listing: SceneListing = response.json()?;
        let mut dates = listing.dates;
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }

    /// Rendered RGB composite for one acquisition date, as PNG bytes.
    pub fn fetch_composite(
        &self,
        mission: &Mission,
        date: NaiveDate,
        region: &BoundingBox,
        vis: &Visualization,
    ) -> ManglarResult<Vec<u8>> {
        let url = format!("{}/{}:renderComposite", self.base_url, mission.collection);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[
                ("date", date.to_string()),
                ("region", bbox_param(region)),
                ("bands", mission.rgb_bands.join(",")),
                ("min", vis.min.to_string()),
                ("max", vis.max.to_string()),
                ("gamma", vis.gamma.to_string()),
                ("format", "png".to_string()),
            ])
            .send()?;
        if !response.status().is_success() {
            return Err(ManglarError::Platform(format!(
                "composite render for {} on {} failed: {}",
                mission.name,
                date,
                response.status()
            )));
        }
        Ok(response.bytes()?.to_vec())
    }
}

/// Region query parameter: west,south,east,north in degrees.
fn bbox_param(bbox: &BoundingBox) -> String {
    format!(
        "{},{},{},{}",
        bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat
    )
}
