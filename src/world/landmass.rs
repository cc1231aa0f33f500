use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Vertex proximity (degrees, per axis) that counts as "near land".
pub const NEAR_LAND_THRESHOLD_DEG: f64 = 0.1;

/// Land geometry the simulation queries once per tick.
///
/// Coordinates are `(lon, lat)` in degrees with `lon` in [-180, 180].
pub trait Landmass {
    /// Whether the point lies inside any land polygon.
    fn contains(&self, lon: f64, lat: f64) -> bool;

    /// Whether any polygon vertex lies within `threshold` degrees of the
    /// point on both axes.
    fn is_near(&self, lon: f64, lat: f64, threshold: f64) -> bool;

    /// Elevation in metres of the named terrain feature under the point,
    /// or 0 when there is none.
    fn terrain_elevation(&self, lon: f64, lat: f64) -> f64 {
        terrain_elevation(lon, lat)
    }
}

/// A planet with no land at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOcean;

impl Landmass for OpenOcean {
    fn contains(&self, _lon: f64, _lat: f64) -> bool {
        false
    }

    fn is_near(&self, _lon: f64, _lat: f64, _threshold: f64) -> bool {
        false
    }
}

/// Even-odd ray casting test against a single closed ring.
pub fn ring_contains(ring: &[[f64; 2]], lon: f64, lat: f64) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// One land polygon: an outer ring followed by optional holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandPolygon {
    #[serde(default)]
    pub name: String,
    pub rings: Vec<Vec<[f64; 2]>>,
}

impl LandPolygon {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        // Even-odd across all rings so holes subtract from the outer ring.
        self.rings
            .iter()
            .filter(|ring| ring_contains(ring, lon, lat))
            .count()
            % 2
            == 1
    }

    fn vertices(&self) -> impl Iterator<Item = &[f64; 2]> {
        self.rings.iter().flatten()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LandmassError {
    #[error("cannot read landmass file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid landmass JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("polygon '{name}' has a ring with fewer than 3 vertices")]
    DegenerateRing { name: String },
}

/// Land defined by a list of polygons, typically loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonLandmass {
    pub polygons: Vec<LandPolygon>,
}

impl PolygonLandmass {
    pub fn new(polygons: Vec<LandPolygon>) -> Result<Self, LandmassError> {
        for polygon in &polygons {
            if polygon.rings.iter().any(|ring| ring.len() < 3) {
                return Err(LandmassError::DegenerateRing {
                    name: polygon.name.clone(),
                });
            }
        }
        Ok(Self { polygons })
    }

    /// Load polygons from a JSON array of `{ "name": ..., "rings": [[[lon, lat], ...]] }`.
    pub fn from_file(path: &Path) -> Result<Self, LandmassError> {
        let content = std::fs::read_to_string(path).map_err(|source| LandmassError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content, path)
    }

    pub fn from_json_str(content: &str, source_path: &Path) -> Result<Self, LandmassError> {
        let polygons: Vec<LandPolygon> =
            serde_json::from_str(content).map_err(|source| LandmassError::Parse {
                path: source_path.to_path_buf(),
                source,
            })?;
        Self::new(polygons)
    }
}

impl Landmass for PolygonLandmass {
    fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygons.iter().any(|p| p.contains(lon, lat))
    }

    fn is_near(&self, lon: f64, lat: f64, threshold: f64) -> bool {
        self.polygons.iter().flat_map(|p| p.vertices()).any(|&[vlon, vlat]| {
            (vlon - lon).abs() < threshold && (vlat - lat).abs() < threshold
        })
    }
}

/// A named mountain range or island that disrupts a storm's core.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainFeature {
    pub name: &'static str,
    pub elevation_m: f64,
    pub ring: Vec<[f64; 2]>,
}

impl TerrainFeature {
    fn new(name: &'static str, elevation_m: f64, ring: &[[f64; 2]]) -> Self {
        Self {
            name,
            elevation_m,
            ring: ring.to_vec(),
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        ring_contains(&self.ring, lon, lat)
    }
}

/// Terrain features, built once per process.
pub static TERRAIN_FEATURES: LazyLock<Vec<TerrainFeature>> = LazyLock::new(|| {
    vec![
        TerrainFeature::new(
            "taiwan_mountains",
            265.0,
            &[[120.8, 22.3], [121.0, 24.0], [121.4, 24.5], [121.5, 23.5]],
        ),
        TerrainFeature::new(
            "luzon_cordillera",
            185.0,
            &[[120.6, 15.9], [120.5, 16.5], [121.2, 18.2], [121.8, 18.0]],
        ),
        TerrainFeature::new(
            "tibetan_plateau",
            275.0,
            &[[75.0, 36.0], [97.4, 29.0], [86.5, 27.7], [79.0, 30.6]],
        ),
        TerrainFeature::new(
            "yungui_plateau",
            205.0,
            &[[95.0, 31.6], [104.4, 29.0], [108.5, 21.7], [95.0, 24.6]],
        ),
        TerrainFeature::new(
            "hainan_island",
            0.0,
            &[
                [111.05, 20.14],
                [110.87, 19.98],
                [110.69, 19.40],
                [110.44, 18.77],
                [109.94, 18.43],
                [109.18, 18.35],
                [108.68, 18.93],
                [108.82, 19.49],
                [109.2, 19.99],
                [109.77, 20.08],
                [110.33, 20.01],
                [110.8, 20.07],
            ],
        ),
        TerrainFeature::new(
            "honshu",
            0.0,
            &[[131.60, 34.20], [136.23, 34.91], [140.92, 37.14]],
        ),
        TerrainFeature::new(
            "kyushu",
            0.0,
            &[[131.20, 31.55], [130.30, 33.48], [131.09, 33.42], [131.50, 33.52], [131.20, 33.48]],
        ),
    ]
});

/// Elevation of the first terrain feature containing the point, else 0.
pub fn terrain_elevation(lon: f64, lat: f64) -> f64 {
    TERRAIN_FEATURES
        .iter()
        .find(|f| f.contains(lon, lat))
        .map_or(0.0, |f| f.elevation_m)
}
