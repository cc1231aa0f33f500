use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Ocean basins a storm can be seeded in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basin {
    #[default]
    WestPacific,
    EastPacific,
    NorthAtlantic,
    NorthIndian,
    SouthPacific,
    SouthIndian,
    SouthAtlantic,
}

/// Inclusive degree range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Seeding window for a basin. Longitudes may exceed 180 (EPAC, NATL) and
/// are normalised once a point is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasinRegion {
    pub lon: Range,
    pub lat: Range,
}

impl BasinRegion {
    /// +1 for northern-hemisphere basins, -1 for southern.
    pub fn hemisphere_sign(&self) -> f64 {
        if self.lat.max > 0.0 { 1.0 } else { -1.0 }
    }
}

impl Basin {
    pub const ALL: [Basin; 7] = [
        Basin::WestPacific,
        Basin::EastPacific,
        Basin::NorthAtlantic,
        Basin::NorthIndian,
        Basin::SouthPacific,
        Basin::SouthIndian,
        Basin::SouthAtlantic,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Basin::WestPacific => "WPAC",
            Basin::EastPacific => "EPAC",
            Basin::NorthAtlantic => "NATL",
            Basin::NorthIndian => "NIO",
            Basin::SouthPacific => "SHEM",
            Basin::SouthIndian => "SIO",
            Basin::SouthAtlantic => "SATL",
        }
    }

    /// Two-letter basin prefix used in best-track records.
    pub fn atcf_prefix(&self) -> &'static str {
        match self {
            Basin::WestPacific => "WP",
            Basin::EastPacific => "EP",
            Basin::NorthAtlantic => "AL",
            Basin::NorthIndian => "IO",
            Basin::SouthPacific | Basin::SouthIndian => "SH",
            Basin::SouthAtlantic => "SL",
        }
    }

    /// Parse a basin code (case-insensitive).
    pub fn parse(code: &str) -> Option<Basin> {
        let code = code.trim();
        Basin::ALL
            .into_iter()
            .find(|b| b.code().eq_ignore_ascii_case(code))
    }

    /// Parse a basin code, falling back to the West Pacific for unknown codes.
    pub fn from_code(code: &str) -> Basin {
        Basin::parse(code).unwrap_or_else(|| {
            warn!(code, fallback = "WPAC", "Unknown basin code");
            Basin::WestPacific
        })
    }

    pub fn region(&self) -> BasinRegion {
        match self {
            Basin::WestPacific => BasinRegion { lon: Range::new(100.0, 180.0), lat: Range::new(5.0, 25.0) },
            Basin::EastPacific => BasinRegion { lon: Range::new(180.0, 260.0), lat: Range::new(5.0, 20.0) },
            Basin::NorthAtlantic => BasinRegion { lon: Range::new(260.0, 350.0), lat: Range::new(6.0, 32.0) },
            Basin::NorthIndian => BasinRegion { lon: Range::new(60.0, 100.0), lat: Range::new(5.0, 25.0) },
            Basin::SouthPacific => BasinRegion { lon: Range::new(140.0, 200.0), lat: Range::new(-20.0, -10.0) },
            Basin::SouthIndian => BasinRegion { lon: Range::new(30.0, 140.0), lat: Range::new(-20.0, -10.0) },
            Basin::SouthAtlantic => BasinRegion { lon: Range::new(-50.0, 15.0), lat: Range::new(-25.0, -10.0) },
        }
    }
}

impl fmt::Display for Basin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
