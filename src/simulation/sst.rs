//! Synthetic sea-surface temperature: a latitude/season profile shifted by
//! the global temperature anomaly and perturbed by fixed ocean currents.

use std::f64::consts::PI;

use crate::simulation::geo::shortest_longitude_distance;

/// Global mean surface temperature (K) at which the anomaly is zero.
pub const BASELINE_GLOBAL_TEMP_K: f64 = 289.0;

const MIN_SST: f64 = 0.0;
const MAX_SST: f64 = 60.0;

/// Latitude band (either side of the equator) with a flat SST profile.
const TROPICAL_BAND_LAT: f64 = 12.0;
const TROPICAL_PEAK_SST: f64 = 32.0;

/// A named ocean current modelled as an anisotropic Gaussian SST anomaly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OceanCurrent {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    /// Peak anomaly in °C (negative for cold currents)
    pub max_effect: f64,
    pub sigma_lat: f64,
    pub sigma_lon: f64,
}

impl OceanCurrent {
    pub fn influence(&self, lat: f64, lon: f64) -> f64 {
        let d_lon = shortest_longitude_distance(lon, self.lon);
        let d_lat = lat - self.lat;
        let exponent = -(d_lon * d_lon / (2.0 * self.sigma_lon * self.sigma_lon)
            + d_lat * d_lat / (2.0 * self.sigma_lat * self.sigma_lat));
        self.max_effect * exponent.exp()
    }
}

/// Currents whose shape does not depend on the season.
pub const FIXED_CURRENTS: [OceanCurrent; 7] = [
    OceanCurrent { name: "california", lat: 30.0, lon: -125.0, max_effect: -3.0, sigma_lat: 15.0, sigma_lon: 50.0 },
    OceanCurrent { name: "gulf_stream", lat: 35.0, lon: -60.0, max_effect: 4.0, sigma_lat: 20.0, sigma_lon: 25.0 },
    OceanCurrent { name: "canary", lat: 30.0, lon: -20.0, max_effect: -4.0, sigma_lat: 15.0, sigma_lon: 40.0 },
    OceanCurrent { name: "kuroshio", lat: 27.0, lon: 140.0, max_effect: 1.0, sigma_lat: 5.0, sigma_lon: 20.0 },
    OceanCurrent { name: "gulf_of_mexico", lat: 25.0, lon: -90.0, max_effect: 3.0, sigma_lat: 7.0, sigma_lon: 10.0 },
    OceanCurrent { name: "somali", lat: 10.0, lon: 50.0, max_effect: -4.5, sigma_lat: 10.0, sigma_lon: 15.0 },
    OceanCurrent { name: "benguela", lat: -25.0, lon: 5.0, max_effect: -6.0, sigma_lat: 15.0, sigma_lon: 25.0 },
];

/// The South China Sea cold tongue strengthens and widens away from August.
pub fn south_china_sea_current(month: u32) -> OceanCurrent {
    let off_peak = (f64::from(month) - 8.0).abs();
    OceanCurrent {
        name: "south_china_sea",
        lat: 20.0,
        lon: 115.0,
        max_effect: -1.0 - 0.5 * off_peak,
        sigma_lat: 12.0,
        sigma_lon: 8.0 + off_peak,
    }
}

/// Sum of every current's anomaly at a point.
pub fn current_adjustment(lat: f64, lon: f64, month: u32) -> f64 {
    FIXED_CURRENTS
        .iter()
        .chain(std::iter::once(&south_china_sea_current(month)))
        .map(|current| current.influence(lat, lon))
        .sum()
}

/// Sea-surface temperature in °C at a point, clamped to [0, 60].
pub fn sst(lat: f64, lon: f64, month: u32, global_temp_k: f64) -> f64 {
    let anomaly = global_temp_k - BASELINE_GLOBAL_TEMP_K;
    let season = ((f64::from(month) - 8.0) * (PI / 6.0)).cos();
    let seasonal_modifier = if lat > 0.0 {
        2.7 + season * 1.9
    } else {
        2.0 - season * 1.3
    };

    let peak = TROPICAL_PEAK_SST + 0.6 * anomaly;
    let abs_lat = lat.abs();
    let base = if abs_lat < TROPICAL_BAND_LAT {
        peak
    } else {
        let decayed = peak - (abs_lat - TROPICAL_BAND_LAT) / seasonal_modifier
            + (abs_lat / 60.0).powf(1.6);
        decayed.max(10.0)
    };

    (base + current_adjustment(lat, lon, month)).clamp(MIN_SST, MAX_SST)
}
