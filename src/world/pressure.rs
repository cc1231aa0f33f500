use serde::{Deserialize, Serialize};

use crate::simulation::geo::{normalize_longitude, shortest_longitude_distance};

/// Background sea-level pressure in hPa before any cell contributes.
pub const BASE_PRESSURE_HPA: f64 = 1012.0;

/// Eastward displacement per tick, as a fraction of `velocity_x`.
const ADVECTION_SCALE_X: f64 = 0.3;
/// Northward displacement per tick, as a fraction of `velocity_y`.
const ADVECTION_SCALE_Y: f64 = 0.1;

/// One sinusoidal ripple superimposed on a cell's pressure contribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseLayer {
    pub offset_x: f64,
    pub offset_y: f64,
    pub freq_x: f64,
    pub freq_y: f64,
    pub amplitude: f64,
}

impl NoiseLayer {
    pub const fn new(offset_x: f64, offset_y: f64, freq_x: f64, freq_y: f64, amplitude: f64) -> Self {
        Self {
            offset_x,
            offset_y,
            freq_x,
            freq_y,
            amplitude,
        }
    }

    fn value(&self, lon: f64, lat: f64) -> f64 {
        ((lon + self.offset_x) / self.freq_x).sin()
            * ((lat + self.offset_y) / self.freq_y).cos()
            * self.amplitude
    }
}

/// Horizontal-scale oscillation applied to cells that carry a base sigma.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillation {
    pub phase: f64,
    pub speed: f64,
    pub amount: f64,
}

impl Oscillation {
    pub const NONE: Oscillation = Oscillation {
        phase: 0.0,
        speed: 0.0,
        amount: 0.0,
    };
}

/// An anisotropic Gaussian pressure anomaly: positive strength is a high,
/// negative a low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureCell {
    /// Longitude of the centre in degrees, within [-180, 180)
    pub x: f64,
    /// Centre longitude accumulated without wrapping; the noise layers are
    /// anchored to this so they drift smoothly across the dateline
    pub unwrapped_x: f64,
    /// Latitude of the centre in degrees
    pub y: f64,
    /// East-west e-folding scale in degrees
    pub sigma_x: f64,
    /// North-south e-folding scale in degrees
    pub sigma_y: f64,
    /// When set, `sigma_x` breathes around this value with the oscillation
    pub base_sigma_x: Option<f64>,
    /// Peak anomaly in hPa
    pub strength: f64,
    pub base_strength: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub oscillation: Oscillation,
    pub noise_layers: Vec<NoiseLayer>,
}

impl PressureCell {
    /// A stationary cell with a fixed horizontal scale and no noise.
    pub fn new(x: f64, y: f64, sigma_x: f64, sigma_y: f64, strength: f64) -> Self {
        Self {
            x,
            unwrapped_x: x,
            y,
            sigma_x,
            sigma_y,
            base_sigma_x: None,
            strength,
            base_strength: strength,
            velocity_x: 0.0,
            velocity_y: 0.0,
            oscillation: Oscillation::NONE,
            noise_layers: Vec::new(),
        }
    }

    /// Let `sigma_x` breathe around `base` with the cell's oscillation.
    pub fn with_base_sigma_x(mut self, base: f64) -> Self {
        self.base_sigma_x = Some(base);
        self.sigma_x = base;
        self
    }

    pub fn with_velocity(mut self, velocity_x: f64, velocity_y: f64) -> Self {
        self.velocity_x = velocity_x;
        self.velocity_y = velocity_y;
        self
    }

    pub fn with_oscillation(mut self, oscillation: Oscillation) -> Self {
        self.oscillation = oscillation;
        self
    }

    pub fn with_noise(mut self, noise_layers: Vec<NoiseLayer>) -> Self {
        self.noise_layers = noise_layers;
        self
    }

    pub fn is_high(&self) -> bool {
        self.strength > 0.0
    }

    /// Pressure anomaly (Gaussian + noise) this cell adds at a point.
    pub fn contribution(&self, lon: f64, lat: f64) -> f64 {
        let dx = shortest_longitude_distance(lon, self.x);
        let dy = lat - self.y;
        let exponent = -(dx * dx / (2.0 * self.sigma_x * self.sigma_x)
            + dy * dy / (2.0 * self.sigma_y * self.sigma_y));
        let gaussian = exponent.exp() * self.strength;

        // Unwrap the sample longitude around the cell centre so the noise is
        // continuous across the dateline in space and in time.
        let local_lon = self.unwrapped_x + dx;
        let noise: f64 = self
            .noise_layers
            .iter()
            .map(|layer| layer.value(local_lon, lat))
            .sum();

        gaussian + noise
    }

    /// Drift, oscillate, and (if the cell has a base scale) stretch.
    pub fn advance(&mut self) {
        self.unwrapped_x += self.velocity_x * ADVECTION_SCALE_X;
        self.x = normalize_longitude(self.unwrapped_x);
        self.y += self.velocity_y * ADVECTION_SCALE_Y;
        self.oscillation.phase += self.oscillation.speed;
        if let Some(base) = self.base_sigma_x {
            let stretch = self.oscillation.phase.sin() * self.oscillation.amount;
            self.sigma_x = base * (1.0 + stretch);
        }
    }
}

/// The full synthetic sea-level pressure field. Cells are created at seeding
/// and live for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PressureField {
    pub cells: Vec<PressureCell>,
}

impl PressureField {
    pub fn new(cells: Vec<PressureCell>) -> Self {
        Self { cells }
    }

    /// Sea-level pressure in hPa at a point.
    pub fn sample_at(&self, lon: f64, lat: f64) -> f64 {
        BASE_PRESSURE_HPA
            + self
                .cells
                .iter()
                .map(|cell| cell.contribution(lon, lat))
                .sum::<f64>()
    }

    /// Advance every cell by one tick.
    pub fn advance(&mut self) {
        for cell in &mut self.cells {
            cell.advance();
        }
    }

    /// Mean latitude of the high cells selected by `filter`, if any.
    pub fn mean_high_latitude(&self, filter: impl Fn(&PressureCell) -> bool) -> Option<f64> {
        let (sum, count) = self
            .cells
            .iter()
            .filter(|c| c.is_high() && filter(c))
            .fold((0.0, 0_u32), |(sum, count), c| (sum + c.y, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / f64::from(count))
        }
    }
}

/// Latitude poleward of which extratropical transition becomes possible.
/// Recomputed every tick from the field; never persisted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontalZone {
    pub latitude: f64,
}

impl Default for FrontalZone {
    fn default() -> Self {
        Self { latitude: 40.0 }
    }
}
