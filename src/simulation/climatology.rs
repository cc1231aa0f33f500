//! Climatological seeding of the pressure field and the derived frontal zone.
//!
//! Every named system is a fixed centre plus bounded jitter. Only the
//! distributions matter; two seeds never produce the same field.

use std::f64::consts::{PI, TAU};

use rand::prelude::*;

use crate::simulation::geo::normalize_longitude;
use crate::world::pressure::{FrontalZone, NoiseLayer, Oscillation, PressureCell, PressureField};

const STANDARD_NOISE: [NoiseLayer; 2] = [
    NoiseLayer::new(0.0, 0.0, 12.0, 12.0, 0.6),
    NoiseLayer::new(10.0, 5.0, 3.0, 5.0, 0.4),
];

const SOUTHERN_NOISE: [NoiseLayer; 2] = [
    NoiseLayer::new(0.0, 0.0, 12.0, 12.0, 0.3),
    NoiseLayer::new(10.0, 5.0, 3.0, 5.0, 0.2),
];

const SUBPOLAR_NOISE: [NoiseLayer; 2] = [
    NoiseLayer::new(0.0, 0.0, 15.0, 20.0, 0.8),
    NoiseLayer::new(30.0, 10.0, 6.0, 9.0, 0.4),
];

/// Highs between these latitudes anchor the northern subpolar belt.
const NH_SUBTROPICAL_BAND: (f64, f64) = (10.0, 45.0);
const SH_SUBTROPICAL_BAND: (f64, f64) = (-40.0, -10.0);

/// 1 in August, 0 in February.
pub fn seasonal_factor(month: u32) -> f64 {
    (((f64::from(month) - 8.0) * (PI / 6.0)).cos() + 1.0) / 2.0
}

fn jitter(rng: &mut impl Rng, span: f64) -> f64 {
    (rng.r#gen::<f64>() - 0.5) * span
}

fn uniform(rng: &mut impl Rng, low: f64, width: f64) -> f64 {
    low + rng.r#gen::<f64>() * width
}

fn oscillation(rng: &mut impl Rng, speed: (f64, f64), amount: (f64, f64)) -> Oscillation {
    Oscillation {
        phase: rng.r#gen::<f64>() * TAU,
        speed: uniform(rng, speed.0, speed.1),
        amount: uniform(rng, amount.0, amount.1),
    }
}

fn standard_oscillation(rng: &mut impl Rng) -> Oscillation {
    oscillation(rng, (0.025, 0.01), (0.25, 0.2))
}

fn standard_velocity(cell: PressureCell, rng: &mut impl Rng) -> PressureCell {
    let vx = jitter(rng, 0.5);
    let vy = jitter(rng, 0.4);
    cell.with_velocity(vx, vy)
}

/// A large blocking cell whose east-west scale oscillates.
fn blob(
    rng: &mut impl Rng,
    x: f64,
    y: f64,
    base_sigma_x: f64,
    sigma_y: f64,
    strength: f64,
) -> PressureCell {
    PressureCell::new(normalize_longitude(x), y, base_sigma_x, sigma_y, strength)
        .with_base_sigma_x(base_sigma_x)
        .with_oscillation(standard_oscillation(rng))
}

fn subpolar_belt(rng: &mut impl Rng, y: f64, sigma_y: f64, strength: f64) -> PressureCell {
    let velocity = (jitter(rng, 0.2), jitter(rng, 0.1));
    let osc = oscillation(rng, (0.015, 0.01), (0.15, 0.0));
    PressureCell::new(150.0, y, 250.0, sigma_y, strength)
        .with_base_sigma_x(250.0)
        .with_velocity(velocity.0, velocity.1)
        .with_oscillation(osc)
        .with_noise(SUBPOLAR_NOISE.to_vec())
}

/// Populate the climatological pressure field around a storm seeded at
/// `(origin_lat, origin_lon)` in `month`.
pub fn seed_pressure_field(
    origin_lat: f64,
    origin_lon: f64,
    month: u32,
    rng: &mut impl Rng,
) -> PressureField {
    let sf = seasonal_factor(month);
    let mut cells = Vec::with_capacity(24);

    // Equatorial trough
    let itcz_y = 2.0 + jitter(rng, 5.0);
    let itcz_sigma_y = uniform(rng, 10.0, 4.0);
    let itcz_strength = -uniform(rng, 10.0, 3.0);
    let itcz_velocity = (jitter(rng, 0.1), jitter(rng, 0.1));
    let itcz_osc = oscillation(rng, (0.01, 0.01), (0.1, 0.0));
    cells.push(
        PressureCell::new(140.0, itcz_y, 300.0, itcz_sigma_y, itcz_strength)
            .with_base_sigma_x(300.0)
            .with_velocity(itcz_velocity.0, itcz_velocity.1)
            .with_oscillation(itcz_osc)
            .with_noise(vec![
                NoiseLayer::new(0.0, 0.0, 20.0, 15.0, 0.5),
                NoiseLayer::new(50.0, 30.0, 5.0, 8.0, 0.2),
            ]),
    );

    // Western Pacific subtropical high
    let x = 150.0 + jitter(rng, 40.0);
    let y = 29.0 + jitter(rng, 8.0) + 12.0 * sf;
    let base = uniform(rng, 35.0, 30.0);
    let sigma_y = uniform(rng, 10.0, 15.0);
    let strength = uniform(rng, 12.0, 6.0);
    let velocity = (jitter(rng, 0.9), jitter(rng, 0.3));
    let osc = oscillation(rng, (0.02, 0.01), (0.2, 0.5));
    cells.push(
        PressureCell::new(normalize_longitude(x), y, base, sigma_y, strength)
            .with_base_sigma_x(base)
            .with_velocity(velocity.0, velocity.1)
            .with_oscillation(osc)
            .with_noise(vec![
                NoiseLayer::new(0.0, 0.0, 8.0, 8.0, 0.5),
                NoiseLayer::new(20.0, 15.0, 2.0, 3.0, 0.3),
            ]),
    );

    // Continental ridge extending off East Asia
    let x = 115.0 + jitter(rng, 35.0);
    let y = 31.0 + jitter(rng, 10.0) + 12.0 * sf;
    let base = uniform(rng, 30.0, 25.0);
    let sigma_y = uniform(rng, 15.0, 15.0);
    let strength = uniform(rng, 2.0, 16.0);
    let velocity = (jitter(rng, 1.5), jitter(rng, 1.6));
    let osc = oscillation(rng, (0.025, 0.01), (0.25, 0.3));
    cells.push(
        PressureCell::new(x, y, base, sigma_y, strength)
            .with_base_sigma_x(base)
            .with_velocity(velocity.0, velocity.1)
            .with_oscillation(osc)
            .with_noise(STANDARD_NOISE.to_vec()),
    );

    // Indian Ocean / Arabian lobe
    let x = 50.0 + jitter(rng, 15.0);
    let y = 28.0 + jitter(rng, 10.0) + 10.0 * sf;
    let base = uniform(rng, 30.0, 10.0);
    let sigma_y = uniform(rng, 10.0, 8.0);
    let strength = uniform(rng, 10.0, 8.0);
    let cell = blob(rng, x, y, base, sigma_y, strength).with_noise(STANDARD_NOISE.to_vec());
    cells.push(standard_velocity(cell, rng));

    // North Pacific (Hawaiian) high
    let x = -140.0 + jitter(rng, 40.0);
    let y = 20.0 + jitter(rng, 20.0) + 6.0 * sf;
    let base = uniform(rng, 40.0, 25.0);
    let sigma_y = uniform(rng, 13.0, 13.0);
    let strength = uniform(rng, 20.0, 10.0);
    let osc = oscillation(rng, (0.005, 0.01), (0.25, 0.2));
    let noise = vec![
        NoiseLayer::new(0.0, 0.0, 12.0, 12.0, rng.r#gen::<f64>() * 0.6),
        NoiseLayer::new(10.0, 5.0, 3.0, 5.0, rng.r#gen::<f64>() * 0.2),
    ];
    let cell = PressureCell::new(x, y, base, sigma_y, strength)
        .with_base_sigma_x(base)
        .with_oscillation(osc)
        .with_noise(noise);
    cells.push(standard_velocity(cell, rng));

    // Azores high
    let x = -30.0 + jitter(rng, 15.0);
    let y = 30.0 + jitter(rng, 10.0) + 6.0 * sf;
    let base = uniform(rng, 50.0, 10.0);
    let sigma_y = uniform(rng, 10.0, 10.0);
    let strength = uniform(rng, 32.0, 6.0);
    let cell = blob(rng, x, y, base, sigma_y, strength).with_noise(STANDARD_NOISE.to_vec());
    cells.push(standard_velocity(cell, rng));

    // Arctic high
    let x = -60.0 + jitter(rng, 15.0);
    let y = 72.0 + jitter(rng, 10.0);
    let sigma_y = uniform(rng, 10.0, 5.0);
    let strength = uniform(rng, 25.0, 6.0);
    let cell = blob(rng, x, y, 250.0, sigma_y, strength).with_noise(STANDARD_NOISE.to_vec());
    cells.push(standard_velocity(cell, rng));

    // Weak transient lows near the storm, kept at least 10 degrees off the equator
    let transient_count = rng.gen_range(2..=8);
    for _ in 0..transient_count {
        let x = normalize_longitude(origin_lon + jitter(rng, 60.0));
        let y = if origin_lat > 0.0 {
            ((rng.r#gen::<f64>() - 0.2) * 20.0 + origin_lat).max(10.0)
        } else {
            ((rng.r#gen::<f64>() - 0.7) * 20.0 + origin_lat).min(-10.0)
        };
        let sigma_x = uniform(rng, 1.0, 4.0);
        let sigma_y = uniform(rng, 1.0, 5.0);
        let strength = uniform(rng, -6.0, 4.0);
        let velocity = (0.5 - rng.r#gen::<f64>(), jitter(rng, 0.1));
        let fine_amplitude = rng.r#gen::<f64>() * 0.1;
        cells.push(
            PressureCell::new(x, y, sigma_x, sigma_y, strength)
                .with_velocity(velocity.0, velocity.1)
                .with_noise(vec![
                    NoiseLayer::new(0.0, 0.0, 5.0, 5.0, 0.1),
                    NoiseLayer::new(0.0, 0.0, 1.0, 1.0, fine_amplitude),
                ]),
        );
    }

    // Winter monsoon surge over the South China Sea
    let winter = month >= 10 || month <= 3;
    if winter && rng.gen_bool(0.85) {
        let x = 115.0 + jitter(rng, 15.0);
        let y = 18.0 + jitter(rng, 5.0);
        let sigma_x = uniform(rng, 2.0, 3.0);
        let strength = uniform(rng, 5.0, 5.0);
        let velocity = (jitter(rng, 0.2), -rng.r#gen::<f64>());
        cells.push(
            PressureCell::new(x, y, sigma_x, 10.0, strength).with_velocity(velocity.0, velocity.1),
        );
    }

    // Southern hemisphere subtropical highs
    for (x0, y0) in [(190.0, -28.0), (70.0, -25.0)] {
        let x = x0 + jitter(rng, 15.0);
        let y = y0 + jitter(rng, 10.0) - 6.0 * sf;
        let base = uniform(rng, 40.0, 10.0);
        let sigma_y = uniform(rng, 5.0, 10.0);
        let strength = uniform(rng, 20.0, 6.0);
        let cell = blob(rng, x, y, base, sigma_y, strength).with_noise(SOUTHERN_NOISE.to_vec());
        cells.push(standard_velocity(cell, rng));
    }

    // Antarctic high
    let x = -60.0 + jitter(rng, 15.0);
    let y = -65.0 + jitter(rng, 10.0);
    let sigma_y = uniform(rng, 10.0, 5.0);
    let strength = uniform(rng, 25.0, 6.0);
    let cell = blob(rng, x, y, 250.0, sigma_y, strength).with_noise(STANDARD_NOISE.to_vec());
    cells.push(standard_velocity(cell, rng));

    // Australian heat low
    let x = 150.0 + jitter(rng, 15.0);
    let y = -12.0 + jitter(rng, 10.0) - 6.0 * sf;
    let base = uniform(rng, 30.0, 10.0);
    let sigma_y = uniform(rng, 5.0, 5.0);
    let strength = uniform(rng, -10.0, 6.0);
    let cell = blob(rng, x, y, base, sigma_y, strength).with_noise(SOUTHERN_NOISE.to_vec());
    cells.push(standard_velocity(cell, rng));

    // South Atlantic high
    let x = -30.0 + jitter(rng, 15.0);
    let y = -25.0 + jitter(rng, 10.0) - 6.0 * sf;
    let base = uniform(rng, 30.0, 10.0);
    let sigma_y = uniform(rng, 5.0, 10.0);
    let strength = uniform(rng, 20.0, 6.0);
    let cell = blob(rng, x, y, base, sigma_y, strength).with_noise(SOUTHERN_NOISE.to_vec());
    cells.push(standard_velocity(cell, rng));

    // Subpolar lows sit a fixed distance poleward of the subtropical highs
    let mut field = PressureField::new(cells);

    let north_mean = field
        .mean_high_latitude(|c| c.y > NH_SUBTROPICAL_BAND.0 && c.y < NH_SUBTROPICAL_BAND.1)
        .unwrap_or(45.0);
    let y = north_mean + 20.0 + jitter(rng, 4.0);
    let sigma_y = uniform(rng, 8.0, 5.0);
    let strength = -uniform(rng, 45.0, 10.0);
    let north_belt = subpolar_belt(rng, y, sigma_y, strength);

    let south_mean = field
        .mean_high_latitude(|c| c.y > SH_SUBTROPICAL_BAND.0 && c.y < SH_SUBTROPICAL_BAND.1)
        .unwrap_or(-40.0);
    let y = south_mean - 15.0 - jitter(rng, 4.0);
    let sigma_y = uniform(rng, 5.0, 5.0);
    let strength = -uniform(rng, 35.0, 10.0);
    let south_belt = subpolar_belt(rng, y, sigma_y, strength);

    field.cells.push(north_belt);
    field.cells.push(south_belt);

    // One step so oscillating cells pick up their initial stretch
    field.advance();
    field
}

/// Latitude poleward of which extratropical transition can begin.
pub fn frontal_zone(field: &PressureField, month: u32, rng: &mut impl Rng) -> FrontalZone {
    match field.mean_high_latitude(|c| c.y > 0.0) {
        Some(mean) => FrontalZone {
            latitude: mean - 3.0 * (f64::from(month) - 8.0).abs() - 3.0 * rng.r#gen::<f64>(),
        },
        None => FrontalZone::default(),
    }
}
