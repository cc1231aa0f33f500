//! Geostrophic steering plus beta drift from the synthetic pressure field.

use std::f64::consts::PI;

use glam::DVec2;
use rand::prelude::*;

use crate::simulation::geo::tangent_to_bearing;
use crate::world::pressure::PressureField;

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const EARTH_ROTATION_RAD_S: f64 = 7.292115e-5;
const AIR_DENSITY: f64 = 1.225;
/// Smallest Coriolis magnitude used; keeps the geostrophic balance finite at the equator.
const MIN_CORIOLIS: f64 = 1e-5;
/// Central-difference spacing in degrees.
const GRADIENT_STEP_DEG: f64 = 0.5;
const HPA_TO_PA: f64 = 100.0;
/// Fraction of the geostrophic wind that steers the storm.
const STEERING_STRENGTH: f64 = 0.36;
const MAX_BETA_NORTH: f64 = 5.0;
const MAX_BETA_EAST: f64 = -0.5;

pub const MS_TO_KNOTS: f64 = 1.94384;

/// Steering flow at a point in m/s as `(east, north)`.
///
/// `bias` is added before the speed clamp; the ensemble uses it to perturb
/// its members. Two draws from `rng` jitter the beta drift.
pub fn compute_steering(
    lon: f64,
    lat: f64,
    field: &PressureField,
    bias: DVec2,
    rng: &mut impl Rng,
) -> DVec2 {
    let lat_rad = lat.to_radians();
    let hemisphere_offset = if lat_rad < 0.0 { -PI / 12.0 } else { PI / 12.0 };
    let beta_factor = (lat_rad + hemisphere_offset).sin();
    let beta_north = MAX_BETA_NORTH * beta_factor + (rng.r#gen::<f64>() - 0.5);
    let beta_east = MAX_BETA_EAST * beta_factor + (rng.r#gen::<f64>() - 0.5);

    let step_rad = GRADIENT_STEP_DEG.to_radians();
    let dx_m = step_rad * EARTH_RADIUS_M * lat_rad.cos();
    let dy_m = step_rad * EARTH_RADIUS_M;

    let p_east = field.sample_at(lon + GRADIENT_STEP_DEG, lat) * HPA_TO_PA;
    let p_west = field.sample_at(lon - GRADIENT_STEP_DEG, lat) * HPA_TO_PA;
    let p_north = field.sample_at(lon, lat + GRADIENT_STEP_DEG) * HPA_TO_PA;
    let p_south = field.sample_at(lon, lat - GRADIENT_STEP_DEG) * HPA_TO_PA;

    let grad_x = (p_east - p_west) / (2.0 * dx_m);
    let grad_y = (p_north - p_south) / (2.0 * dy_m);

    let f = coriolis_parameter(lat_rad);
    let strength = if lat > 0.0 {
        STEERING_STRENGTH
    } else {
        -STEERING_STRENGTH
    };
    let geostrophic = DVec2::new(-grad_y, grad_x) / (AIR_DENSITY * f) * strength;

    let steer = geostrophic + DVec2::new(beta_east, beta_north) + bias;
    clamp_speed(steer, max_steering_speed(lat))
}

/// Damped Coriolis parameter, never smaller in magnitude than `MIN_CORIOLIS`.
fn coriolis_parameter(lat_rad: f64) -> f64 {
    let f = 2.0 * EARTH_ROTATION_RAD_S * 0.55 * (1.5 * lat_rad).cos();
    if f.abs() < MIN_CORIOLIS {
        if f >= 0.0 { MIN_CORIOLIS } else { -MIN_CORIOLIS }
    } else {
        f
    }
}

/// Steering speed ceiling in m/s; storms move faster at high latitude.
pub fn max_steering_speed(lat: f64) -> f64 {
    25.0 + 0.5 * lat.abs()
}

fn clamp_speed(v: DVec2, max: f64) -> DVec2 {
    let speed = v.length();
    if speed > max { v * (max / speed) } else { v }
}

/// Compass bearing the steering flow points toward.
pub fn steering_bearing(steer: DVec2) -> f64 {
    tangent_to_bearing(steer.x, steer.y)
}

pub fn steering_speed_knots(steer: DVec2) -> f64 {
    steer.length() * MS_TO_KNOTS
}
