//! The per-tick cyclone update: motion, thermodynamics, and the lifecycle
//! sub-state machines.

use std::f64::consts::PI;

use glam::DVec2;
use rand::prelude::*;

use crate::simulation::geo::{bearing_difference, normalize_bearing, step_distance_degrees, step_position};
use crate::simulation::sst::sst;
use crate::simulation::steering::{compute_steering, steering_bearing, steering_speed_knots};
use crate::simulation::wind_radii::update_wind_radii;
use crate::world::cyclone::{
    Cyclone, ErcState, ExtratropicalStage, MAX_CIRCULATION_KM, MAX_UPWELLING_COOLING,
    MIN_CIRCULATION_KM, MIN_INTENSITY_KT, ShearEvent, Status,
};
use crate::world::landmass::{Landmass, NEAR_LAND_THRESHOLD_DEG};
use crate::world::pressure::{FrontalZone, PressureField};

const DIRECTION_BLEND: f64 = 0.25;
/// Below this forward speed (kt) the storm churns up cooler water.
const UPWELLING_SPEED_KT: f64 = 5.0;
/// Latched cold-water condition for extratropical transition, °C. SST is
/// clamped at 0 and upwelling cools at most `MAX_UPWELLING_COOLING`, so a
/// stepped storm never crosses it; the flag only arrives set on restored
/// or hand-built state.
const TRANSITION_SST: f64 = -8.0;
/// Water colder than this lets a storm go extratropical, °C.
const EXTRATROPICAL_SST: f64 = 25.5;
const MIN_STEP_SPEED_KT: f64 = 2.0;
const HEADING_JITTER_DEG: f64 = 30.0;

/// The environment a storm is advanced through for one tick.
#[derive(Debug, Clone, Copy)]
pub struct Environment<'a> {
    pub field: &'a PressureField,
    pub frontal_zone: FrontalZone,
    pub month: u32,
    pub global_temp: f64,
    pub global_shear: f64,
}

/// Which intensity rule applied this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityRegime {
    Terrain,
    Land,
    Extratropical,
    OpenOcean,
}

/// What the storm saw during one tick, for logging and inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDiagnostics {
    /// SST under the storm after upwelling cooling, °C
    pub sst: f64,
    pub over_land: bool,
    pub near_land: bool,
    pub terrain_elevation: f64,
    pub regime: IntensityRegime,
    /// Total shear in kt; only computed over open ocean
    pub shear: Option<f64>,
}

/// Advance the storm by one 3-hour tick. Returns `None` without touching
/// the storm once it has dissipated.
pub fn advance_cyclone(
    cyclone: &mut Cyclone,
    env: &Environment<'_>,
    land: &dyn Landmass,
    rng: &mut impl Rng,
) -> Option<StepDiagnostics> {
    if cyclone.status == Status::Dissipated {
        return None;
    }

    cyclone.age += 3;

    if cyclone.age % 6 == 0 && cyclone.intensity >= 34.0 && !cyclone.is_extratropical() {
        cyclone.ace += cyclone.intensity * cyclone.intensity / 10_000.0;
    }

    if cyclone.monsoon_until.is_some_and(|end| cyclone.age >= end) {
        cyclone.monsoon_until = None;
    }

    follow_steering(cyclone, env.field, rng);
    update_upwelling(cyclone);

    let sea_temp = sst(cyclone.lat, cyclone.lon, env.month, env.global_temp) - cyclone.upwelling_cooling;
    if !cyclone.is_transitioning && sea_temp < TRANSITION_SST {
        cyclone.is_transitioning = true;
    }

    let over_land = land.contains(cyclone.lon, cyclone.lat);
    let near_land = land.is_near(cyclone.lon, cyclone.lat, NEAR_LAND_THRESHOLD_DEG);
    let terrain_elevation = land.terrain_elevation(cyclone.lon, cyclone.lat);
    let old_intensity = cyclone.intensity;

    let mut shear = None;
    let regime = if terrain_elevation > 0.0 && cyclone.intensity > 45.0 {
        cyclone.intensity *=
            0.90 + cyclone.circulation_size * 0.0001 - terrain_elevation / 1000.0;
        IntensityRegime::Terrain
    } else if over_land || near_land {
        let factor = 0.85 + cyclone.circulation_size * 0.0002
            - rng.r#gen::<f64>() * 0.01
            - cyclone.intensity / 1500.0
            + regional_land_adjustment(cyclone);
        cyclone.intensity *= factor;
        cyclone.speed *= 0.99;
        IntensityRegime::Land
    } else if cyclone.is_extratropical() {
        extratropical_step(cyclone, rng);
        IntensityRegime::Extratropical
    } else {
        let mut mpi = potential_intensity(sea_temp);
        mpi -= eyewall_replacement(cyclone, over_land, rng);
        let total_shear = environmental_shear(cyclone, env, rng);
        relax_toward_potential(cyclone, mpi, total_shear, rng);
        shear = Some(total_shear);
        IntensityRegime::OpenOcean
    };

    evaluate_extratropical_transition(cyclone, sea_temp, env.frontal_zone, rng);

    if cyclone
        .subtropical_until
        .is_some_and(|end| cyclone.age >= end || cyclone.is_extratropical())
    {
        cyclone.subtropical_until = None;
    }

    update_circulation_size(cyclone, cyclone.intensity - old_intensity);

    cyclone.intensity = cyclone.intensity.max(MIN_INTENSITY_KT);
    update_wind_radii(
        &mut cyclone.wind_radii,
        cyclone.intensity,
        cyclone.circulation_size,
        rng,
    );

    let heading = cyclone.direction + (rng.r#gen::<f64>() - 0.5) * HEADING_JITTER_DEG;
    let distance = step_distance_degrees(cyclone.speed.max(MIN_STEP_SPEED_KT));
    let (lat, lon) = step_position(cyclone.lat, cyclone.lon, heading, distance);
    cyclone.lat = lat;
    cyclone.lon = lon;

    cyclone.record_track_point();

    if cyclone.meets_dissipation_criteria() {
        cyclone.status = Status::Dissipated;
    }

    Some(StepDiagnostics {
        sst: sea_temp,
        over_land,
        near_land,
        terrain_elevation,
        regime,
        shear,
    })
}

/// Turn and accelerate toward the local steering flow.
fn follow_steering(cyclone: &mut Cyclone, field: &PressureField, rng: &mut impl Rng) {
    let steer = compute_steering(cyclone.lon, cyclone.lat, field, DVec2::ZERO, rng);

    let turn = bearing_difference(cyclone.direction, steering_bearing(steer));
    cyclone.direction = normalize_bearing(cyclone.direction + turn * DIRECTION_BLEND);

    let blend = 0.15 + (cyclone.lat.abs() / 100.0 - 0.15).max(0.0);
    cyclone.speed += (steering_speed_knots(steer) - cyclone.speed) * blend;
}

fn update_upwelling(cyclone: &mut Cyclone) {
    if cyclone.speed < UPWELLING_SPEED_KT {
        let rate = (UPWELLING_SPEED_KT - cyclone.speed) / UPWELLING_SPEED_KT * 0.4;
        cyclone.upwelling_cooling = (cyclone.upwelling_cooling + rate).min(MAX_UPWELLING_COOLING);
    } else {
        cyclone.upwelling_cooling = (cyclone.upwelling_cooling - 0.05).max(0.0);
    }
}

/// Landfall weakening bonus for regions where storms hold up better.
fn regional_land_adjustment(cyclone: &Cyclone) -> f64 {
    let (lat, lon) = (cyclone.lat, cyclone.lon);
    let japan = (30.0..=40.0).contains(&lat) && (130.0..=140.0).contains(&lon);
    let philippines =
        (5.0..=18.0).contains(&lat) && (120.0..=127.0).contains(&lon) && cyclone.intensity < 35.0;
    let mut adjustment = 0.0;
    if japan {
        adjustment += 0.04;
    }
    if philippines {
        adjustment += 0.08;
    }
    adjustment
}

fn extratropical_step(cyclone: &mut Cyclone, rng: &mut impl Rng) {
    cyclone.speed += 0.5;
    match cyclone.extratropical {
        ExtratropicalStage::Developing { end_time, .. } if cyclone.age >= end_time => {
            cyclone.extratropical = ExtratropicalStage::Decaying;
            cyclone.intensity += -6.0 + rng.r#gen::<f64>() * 6.0;
        }
        ExtratropicalStage::Developing { max_intensity, .. } => {
            let divisor = 9.0 + rng.r#gen::<f64>() * 5.0;
            cyclone.intensity += (max_intensity - cyclone.intensity) / divisor;
        }
        ExtratropicalStage::Decaying | ExtratropicalStage::None => {
            cyclone.intensity += -2.0 + rng.r#gen::<f64>() * 2.0;
        }
    }
}

/// Thermodynamic ceiling on intensity (kt) for a sea-surface temperature.
pub fn potential_intensity(sst: f64) -> f64 {
    if sst > 25.0 {
        264.28 * (1.0 - (-0.182 * (sst - 25.0)).exp())
    } else {
        0.0
    }
}

/// Step the eyewall replacement cycle. Returns the potential-intensity
/// suppression to apply this tick.
fn eyewall_replacement(cyclone: &mut Cyclone, over_land: bool, rng: &mut impl Rng) -> f64 {
    match cyclone.erc {
        ErcState::Weakening {
            end_time,
            mpi_reduction,
        } => {
            cyclone.circulation_size *= 1.01;
            if cyclone.age >= end_time {
                let steps = 6 + rng.gen_range(0..9);
                cyclone.erc = ErcState::Recovering {
                    end_time: cyclone.age + steps * 3,
                };
            }
            mpi_reduction
        }
        ErcState::Recovering { end_time } => {
            cyclone.circulation_size *= 0.995;
            if cyclone.age >= end_time {
                cyclone.erc = ErcState::None;
            }
            0.0
        }
        ErcState::None => {
            if cyclone.intensity > 96.0
                && !over_land
                && !cyclone.is_transitioning
                && rng.r#gen::<f64>() < 0.15
            {
                let steps = 4 + rng.gen_range(0..9);
                let mpi_reduction = 15.0 + rng.r#gen::<f64>() * 25.0;
                cyclone.erc = ErcState::Weakening {
                    end_time: cyclone.age + steps * 3,
                    mpi_reduction,
                };
                mpi_reduction
            } else {
                0.0
            }
        }
    }
}

/// Move intensity toward `mpi` at a random rate, minus `shear`.
pub fn relax_toward_potential(cyclone: &mut Cyclone, mpi: f64, shear: f64, rng: &mut impl Rng) {
    // Roughly 3% of ticks get a rapid-intensification boost
    let rapid = if rng.r#gen::<f64>() > 0.97 {
        rng.r#gen::<f64>() * 0.5 - 0.05
    } else {
        0.0
    };
    let maturity = ((cyclone.intensity - 13.0) / 65.0).clamp(0.0, 1.0);
    let mut rate = rng.r#gen::<f64>() * (0.14 + rapid) * maturity;
    if cyclone.is_monsoon_depression() {
        rate *= (rng.r#gen::<f64>() + 0.05) * 0.25;
    }
    cyclone.intensity += (mpi - cyclone.intensity) * rate - shear;
}

fn month_angle(month: u32, reference: f64) -> f64 {
    (f64::from(month) - reference) * (PI / 6.0)
}

/// Baseline latitude/season shear plus any active shear event, in kt.
fn environmental_shear(cyclone: &mut Cyclone, env: &Environment<'_>, rng: &mut impl Rng) -> f64 {
    let (lat, lon) = (cyclone.lat, cyclone.lon);
    let month = env.month;
    let northern = lat > 0.0;

    let north_indian_boost = if (5.0..=30.0).contains(&lat) && (30.0..=100.0).contains(&lon) {
        8.5
    } else {
        0.0
    };
    let south_indian_boost = if (-30.0..=-5.0).contains(&lat) && lon >= 50.0 {
        30.0 * month_angle(month, 2.0).sin()
    } else {
        0.0
    };

    let winter_half = month >= 11 || month <= 4;
    let shear_scale = env.global_shear * env.global_shear / 10_000.0;
    let event_chance = if winter_half && lon > 100.0 && lon < 121.0 && lat > 16.0 {
        0.55
    } else if winter_half {
        0.045 * shear_scale
    } else {
        0.03 * shear_scale
    };

    let gradient = if northern {
        1.0 + 1.3 * month_angle(month, 2.0).cos()
    } else {
        1.0 + 1.3 * month_angle(month, 2.0).sin()
    };
    let seasonal = if northern {
        40.0 * month_angle(month, 2.0).cos()
    } else {
        40.0 * month_angle(month, 8.0).cos()
    };
    let regional = if northern {
        north_indian_boost
    } else {
        north_indian_boost + south_indian_boost
    };
    let mut shear =
        (lat.abs() * gradient - 6.0 * rng.r#gen::<f64>() - 30.0 + seasonal + regional).max(0.0) / 15.0;

    match cyclone.shear_event {
        ShearEvent::Active { end_time, .. } if cyclone.age >= end_time => {
            cyclone.shear_event = ShearEvent::Inactive;
        }
        ShearEvent::Active { magnitude, .. } => {
            shear += magnitude;
        }
        ShearEvent::Inactive => {
            if rng.r#gen::<f64>() < event_chance && !cyclone.is_transitioning {
                let duration = (1 + rng.gen_range(0..48)) * 3;
                let magnitude = -3.0
                    + rng.r#gen::<f64>() * 7.0
                    + 1.9 * (f64::from(month) - 8.0).abs().sqrt()
                    + (env.global_shear / 10.0 - 10.0).max(0.0);
                cyclone.shear_event = ShearEvent::Active {
                    end_time: cyclone.age + duration,
                    magnitude,
                };
                shear += magnitude;
            }
        }
    }
    shear
}

fn evaluate_extratropical_transition(
    cyclone: &mut Cyclone,
    sea_temp: f64,
    frontal_zone: FrontalZone,
    rng: &mut impl Rng,
) {
    let cold = sea_temp < EXTRATROPICAL_SST;
    let baroclinic = !cyclone.is_extratropical() && cold && cyclone.lat.abs() > frontal_zone.latitude;
    let subtropical_cold = cyclone.is_subtropical() && cold;
    if !(baroclinic || subtropical_cold) || cyclone.is_extratropical() {
        return;
    }

    cyclone.extratropical = if rng.r#gen::<f64>() < 0.4 && cyclone.lat.abs() > 25.0 {
        let steps = 4 + rng.gen_range(0..26);
        ExtratropicalStage::Developing {
            end_time: cyclone.age + steps * 3,
            max_intensity: 45.0 + rng.r#gen::<f64>() * 45.0,
        }
    } else {
        ExtratropicalStage::Decaying
    };
}

fn update_circulation_size(cyclone: &mut Cyclone, intensity_change: f64) {
    if cyclone.is_extratropical() || cyclone.is_transitioning {
        cyclone.circulation_size *= 1.03;
    } else if intensity_change > 0.5 {
        cyclone.circulation_size *= 0.99;
    } else {
        cyclone.circulation_size *= 1.002;
    }
    cyclone.circulation_size = cyclone
        .circulation_size
        .clamp(MIN_CIRCULATION_KM, MAX_CIRCULATION_KM);
}
