use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use uuid::Uuid;

use crate::config::scenario::ScenarioParams;
use crate::config::simulation::SimulationConfig;
use crate::simulation::climatology::{seasonal_factor, seed_pressure_field};
use crate::simulation::ensemble::generate_forecasts;
use crate::simulation::geo::normalize_longitude;
use crate::simulation::sst::sst;
use crate::world::Simulation;
use crate::world::basin::Basin;
use crate::world::cyclone::Cyclone;
use crate::world::landmass::Landmass;

/// Subtropical origins need water cooler than this, in °C.
const SUBTROPICAL_MAX_SST: f64 = 27.5;
const SUBTROPICAL_CHANCE: f64 = 0.75;
const GENESIS_DIRECTION: f64 = 280.0;

#[derive(Debug, thiserror::Error)]
pub enum SeedingError {
    #[error("no ocean point found in {basin} for month {month} after {attempts} attempts")]
    NoOceanPoint {
        basin: Basin,
        month: u32,
        attempts: u32,
    },
}

/// Latitude band genesis may draw from, shifted poleward in the local warm
/// season and on a warmer planet.
pub fn genesis_latitude_band(basin: Basin, month: u32, global_temp: f64) -> (f64, f64) {
    let region = basin.region();
    let hemisphere = region.hemisphere_sign();
    let seasonal_shift = region.lat.span() / 4.0 * (seasonal_factor(month) - 0.5);
    let warming_shift = global_temp / 2.89 - 100.0;

    let min_lat = region.lat.min + seasonal_shift + hemisphere * warming_shift.max(0.0);
    let max_lat = region.lat.max + seasonal_shift + hemisphere * warming_shift;
    (min_lat, max_lat)
}

/// Draw a fresh disturbance somewhere over open water in the basin.
///
/// Gives up with [`SeedingError::NoOceanPoint`] after `max_attempts` draws
/// that all land on land.
pub fn seed_cyclone(
    basin: Basin,
    month: u32,
    global_temp: f64,
    land: &dyn Landmass,
    max_attempts: u32,
    rng: &mut impl Rng,
) -> Result<Cyclone, SeedingError> {
    let region = basin.region();
    let (min_lat, max_lat) = genesis_latitude_band(basin, month, global_temp);

    let mut origin = None;
    for _ in 0..max_attempts {
        let lat = min_lat + rng.r#gen::<f64>() * (max_lat - min_lat);
        let lon = normalize_longitude(region.lon.min + rng.r#gen::<f64>() * region.lon.span());
        if !land.contains(lon, lat) {
            origin = Some((lat, lon));
            break;
        }
    }
    let (lat, lon) = origin.ok_or(SeedingError::NoOceanPoint {
        basin,
        month,
        attempts: max_attempts,
    })?;

    let initial_sst = sst(lat, lon, month, global_temp);
    let subtropical_until = if initial_sst < SUBTROPICAL_MAX_SST
        && rng.r#gen::<f64>() < SUBTROPICAL_CHANCE
        && (lon > 125.0 || lon < 20.0)
    {
        Some(3 * rng.gen_range(0..25))
    } else {
        None
    };

    let monsoon_chance = 0.7 + global_temp / 72.25 - 4.0;
    let monsoon_until = if rng.r#gen::<f64>() < monsoon_chance {
        Some(3 * (8 + rng.gen_range(0..60)))
    } else {
        None
    };

    let intensity = 23.0 + rng.r#gen::<f64>() * 2.0;
    let speed = 10.0 + rng.r#gen::<f64>() * 5.0;
    let circulation_size = 150.0 + rng.r#gen::<f64>() * 350.0;

    let mut cyclone = Cyclone::new(lat, lon, intensity, GENESIS_DIRECTION, speed, circulation_size);
    cyclone.subtropical_until = subtropical_until;
    cyclone.monsoon_until = monsoon_until;
    // Re-record the genesis point so it carries the origin flags
    cyclone.track = vec![cyclone.track_point()];
    Ok(cyclone)
}

/// Create a new storm run from a scenario.
///
/// If `scenario.seed` is 0, a random seed is chosen. The seed actually used
/// is stored in the returned simulation for reproducibility.
pub fn create_simulation(
    scenario: &ScenarioParams,
    config: &SimulationConfig,
    land: &dyn Landmass,
) -> Result<Simulation, SeedingError> {
    let seed = if scenario.seed == 0 {
        rand::thread_rng().r#gen()
    } else {
        scenario.seed
    };
    let basin = scenario.basin();
    let month = scenario.month();
    let resolved = ScenarioParams {
        seed,
        basin: basin.code().to_string(),
        month,
        ..scenario.clone()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let cyclone = seed_cyclone(
        basin,
        month,
        scenario.global_temp,
        land,
        config.genesis_max_attempts,
        &mut rng,
    )?;
    let pressure_field = seed_pressure_field(cyclone.lat, cyclone.lon, month, &mut rng);
    let forecasts = generate_forecasts(
        &cyclone,
        &pressure_field,
        &config.forecast_models,
        config.forecast_horizon,
        &mut rng,
    );
    let id = Uuid::from_bytes(rng.r#gen());

    info!(
        seed,
        basin = %basin,
        month,
        lat = cyclone.lat,
        lon = cyclone.lon,
        intensity = cyclone.intensity,
        subtropical = cyclone.is_subtropical(),
        monsoon = cyclone.is_monsoon_depression(),
        "Genesis"
    );

    Ok(Simulation {
        id,
        name: format!("{}-{}", basin.atcf_prefix(), seed),
        created_at: format!(
            "{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        ),
        tick_count: 0,
        scenario: resolved,
        cyclone,
        pressure_field,
        forecasts,
        rng,
    })
}
