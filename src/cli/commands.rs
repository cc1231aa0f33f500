use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::scenario::ScenarioParams;
use crate::config::simulation::SimulationConfig;
use crate::persistence;
use crate::simulation;
use crate::simulation::classification::{Category, knots_to_kph, knots_to_mph, wind_to_pressure};
use crate::simulation::ensemble::{ForecastTrack, generate_forecasts};
use crate::simulation::genesis::create_simulation;
use crate::simulation::geo::compass_point;
use crate::simulation::statistics::{TickStatistics, compute_statistics};
use crate::world::Simulation;
use crate::world::cyclone::Cyclone;
use crate::world::landmass::{Landmass, OpenOcean, PolygonLandmass};

/// Forecast points printed per day of lead time.
const POINTS_PER_DAY: usize = 8;

/// Open ocean unless the config names a landmass polygon file.
pub fn load_landmass(config: &SimulationConfig) -> Result<Box<dyn Landmass>, String> {
    match &config.landmass_file {
        Some(path) => {
            let land = PolygonLandmass::from_file(Path::new(path))
                .map_err(|e| format!("Failed to load landmass: {}", e))?;
            eprintln!("Landmass loaded from {}", path);
            Ok(Box::new(land))
        }
        None => Ok(Box::new(OpenOcean)),
    }
}

fn save_and_prune(sim: &Simulation, config: &SimulationConfig) -> Result<(), String> {
    let snapshot_dir = Path::new(&config.snapshot_directory);
    let path = persistence::save_snapshot(sim, snapshot_dir)
        .map_err(|e| format!("Cannot save snapshot: {}", e))?;
    eprintln!("Snapshot saved: {}", path.display());
    if let Err(e) = persistence::prune_snapshots(snapshot_dir, sim.id, config.max_snapshots as usize) {
        eprintln!("Warning: snapshot pruning failed: {}", e);
    }
    Ok(())
}

/// Run a storm headless from genesis until it dissipates or `max_ticks` is
/// reached, then print a summary and save the final state.
pub fn simulate(config: &SimulationConfig, scenario: &ScenarioParams) -> Result<Simulation, String> {
    let land = load_landmass(config)?;
    let mut sim = create_simulation(scenario, config, land.as_ref()).map_err(|e| e.to_string())?;
    eprintln!(
        "Genesis: {} at {} (seed {})",
        sim.name,
        format_position(sim.cyclone.lat, sim.cyclone.lon),
        sim.scenario.seed
    );

    let start = Instant::now();
    while !sim.is_finished() && sim.tick_count < u64::from(config.max_ticks) {
        simulation::execute_tick(&mut sim, config, land.as_ref());
    }
    eprintln!(
        "Simulated {} ticks in {:.1} ms",
        sim.tick_count,
        start.elapsed().as_secs_f64() * 1000.0
    );

    print_storm_summary(&sim);
    save_and_prune(&sim, config)?;
    Ok(sim)
}

/// Run the paced tick loop: genesis (or resume from the latest snapshot),
/// one tick per `1 / tick_rate_hz` seconds, periodic snapshots, and a final
/// snapshot on dissipation or Ctrl-C.
pub async fn run_simulation(
    config: &SimulationConfig,
    scenario: &ScenarioParams,
    resume: bool,
) -> Result<(), String> {
    let land = load_landmass(config)?;
    let snapshot_dir = Path::new(&config.snapshot_directory);

    let mut sim = if resume {
        eprintln!("Loading latest snapshot from {}", config.snapshot_directory);
        persistence::load_latest_valid_snapshot(snapshot_dir)
            .map_err(|e| format!("Failed to load snapshot: {}", e))?
    } else {
        create_simulation(scenario, config, land.as_ref()).map_err(|e| e.to_string())?
    };

    eprintln!(
        "Storm {}: tick {}, {} at {}",
        sim.name,
        sim.tick_count,
        describe_intensity(&sim.cyclone),
        format_position(sim.cyclone.lat, sim.cyclone.lon)
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let tick_interval = Duration::from_secs_f32(1.0 / config.tick_rate_hz);
    let mut ticks_since_snapshot: u32 = 0;

    eprintln!(
        "Simulation running (tick rate: {}Hz, snapshot every {} ticks)",
        config.tick_rate_hz, config.snapshot_interval
    );

    loop {
        if sim.is_finished() {
            eprintln!("Storm dissipated at tick {}", sim.tick_count);
            break;
        }

        let tick_start = Instant::now();
        let result = simulation::execute_tick(&mut sim, config, land.as_ref());

        for event in &result.events {
            eprintln!("Tick {}: {}", sim.tick_count, event);
        }

        ticks_since_snapshot += 1;
        if ticks_since_snapshot >= config.snapshot_interval {
            match save_and_prune(&sim, config) {
                Ok(()) => ticks_since_snapshot = 0,
                Err(e) => eprintln!("Warning: {}", e),
            }
        }

        if sim.tick_count % POINTS_PER_DAY as u64 == 0 {
            print_tick_line(&sim, &result.statistics);
        }

        let remaining = tick_interval.saturating_sub(tick_start.elapsed());
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                eprintln!("\nShutdown signal received");
                break;
            }
            _ = tokio::time::sleep(remaining) => {}
        }
    }

    eprintln!("Saving final snapshot...");
    if let Err(e) = save_and_prune(&sim, config) {
        eprintln!("Warning: final {}", e);
    }

    eprintln!("Simulation stopped at tick {}", sim.tick_count);
    Ok(())
}

#[derive(Serialize)]
struct InspectReport<'a> {
    id: String,
    name: &'a str,
    created_at: &'a str,
    scenario: &'a ScenarioParams,
    statistics: TickStatistics,
    cyclone: &'a Cyclone,
    forecasts: &'a [ForecastTrack],
}

/// Inspect the storm in the latest valid snapshot.
pub fn inspect(config: &SimulationConfig, json: bool) -> Result<(), String> {
    let snapshot_dir = Path::new(&config.snapshot_directory);
    let sim = persistence::load_latest_valid_snapshot(snapshot_dir)
        .map_err(|e| format!("Failed to load snapshot: {}", e))?;

    if json {
        let report = InspectReport {
            id: sim.id.to_string(),
            name: &sim.name,
            created_at: &sim.created_at,
            scenario: &sim.scenario,
            statistics: compute_statistics(&sim, 0.0),
            cyclone: &sim.cyclone,
            forecasts: &sim.forecasts,
        };
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Cannot encode JSON: {}", e))?;
        println!("{}", text);
    } else {
        print_storm_summary(&sim);
    }
    Ok(())
}

/// Regenerate and print the forecast ensemble for the latest snapshot. The
/// snapshot itself is left untouched.
pub fn forecast(config: &SimulationConfig) -> Result<(), String> {
    let snapshot_dir = Path::new(&config.snapshot_directory);
    let mut sim = persistence::load_latest_valid_snapshot(snapshot_dir)
        .map_err(|e| format!("Failed to load snapshot: {}", e))?;

    if sim.is_finished() {
        return Err(format!("{} has dissipated; nothing to forecast", sim.name));
    }

    let tracks = generate_forecasts(
        &sim.cyclone,
        &sim.pressure_field,
        &config.forecast_models,
        config.forecast_horizon,
        &mut sim.rng,
    );

    println!("=== Forecast for {} (tick {}) ===", sim.name, sim.tick_count);
    for track in &tracks {
        println!();
        println!("--- {} ({} h) ---", track.model, track.lead_time_hours());
        for (i, point) in track.points.iter().enumerate().step_by(POINTS_PER_DAY) {
            println!("  +{:>3} h  {}", i * 3, format_position(point.lat, point.lon));
        }
        if let Some(last) = track.final_point() {
            println!("  final   {}", format_position(last.lat, last.lon));
        }
    }
    Ok(())
}

/// `15.3N 140.2E` style position.
pub fn format_position(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.1}{} {:.1}{}", lat.abs(), ns, lon.abs(), ew)
}

fn describe_intensity(cyclone: &Cyclone) -> String {
    let category = Category::classify(
        cyclone.intensity,
        cyclone.is_transitioning,
        cyclone.is_extratropical(),
        cyclone.is_subtropical(),
    );
    format!("{} ({:.0} kt)", category.name(), cyclone.intensity)
}

fn print_tick_line(sim: &Simulation, stats: &TickStatistics) {
    eprintln!(
        "Tick {} | {} | {:.0} kt | {:.0} hPa | {} | ACE {:.2}",
        sim.tick_count,
        stats.category,
        stats.intensity_kt,
        stats.central_pressure_hpa,
        format_position(sim.cyclone.lat, sim.cyclone.lon),
        stats.ace
    );
}

/// Print a human-readable storm report.
pub fn print_storm_summary(sim: &Simulation) {
    let cyclone = &sim.cyclone;
    let stats = compute_statistics(sim, 0.0);
    let wind = cyclone.intensity.round();

    println!("=== Storm: {} ===", sim.name);
    println!("ID: {}", sim.id);
    println!(
        "Scenario: {} month {} (seed {}, {:.1} K, shear {:.0})",
        sim.scenario.basin,
        sim.scenario.month,
        sim.scenario.seed,
        sim.scenario.global_temp,
        sim.scenario.global_shear
    );
    println!("Tick: {} ({} h)", sim.tick_count, cyclone.age);
    println!("Status: {:?}", cyclone.status);
    println!();
    println!("--- Current ---");
    println!("  Classification: {} [{}]", stats.category.name(), stats.atcf_type);
    println!(
        "  Winds: {:.0} kt ({:.0} km/h, {:.0} mph)",
        wind,
        knots_to_kph(wind),
        knots_to_mph(wind)
    );
    println!(
        "  Pressure: {:.0} hPa",
        wind_to_pressure(wind, cyclone.circulation_size)
    );
    println!("  Position: {}", format_position(cyclone.lat, cyclone.lon));
    println!(
        "  Movement: {} at {:.0} kt",
        compass_point(cyclone.direction),
        cyclone.speed
    );
    println!("  Circulation: {:.0} km", cyclone.circulation_size);
    println!(
        "  Wind radii (34/50/64 kt): {:.0} / {:.0} / {:.0} km",
        cyclone.wind_radii.r34, cyclone.wind_radii.r50, cyclone.wind_radii.r64
    );
    println!();
    println!("--- Lifetime ---");
    println!("  Peak: {:.0} kt, {:.0} hPa", stats.peak_intensity_kt, stats.min_pressure_hpa);
    println!("  ACE: {:.2}", stats.ace);
    println!("  Distance: {:.0} km", stats.distance_km);
    println!("  Track points: {}", cyclone.track.len());

    let mut sorted: Vec<_> = stats.type_distribution.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (atcf, count) in &sorted {
        println!("    {}: {} ({} h)", atcf, count, count * 3);
    }

    if !sim.forecasts.is_empty() {
        println!();
        println!("--- Forecasts ---");
        for track in &sim.forecasts {
            if let Some(last) = track.final_point() {
                println!(
                    "  {}: +{} h {}",
                    track.model,
                    track.lead_time_hours(),
                    format_position(last.lat, last.lon)
                );
            }
        }
    }
}
