pub mod classification;
pub mod climatology;
pub mod ensemble;
pub mod genesis;
pub mod geo;
pub mod lifecycle;
pub mod sst;
pub mod statistics;
pub mod steering;
pub mod wind_radii;

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::simulation::SimulationConfig;
use crate::simulation::classification::wind_to_pressure;
use crate::simulation::ensemble::generate_forecasts;
use crate::simulation::lifecycle::{Environment, StepDiagnostics, advance_cyclone};
use crate::simulation::statistics::TickStatistics;
use crate::world::cyclone::{Cyclone, ErcState, ExtratropicalStage};
use crate::world::landmass::Landmass;
use crate::world::{FrontalZone, Simulation};

/// A lifecycle transition observed across one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleEvent {
    EyewallReplacementStarted,
    EyewallReplacementEnded,
    ExtratropicalTransition,
    ExtratropicalDecay,
    SubtropicalPhaseEnded,
    MonsoonPhaseEnded,
    Dissipated,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LifecycleEvent::EyewallReplacementStarted => "Eyewall replacement started",
            LifecycleEvent::EyewallReplacementEnded => "Eyewall replacement ended",
            LifecycleEvent::ExtratropicalTransition => "Became extratropical",
            LifecycleEvent::ExtratropicalDecay => "Extratropical development ended",
            LifecycleEvent::SubtropicalPhaseEnded => "Shed subtropical characteristics",
            LifecycleEvent::MonsoonPhaseEnded => "Monsoon depression phase ended",
            LifecycleEvent::Dissipated => "Dissipated",
        };
        f.write_str(text)
    }
}

/// The sub-state flags that lifecycle events are derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Phases {
    erc: ErcState,
    extratropical: ExtratropicalStage,
    subtropical: bool,
    monsoon: bool,
    active: bool,
}

impl Phases {
    fn of(cyclone: &Cyclone) -> Self {
        Phases {
            erc: cyclone.erc,
            extratropical: cyclone.extratropical,
            subtropical: cyclone.is_subtropical(),
            monsoon: cyclone.is_monsoon_depression(),
            active: cyclone.is_active(),
        }
    }
}

impl LifecycleEvent {
    fn between(before: &Phases, after: &Phases) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();

        let was_weakening = matches!(before.erc, ErcState::Weakening { .. });
        if !was_weakening && matches!(after.erc, ErcState::Weakening { .. }) {
            events.push(LifecycleEvent::EyewallReplacementStarted);
        }
        if before.erc != ErcState::None && after.erc == ErcState::None {
            events.push(LifecycleEvent::EyewallReplacementEnded);
        }

        match (before.extratropical, after.extratropical) {
            (ExtratropicalStage::None, ExtratropicalStage::None) => {}
            (ExtratropicalStage::None, _) => events.push(LifecycleEvent::ExtratropicalTransition),
            (ExtratropicalStage::Developing { .. }, ExtratropicalStage::Decaying) => {
                events.push(LifecycleEvent::ExtratropicalDecay)
            }
            _ => {}
        }

        if before.subtropical && !after.subtropical {
            events.push(LifecycleEvent::SubtropicalPhaseEnded);
        }
        if before.monsoon && !after.monsoon {
            events.push(LifecycleEvent::MonsoonPhaseEnded);
        }
        if before.active && !after.active {
            events.push(LifecycleEvent::Dissipated);
        }
        events
    }
}

/// Result of executing a single tick.
#[derive(Debug)]
pub struct TickResult {
    pub statistics: TickStatistics,
    /// `None` when the tick was skipped because the storm had dissipated
    pub frontal_zone: Option<FrontalZone>,
    pub events: Vec<LifecycleEvent>,
    pub diagnostics: Option<StepDiagnostics>,
}

/// Execute a single simulation tick.
///
/// Advances the pressure field, recomputes the frontal zone, advances the
/// storm, then regenerates the forecast ensemble every `forecast_interval`
/// ticks. Once the storm has dissipated this does nothing and the tick count
/// stays put.
pub fn execute_tick(sim: &mut Simulation, config: &SimulationConfig, land: &dyn Landmass) -> TickResult {
    let tick_start = Instant::now();

    if sim.is_finished() {
        return TickResult {
            statistics: statistics::compute_statistics(sim, 0.0),
            frontal_zone: None,
            events: Vec::new(),
            diagnostics: None,
        };
    }

    let Simulation {
        cyclone,
        pressure_field,
        scenario,
        rng,
        ..
    } = sim;

    pressure_field.advance();
    let month = scenario.month();
    let zone = climatology::frontal_zone(pressure_field, month, rng);
    let env = Environment {
        field: &*pressure_field,
        frontal_zone: zone,
        month,
        global_temp: scenario.global_temp,
        global_shear: scenario.global_shear,
    };

    let before = Phases::of(cyclone);
    let diagnostics = advance_cyclone(cyclone, &env, land, rng);
    let events = LifecycleEvent::between(&before, &Phases::of(cyclone));

    sim.tick_count += 1;

    if sim.cyclone.is_active() && sim.tick_count % u64::from(config.forecast_interval.max(1)) == 0 {
        sim.forecasts = generate_forecasts(
            &sim.cyclone,
            &sim.pressure_field,
            &config.forecast_models,
            config.forecast_horizon,
            &mut sim.rng,
        );
    }

    let cyclone = &sim.cyclone;
    for event in &events {
        info!(
            tick = sim.tick_count,
            age = cyclone.age,
            intensity = cyclone.intensity,
            lat = cyclone.lat,
            lon = cyclone.lon,
            "{}",
            event
        );
    }
    debug!(
        tick = sim.tick_count,
        intensity = cyclone.intensity,
        pressure = wind_to_pressure(cyclone.intensity.round(), cyclone.circulation_size),
        speed = cyclone.speed,
        direction = cyclone.direction,
        sst = diagnostics.map(|d| d.sst),
        "Tick"
    );

    let tick_duration = tick_start.elapsed().as_secs_f32() * 1000.0;
    let statistics = statistics::compute_statistics(sim, tick_duration);

    TickResult {
        statistics,
        frontal_zone: Some(zone),
        events,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::scenario::ScenarioParams;
    use crate::simulation::genesis::create_simulation;
    use crate::world::basin::Basin;
    use crate::world::cyclone::{MAX_CIRCULATION_KM, MAX_UPWELLING_COOLING, MIN_CIRCULATION_KM, Status};
    use crate::world::landmass::OpenOcean;

    fn scenario(seed: u64, basin: Basin, month: u32) -> ScenarioParams {
        ScenarioParams {
            seed,
            basin: basin.code().to_string(),
            month,
            ..ScenarioParams::default()
        }
    }

    fn make_simulation(seed: u64) -> Simulation {
        create_simulation(
            &scenario(seed, Basin::WestPacific, 8),
            &SimulationConfig::default(),
            &OpenOcean,
        )
        .unwrap()
    }

    #[test]
    fn same_seed_same_hundred_ticks() {
        let config = SimulationConfig::default();
        let mut a = make_simulation(42);
        let mut b = make_simulation(42);
        for _ in 0..100 {
            let ra = execute_tick(&mut a, &config, &OpenOcean);
            let rb = execute_tick(&mut b, &config, &OpenOcean);
            assert_eq!(ra.events, rb.events);
            assert_eq!(ra.frontal_zone, rb.frontal_zone);
        }
        assert_eq!(a.cyclone, b.cyclone);
        assert_eq!(a.pressure_field, b.pressure_field);
        assert_eq!(a.forecasts, b.forecasts);
        assert_eq!(a.tick_count, b.tick_count);
    }

    #[test]
    fn different_seeds_diverge() {
        let config = SimulationConfig::default();
        let mut a = make_simulation(1);
        let mut b = make_simulation(2);
        for _ in 0..10 {
            execute_tick(&mut a, &config, &OpenOcean);
            execute_tick(&mut b, &config, &OpenOcean);
        }
        assert_ne!(a.cyclone.track, b.cyclone.track);
    }

    #[test]
    fn invariants_hold_over_long_runs() {
        let config = SimulationConfig {
            forecast_interval: 8,
            ..SimulationConfig::default()
        };
        for (i, basin) in Basin::ALL.iter().cycle().take(24).enumerate() {
            let seed = 1000 + i as u64;
            let month = 1 + (i as u32 % 12);
            let mut sim = create_simulation(&scenario(seed, *basin, month), &config, &OpenOcean).unwrap();

            let mut last_ace = 0.0;
            for _ in 0..2000 {
                let was_active = sim.cyclone.is_active();
                let result = execute_tick(&mut sim, &config, &OpenOcean);
                let c = &sim.cyclone;

                assert!(c.intensity >= 10.0, "seed {}: intensity {}", seed, c.intensity);
                assert!(
                    (MIN_CIRCULATION_KM..=MAX_CIRCULATION_KM).contains(&c.circulation_size),
                    "seed {}: size {}",
                    seed,
                    c.circulation_size
                );
                assert!((0.0..=MAX_UPWELLING_COOLING).contains(&c.upwelling_cooling));
                assert!((-180.0..=180.0).contains(&c.lon), "seed {}: lon {}", seed, c.lon);
                assert!((-90.0..=90.0).contains(&c.lat));
                assert!(c.track_is_consistent(), "seed {}: age {} track {}", seed, c.age, c.track.len());
                assert!(c.ace >= last_ace);
                last_ace = c.ace;
                assert_eq!(c.validate(), Ok(()), "seed {} tick {}", seed, sim.tick_count);
                assert_eq!(sim.tick_count * 3, u64::from(c.age));

                if was_active {
                    assert_eq!(c.is_active(), !c.meets_dissipation_criteria(), "seed {}", seed);
                    assert_eq!(result.events.contains(&LifecycleEvent::Dissipated), !c.is_active());
                } else {
                    assert_eq!(c.status, Status::Dissipated);
                    assert!(result.events.is_empty());
                }
            }
        }
    }

    #[test]
    fn dissipated_simulation_is_not_advanced() {
        let config = SimulationConfig::default();
        let mut sim = make_simulation(7);
        execute_tick(&mut sim, &config, &OpenOcean);
        sim.cyclone.status = Status::Dissipated;
        let before = sim.clone();

        let result = execute_tick(&mut sim, &config, &OpenOcean);
        assert_eq!(sim, before);
        assert!(result.frontal_zone.is_none());
        assert!(result.diagnostics.is_none());
        assert!(result.events.is_empty());
        assert_eq!(result.statistics.tick, 1);
    }

    #[test]
    fn forecasts_refresh_on_interval() {
        let config = SimulationConfig {
            forecast_interval: 4,
            ..SimulationConfig::default()
        };
        let mut checked = 0;
        for seed in 1..=5 {
            let mut sim = create_simulation(&scenario(seed, Basin::WestPacific, 8), &config, &OpenOcean).unwrap();
            let initial = sim.forecasts.clone();
            for _ in 0..3 {
                execute_tick(&mut sim, &config, &OpenOcean);
            }
            if sim.is_finished() {
                continue;
            }
            assert_eq!(sim.forecasts, initial);

            execute_tick(&mut sim, &config, &OpenOcean);
            if sim.is_finished() {
                continue;
            }
            assert_ne!(sim.forecasts, initial);
            let origin = sim.forecasts[0].points[0];
            assert_eq!(origin.lat, sim.cyclone.lat);
            assert_eq!(origin.lon, sim.cyclone.lon);
            checked += 1;
        }
        assert!(checked > 0);
    }

    #[test]
    fn tick_result_carries_statistics() {
        let config = SimulationConfig::default();
        let mut sim = make_simulation(11);
        let result = execute_tick(&mut sim, &config, &OpenOcean);
        assert_eq!(result.statistics.tick, 1);
        assert_eq!(result.statistics.age_hours, 3);
        assert!(result.frontal_zone.is_some());
        assert!(result.diagnostics.is_some());
        assert!(result.statistics.tick_duration_ms >= 0.0);
    }

    #[test]
    fn events_from_phase_changes() {
        let base = Phases {
            erc: ErcState::None,
            extratropical: ExtratropicalStage::None,
            subtropical: true,
            monsoon: true,
            active: true,
        };

        let started = Phases {
            erc: ErcState::Weakening {
                end_time: 30,
                mpi_reduction: 20.0,
            },
            ..base
        };
        assert_eq!(
            LifecycleEvent::between(&base, &started),
            vec![LifecycleEvent::EyewallReplacementStarted]
        );

        let recovering = Phases {
            erc: ErcState::Recovering { end_time: 60 },
            ..base
        };
        assert!(LifecycleEvent::between(&started, &recovering).is_empty());
        assert_eq!(
            LifecycleEvent::between(&recovering, &base),
            vec![LifecycleEvent::EyewallReplacementEnded]
        );

        let developing = Phases {
            extratropical: ExtratropicalStage::Developing {
                end_time: 90,
                max_intensity: 60.0,
            },
            subtropical: false,
            ..base
        };
        assert_eq!(
            LifecycleEvent::between(&base, &developing),
            vec![
                LifecycleEvent::ExtratropicalTransition,
                LifecycleEvent::SubtropicalPhaseEnded
            ]
        );

        let decayed = Phases {
            extratropical: ExtratropicalStage::Decaying,
            monsoon: false,
            active: false,
            ..developing
        };
        assert_eq!(
            LifecycleEvent::between(&developing, &decayed),
            vec![
                LifecycleEvent::ExtratropicalDecay,
                LifecycleEvent::MonsoonPhaseEnded,
                LifecycleEvent::Dissipated
            ]
        );
        assert!(LifecycleEvent::between(&decayed, &decayed).is_empty());
    }
}
