use std::collections::HashMap;

use serde::Serialize;

use crate::simulation::classification::{AtcfType, Category, wind_to_pressure};
use crate::simulation::geo::great_circle_distance_km;
use crate::world::Simulation;
use crate::world::cyclone::TrackPoint;

/// Per-tick aggregate metrics for the storm, derived from its state and track.
#[derive(Debug, Clone, Serialize)]
pub struct TickStatistics {
    pub tick: u64,
    pub age_hours: u32,
    pub intensity_kt: f64,
    pub central_pressure_hpa: f64,
    pub category: Category,
    pub atcf_type: AtcfType,
    pub peak_intensity_kt: f64,
    pub min_pressure_hpa: f64,
    pub ace: f64,
    pub distance_km: f64,
    /// Track points per best-track type
    pub type_distribution: HashMap<AtcfType, u32>,
    pub tick_duration_ms: f32,
}

fn point_type(point: &TrackPoint) -> AtcfType {
    AtcfType::classify(
        point.intensity.round(),
        point.is_extratropical,
        point.is_subtropical,
    )
}

fn point_pressure(point: &TrackPoint) -> f64 {
    wind_to_pressure(point.intensity.round(), point.circulation_size)
}

/// Compute statistics for the current storm state after a tick.
pub fn compute_statistics(sim: &Simulation, tick_duration_ms: f32) -> TickStatistics {
    let cyclone = &sim.cyclone;

    let mut type_distribution: HashMap<AtcfType, u32> = HashMap::new();
    let mut peak = 0.0_f64;
    let mut min_pressure = f64::MAX;
    for point in &cyclone.track {
        *type_distribution.entry(point_type(point)).or_insert(0) += 1;
        peak = peak.max(point.intensity);
        min_pressure = min_pressure.min(point_pressure(point));
    }

    let distance_km = cyclone
        .track
        .windows(2)
        .map(|pair| great_circle_distance_km(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon))
        .sum();

    let central_pressure = wind_to_pressure(cyclone.intensity.round(), cyclone.circulation_size);

    TickStatistics {
        tick: sim.tick_count,
        age_hours: cyclone.age,
        intensity_kt: cyclone.intensity,
        central_pressure_hpa: central_pressure,
        category: Category::classify(
            cyclone.intensity,
            cyclone.is_transitioning,
            cyclone.is_extratropical(),
            cyclone.is_subtropical(),
        ),
        atcf_type: AtcfType::classify(
            cyclone.intensity.round(),
            cyclone.is_extratropical(),
            cyclone.is_subtropical(),
        ),
        peak_intensity_kt: peak.max(cyclone.intensity),
        min_pressure_hpa: min_pressure.min(central_pressure),
        ace: cyclone.ace,
        distance_km,
        type_distribution,
        tick_duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::scenario::ScenarioParams;
    use crate::world::cyclone::{Cyclone, ExtratropicalStage};
    use crate::world::pressure::PressureField;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use uuid::Uuid;

    fn make_test_simulation(cyclone: Cyclone) -> Simulation {
        Simulation {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            created_at: "2026-01-01".to_string(),
            tick_count: 3,
            scenario: ScenarioParams::default(),
            cyclone,
            pressure_field: PressureField::default(),
            forecasts: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(1),
        }
    }

    fn push_point(cyclone: &mut Cyclone, lat: f64, lon: f64, intensity: f64) {
        cyclone.age += 3;
        cyclone.lat = lat;
        cyclone.lon = lon;
        cyclone.intensity = intensity;
        cyclone.record_track_point();
    }

    #[test]
    fn peak_and_minimum_pressure_come_from_track() {
        let mut cyclone = Cyclone::new(15.0, 140.0, 30.0, 280.0, 10.0, 300.0);
        push_point(&mut cyclone, 15.5, 139.0, 90.0);
        push_point(&mut cyclone, 16.0, 138.0, 70.0);
        let sim = make_test_simulation(cyclone);

        let stats = compute_statistics(&sim, 1.0);
        assert_eq!(stats.tick, 3);
        assert_eq!(stats.age_hours, 6);
        assert_eq!(stats.peak_intensity_kt, 90.0);
        assert_eq!(stats.min_pressure_hpa, wind_to_pressure(90.0, 300.0));
        assert_eq!(stats.intensity_kt, 70.0);
        assert_eq!(stats.category, Category::Cat1);
        assert_eq!(stats.atcf_type, AtcfType::TY);
    }

    #[test]
    fn type_distribution_counts_every_point() {
        let mut cyclone = Cyclone::new(15.0, 140.0, 30.0, 280.0, 10.0, 300.0);
        push_point(&mut cyclone, 16.0, 140.0, 40.0);
        push_point(&mut cyclone, 17.0, 140.0, 70.0);
        cyclone.extratropical = ExtratropicalStage::Decaying;
        push_point(&mut cyclone, 18.0, 140.0, 60.0);
        let stats = compute_statistics(&make_test_simulation(cyclone), 0.0);

        assert_eq!(stats.type_distribution[&AtcfType::TD], 1);
        assert_eq!(stats.type_distribution[&AtcfType::TS], 1);
        assert_eq!(stats.type_distribution[&AtcfType::TY], 1);
        assert_eq!(stats.type_distribution[&AtcfType::EX], 1);
        assert_eq!(stats.type_distribution.values().sum::<u32>(), 4);
    }

    #[test]
    fn distance_sums_track_legs() {
        let mut cyclone = Cyclone::new(0.0, 140.0, 30.0, 90.0, 10.0, 300.0);
        push_point(&mut cyclone, 0.0, 141.0, 30.0);
        push_point(&mut cyclone, 0.0, 142.0, 30.0);
        let stats = compute_statistics(&make_test_simulation(cyclone), 0.0);
        let one_degree = great_circle_distance_km(0.0, 0.0, 0.0, 1.0);
        assert!((stats.distance_km - 2.0 * one_degree).abs() < 1e-6);
    }

    #[test]
    fn fresh_storm_has_zero_distance() {
        let cyclone = Cyclone::new(15.0, 140.0, 24.0, 280.0, 10.0, 300.0);
        let stats = compute_statistics(&make_test_simulation(cyclone), 0.0);
        assert_eq!(stats.distance_km, 0.0);
        assert_eq!(stats.ace, 0.0);
        assert_eq!(stats.type_distribution[&AtcfType::TD], 1);
    }
}
