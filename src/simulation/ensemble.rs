//! Forecast ensemble: simplified track-only runs from copies of the live state.

use glam::DVec2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::simulation::geo::{bearing_difference, normalize_bearing, step_distance_degrees, step_position};
use crate::simulation::steering::{compute_steering, steering_bearing, steering_speed_knots};
use crate::world::cyclone::Cyclone;
use crate::world::pressure::PressureField;

const DIRECTION_BLEND: f64 = 0.1;
const SPEED_BLEND: f64 = 0.05;
const MIN_FORECAST_SPEED_KT: f64 = 3.0;

/// A named ensemble member: the live steering flow plus a constant bias in m/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastModel {
    pub name: String,
    #[serde(default)]
    pub bias_u: f64,
    #[serde(default)]
    pub bias_v: f64,
}

impl Default for ForecastModel {
    fn default() -> Self {
        ForecastModel {
            name: "ENAI".to_string(),
            bias_u: 0.5,
            bias_v: -0.5,
        }
    }
}

impl ForecastModel {
    pub fn bias(&self) -> DVec2 {
        DVec2::new(self.bias_u, self.bias_v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub lon: f64,
    pub lat: f64,
    pub intensity: f64,
    pub is_transitioning: bool,
    pub is_extratropical: bool,
}

impl ForecastPoint {
    fn from_cyclone(cyclone: &Cyclone) -> Self {
        ForecastPoint {
            lon: cyclone.lon,
            lat: cyclone.lat,
            intensity: cyclone.intensity,
            is_transitioning: cyclone.is_transitioning,
            is_extratropical: cyclone.is_extratropical(),
        }
    }
}

/// One member's forecast track. The first point is the storm's position when
/// the forecast was issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTrack {
    pub model: String,
    pub points: Vec<ForecastPoint>,
}

impl ForecastTrack {
    pub fn final_point(&self) -> Option<&ForecastPoint> {
        self.points.last()
    }

    /// Hours covered by the track at 3 h per step.
    pub fn lead_time_hours(&self) -> u32 {
        self.points.len().saturating_sub(1) as u32 * 3
    }
}

/// Run every model `horizon` steps ahead on private copies of the storm and
/// the field. Intensity and lifecycle flags are carried, not evolved.
pub fn generate_forecasts(
    cyclone: &Cyclone,
    field: &PressureField,
    models: &[ForecastModel],
    horizon: u32,
    rng: &mut impl Rng,
) -> Vec<ForecastTrack> {
    models
        .iter()
        .map(|model| run_model(cyclone, field, model, horizon, rng))
        .collect()
}

fn run_model(
    cyclone: &Cyclone,
    field: &PressureField,
    model: &ForecastModel,
    horizon: u32,
    rng: &mut impl Rng,
) -> ForecastTrack {
    let mut storm = cyclone.clone();
    let mut field = field.clone();
    let bias = model.bias();

    let mut points = Vec::with_capacity(horizon as usize + 1);
    points.push(ForecastPoint::from_cyclone(&storm));

    for _ in 0..horizon {
        field.advance();
        let steer = compute_steering(storm.lon, storm.lat, &field, bias, rng);

        let turn = bearing_difference(storm.direction, steering_bearing(steer));
        storm.direction = normalize_bearing(storm.direction + turn * DIRECTION_BLEND);
        storm.speed += (steering_speed_knots(steer) - storm.speed) * SPEED_BLEND;

        // Members step along the blended heading; unlike the live storm they
        // take no random heading jitter, so spread comes from steering alone.
        let distance = step_distance_degrees(storm.speed.max(MIN_FORECAST_SPEED_KT));
        let (lat, lon) = step_position(storm.lat, storm.lon, storm.direction, distance);
        storm.lat = lat;
        storm.lon = lon;

        points.push(ForecastPoint::from_cyclone(&storm));
    }

    ForecastTrack {
        model: model.name.clone(),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::climatology::seed_pressure_field;
    use crate::simulation::geo::{shortest_longitude_distance, tangent_to_bearing};
    use rand_chacha::ChaCha8Rng;

    fn setup(seed: u64) -> (Cyclone, PressureField, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let cyclone = Cyclone::new(15.0, 140.0, 60.0, 280.0, 12.0, 300.0);
        let field = seed_pressure_field(cyclone.lat, cyclone.lon, 8, &mut rng);
        (cyclone, field, rng)
    }

    #[test]
    fn one_track_per_model_with_horizon_steps() {
        let (cyclone, field, mut rng) = setup(1);
        let models = vec![
            ForecastModel::default(),
            ForecastModel {
                name: "EAST".to_string(),
                bias_u: 3.0,
                bias_v: 0.0,
            },
        ];
        let tracks = generate_forecasts(&cyclone, &field, &models, 24, &mut rng);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].model, "ENAI");
        assert_eq!(tracks[1].model, "EAST");
        for track in &tracks {
            assert_eq!(track.points.len(), 25);
            assert_eq!(track.lead_time_hours(), 72);
            assert_eq!(track.points[0].lon, cyclone.lon);
            assert_eq!(track.points[0].lat, cyclone.lat);
        }
    }

    #[test]
    fn live_state_is_not_mutated() {
        let (cyclone, field, mut rng) = setup(2);
        let cyclone_before = cyclone.clone();
        let field_before = field.clone();
        let _ = generate_forecasts(&cyclone, &field, &[ForecastModel::default()], 24, &mut rng);
        assert_eq!(cyclone, cyclone_before);
        assert_eq!(field, field_before);
    }

    #[test]
    fn intensity_and_flags_are_carried() {
        let (mut cyclone, field, mut rng) = setup(3);
        cyclone.is_transitioning = true;
        let tracks = generate_forecasts(&cyclone, &field, &[ForecastModel::default()], 10, &mut rng);
        for point in &tracks[0].points {
            assert_eq!(point.intensity, 60.0);
            assert!(point.is_transitioning);
            assert!(!point.is_extratropical);
        }
    }

    #[test]
    fn every_step_moves_at_least_the_speed_floor() {
        let (cyclone, field, mut rng) = setup(4);
        let tracks = generate_forecasts(&cyclone, &field, &[ForecastModel::default()], 24, &mut rng);
        let floor = step_distance_degrees(MIN_FORECAST_SPEED_KT);
        for pair in tracks[0].points.windows(2) {
            let d_lat = pair[1].lat - pair[0].lat;
            let d_lon = crate::simulation::geo::shortest_longitude_distance(pair[1].lon, pair[0].lon)
                * pair[0].lat.to_radians().cos();
            let moved = (d_lat * d_lat + d_lon * d_lon).sqrt();
            assert!(moved >= floor - 1e-9, "moved {} < {}", moved, floor);
            assert!((-180.0..=180.0).contains(&pair[1].lon));
        }
    }

    #[test]
    fn steps_turn_no_faster_than_the_direction_blend() {
        let max_turn = 180.0 * DIRECTION_BLEND + 1e-6;
        for seed in 0..30 {
            let (cyclone, field, mut rng) = setup(seed);
            let tracks = generate_forecasts(&cyclone, &field, &[ForecastModel::default()], 24, &mut rng);
            let headings: Vec<f64> = tracks[0]
                .points
                .windows(2)
                .map(|pair| {
                    let north = pair[1].lat - pair[0].lat;
                    let east = shortest_longitude_distance(pair[1].lon, pair[0].lon)
                        * pair[0].lat.to_radians().cos();
                    tangent_to_bearing(east, north)
                })
                .collect();

            assert!(bearing_difference(cyclone.direction, headings[0]).abs() <= max_turn);
            for pair in headings.windows(2) {
                let turn = bearing_difference(pair[0], pair[1]).abs();
                assert!(turn <= max_turn, "seed {seed}: turned {turn} degrees in one step");
            }
        }
    }

    #[test]
    fn same_seed_same_forecast() {
        let (cyclone, field, mut rng_a) = setup(5);
        let (_, _, mut rng_b) = setup(5);
        let a = generate_forecasts(&cyclone, &field, &[ForecastModel::default()], 24, &mut rng_a);
        let b = generate_forecasts(&cyclone, &field, &[ForecastModel::default()], 24, &mut rng_b);
        assert_eq!(a, b);
    }

    #[test]
    fn no_models_no_tracks() {
        let (cyclone, field, mut rng) = setup(6);
        assert!(generate_forecasts(&cyclone, &field, &[], 24, &mut rng).is_empty());
    }
}
