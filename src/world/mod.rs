pub mod basin;
pub mod cyclone;
pub mod landmass;
pub mod pressure;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::scenario::ScenarioParams;
use crate::simulation::ensemble::ForecastTrack;
pub use cyclone::{Cyclone, Status};
pub use pressure::{FrontalZone, PressureField};

/// A complete storm run: the live cyclone, the pressure field that steers it,
/// the latest forecast ensemble, and the random source that drives both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
    pub tick_count: u64,
    /// Resolved scenario (the stored seed is never 0)
    pub scenario: ScenarioParams,
    pub cyclone: Cyclone,
    pub pressure_field: PressureField,
    pub forecasts: Vec<ForecastTrack>,
    /// Every stochastic draw of the run comes from here
    pub rng: ChaCha8Rng,
}

impl Simulation {
    pub fn is_finished(&self) -> bool {
        !self.cyclone.is_active()
    }
}
