use serde::{Deserialize, Serialize};

/// Intensity floor in knots applied after every tick.
pub const MIN_INTENSITY_KT: f64 = 10.0;
/// Circulation size bounds in kilometres.
pub const MIN_CIRCULATION_KM: f64 = 100.0;
pub const MAX_CIRCULATION_KM: f64 = 800.0;
/// Upper bound for the upwelling cooling effect in °C.
pub const MAX_UPWELLING_COOLING: f64 = 5.0;

// Furthest ahead, in hours, that each timed phase is ever scheduled.
pub const MAX_ERC_WEAKENING_HOURS: u32 = 36;
pub const MAX_ERC_RECOVERY_HOURS: u32 = 42;
pub const MAX_ET_DEVELOPING_HOURS: u32 = 87;
pub const MAX_SHEAR_EVENT_HOURS: u32 = 144;
/// Genesis-time phases are scheduled in absolute storm age.
pub const MAX_SUBTROPICAL_AGE: u32 = 72;
pub const MAX_MONSOON_AGE: u32 = 201;

// === Lifecycle sub-states ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Active,
    Dissipated,
}

/// Extratropical phase. `None` means the storm is still tropical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExtratropicalStage {
    None,
    /// Baroclinic re-intensification toward `max_intensity` until `end_time`
    Developing { end_time: u32, max_intensity: f64 },
    Decaying,
}

/// Eyewall replacement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ErcState {
    None,
    /// Outer eyewall forming; potential intensity suppressed by `mpi_reduction`
    Weakening { end_time: u32, mpi_reduction: f64 },
    Recovering { end_time: u32 },
}

/// Transient environmental shear burst.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShearEvent {
    Inactive,
    Active { end_time: u32, magnitude: f64 },
}

/// One entry of the track history, recorded once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lon: f64,
    pub lat: f64,
    pub intensity: f64,
    pub is_transitioning: bool,
    pub is_extratropical: bool,
    pub circulation_size: f64,
    pub is_subtropical: bool,
}

/// Mean 34/50/64 kt wind radii in kilometres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindRadii {
    pub r34: f64,
    pub r50: f64,
    pub r64: f64,
}

/// The simulated storm. Owned by the simulation driver and mutated in place
/// once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cyclone {
    pub lat: f64,
    /// Always within [-180, 180]
    pub lon: f64,
    /// Compass bearing of motion in degrees
    pub direction: f64,
    /// Forward speed in knots
    pub speed: f64,
    /// Hours since genesis; advances by 3 each tick
    pub age: u32,
    /// Maximum sustained wind in knots
    pub intensity: f64,
    /// Outer circulation size in km
    pub circulation_size: f64,
    /// Accumulated cyclone energy (10^-4 kt^2)
    pub ace: f64,
    pub status: Status,
    /// Age at which subtropical characteristics are shed, if subtropical
    pub subtropical_until: Option<u32>,
    /// Age at which the monsoon-depression phase ends, if in one
    pub monsoon_until: Option<u32>,
    /// One-way latch set by the cold-SST condition
    pub is_transitioning: bool,
    pub extratropical: ExtratropicalStage,
    pub erc: ErcState,
    pub shear_event: ShearEvent,
    /// Sea-surface cooling from upwelling under a slow storm, °C
    pub upwelling_cooling: f64,
    pub wind_radii: WindRadii,
    /// Oldest first
    pub track: Vec<TrackPoint>,
}

impl Cyclone {
    /// A fresh tropical disturbance at a point. The genesis snapshot is
    /// recorded so that `age == 3 * (track.len() - 1)` holds from the start.
    pub fn new(lat: f64, lon: f64, intensity: f64, direction: f64, speed: f64, circulation_size: f64) -> Self {
        let mut cyclone = Self {
            lat,
            lon,
            direction,
            speed,
            age: 0,
            intensity,
            circulation_size,
            ace: 0.0,
            status: Status::Active,
            subtropical_until: None,
            monsoon_until: None,
            is_transitioning: false,
            extratropical: ExtratropicalStage::None,
            erc: ErcState::None,
            shear_event: ShearEvent::Inactive,
            upwelling_cooling: 0.0,
            wind_radii: WindRadii::default(),
            track: Vec::new(),
        };
        cyclone.record_track_point();
        cyclone
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    pub fn is_subtropical(&self) -> bool {
        self.subtropical_until.is_some()
    }

    pub fn is_monsoon_depression(&self) -> bool {
        self.monsoon_until.is_some()
    }

    pub fn is_extratropical(&self) -> bool {
        !matches!(self.extratropical, ExtratropicalStage::None)
    }

    pub fn track_point(&self) -> TrackPoint {
        TrackPoint {
            lon: self.lon,
            lat: self.lat,
            intensity: self.intensity,
            is_transitioning: self.is_transitioning,
            is_extratropical: self.is_extratropical(),
            circulation_size: self.circulation_size,
            is_subtropical: self.is_subtropical(),
        }
    }

    pub fn record_track_point(&mut self) {
        let point = self.track_point();
        self.track.push(point);
    }

    /// Whether the track length and age agree (`age == 3 * (len - 1)`).
    pub fn track_is_consistent(&self) -> bool {
        !self.track.is_empty() && self.age as usize == 3 * (self.track.len() - 1)
    }

    /// Dissipation rule evaluated at the end of every tick.
    pub fn meets_dissipation_criteria(&self) -> bool {
        self.intensity < 17.0
            || (self.is_extratropical() && self.intensity < 25.0)
            || self.lat.abs() > 70.0
    }

    /// Check that this is a state the lifecycle could have produced.
    /// Every violation is reported, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.track_is_consistent() {
            errors.push(format!(
                "track has {} points but age is {} h",
                self.track.len(),
                self.age
            ));
        } else if self.track.last() != Some(&self.track_point()) {
            errors.push("last track point does not match the storm".to_string());
        }

        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lon) {
            errors.push(format!("position {}, {} is off the globe", self.lat, self.lon));
        }
        if !self.intensity.is_finite() || self.intensity < MIN_INTENSITY_KT {
            errors.push(format!("intensity {} kt is below the floor", self.intensity));
        }
        if !(MIN_CIRCULATION_KM..=MAX_CIRCULATION_KM).contains(&self.circulation_size) {
            errors.push(format!("circulation size {} km is out of range", self.circulation_size));
        }
        if !(0.0..=MAX_UPWELLING_COOLING).contains(&self.upwelling_cooling) {
            errors.push(format!("upwelling cooling {} °C is out of range", self.upwelling_cooling));
        }

        match (self.status, self.meets_dissipation_criteria()) {
            (Status::Active, true) => {
                errors.push("storm is active but meets the dissipation criteria".to_string())
            }
            (Status::Dissipated, false) => {
                errors.push("storm is dissipated but does not meet the dissipation criteria".to_string())
            }
            _ => {}
        }

        let scheduled_past = |end_time: u32, max_hours: u32| end_time > self.age + max_hours;
        match self.erc {
            ErcState::Weakening { end_time, mpi_reduction } => {
                if scheduled_past(end_time, MAX_ERC_WEAKENING_HOURS) {
                    errors.push(format!("eyewall replacement weakening ends at {} h", end_time));
                }
                if !(15.0..=40.0).contains(&mpi_reduction) {
                    errors.push(format!("eyewall replacement reduction {} kt", mpi_reduction));
                }
            }
            ErcState::Recovering { end_time } if scheduled_past(end_time, MAX_ERC_RECOVERY_HOURS) => {
                errors.push(format!("eyewall replacement recovery ends at {} h", end_time));
            }
            _ => {}
        }
        if let ExtratropicalStage::Developing { end_time, max_intensity } = self.extratropical {
            if scheduled_past(end_time, MAX_ET_DEVELOPING_HOURS) {
                errors.push(format!("extratropical development ends at {} h", end_time));
            }
            if !(45.0..=90.0).contains(&max_intensity) {
                errors.push(format!("extratropical peak {} kt", max_intensity));
            }
        }
        match self.shear_event {
            ShearEvent::Active { end_time, .. } if scheduled_past(end_time, MAX_SHEAR_EVENT_HOURS) => {
                errors.push(format!("shear event ends at {} h", end_time));
            }
            _ => {}
        }
        if self.subtropical_until.is_some_and(|end| end > MAX_SUBTROPICAL_AGE) {
            errors.push("subtropical phase outlasts genesis scheduling".to_string());
        }
        if self.monsoon_until.is_some_and(|end| end > MAX_MONSOON_AGE) {
            errors.push("monsoon phase outlasts genesis scheduling".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
