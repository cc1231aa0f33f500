//! Storm classification and unit conversions used by reports and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference sea-level pressure in hPa for the wind-pressure relation.
pub const REFERENCE_PRESSURE_HPA: f64 = 1013.25;
/// Central pressure never reported below this, in hPa.
pub const MIN_CENTRAL_PRESSURE_HPA: f64 = 640.0;

const WIND_PRESSURE_COEFFICIENT: f64 = 11.5;
const WIND_PRESSURE_EXPONENT: f64 = 1.6;
const WIND_PRESSURE_REFERENCE_KT: f64 = 48.0;
const SIZE_DEEPENING_PER_KM: f64 = 0.002;

fn size_factor(circulation_size: f64) -> f64 {
    1.0 + SIZE_DEEPENING_PER_KM * circulation_size
}

/// Central pressure (hPa, whole number) for a maximum wind in knots. Larger
/// circulations deepen the pressure for the same wind.
pub fn wind_to_pressure(wind_kt: f64, circulation_size: f64) -> f64 {
    let deficit = WIND_PRESSURE_COEFFICIENT * wind_kt.max(0.0).powf(WIND_PRESSURE_EXPONENT)
        / WIND_PRESSURE_REFERENCE_KT.powf(WIND_PRESSURE_EXPONENT);
    let pressure = REFERENCE_PRESSURE_HPA - deficit * size_factor(circulation_size);
    pressure.round().max(MIN_CENTRAL_PRESSURE_HPA)
}

/// Inverse of [`wind_to_pressure`] for the same circulation size, up to the
/// rounding of the pressure.
pub fn pressure_to_wind(pressure_hpa: f64, circulation_size: f64) -> f64 {
    let deficit = (REFERENCE_PRESSURE_HPA - pressure_hpa).max(0.0) / size_factor(circulation_size);
    (deficit * WIND_PRESSURE_REFERENCE_KT.powf(WIND_PRESSURE_EXPONENT) / WIND_PRESSURE_COEFFICIENT)
        .powf(1.0 / WIND_PRESSURE_EXPONENT)
}

pub fn knots_to_kph(kt: f64) -> f64 {
    (kt * 1.852).round()
}

pub fn knots_to_mph(kt: f64) -> f64 {
    (kt * 1.15078).round()
}

/// Best-track system type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AtcfType {
    /// Subtropical depression
    SD,
    /// Subtropical storm
    SS,
    /// Extratropical
    EX,
    /// Super typhoon
    ST,
    /// Typhoon
    TY,
    /// Tropical storm
    TS,
    /// Tropical depression
    TD,
    /// Disturbance
    DB,
    /// Low
    LO,
}

impl AtcfType {
    pub fn classify(wind_kt: f64, is_extratropical: bool, is_subtropical: bool) -> AtcfType {
        if is_subtropical {
            return if wind_kt < 34.0 { AtcfType::SD } else { AtcfType::SS };
        }
        if is_extratropical {
            return AtcfType::EX;
        }
        match wind_kt {
            w if w >= 130.0 => AtcfType::ST,
            w if w >= 64.0 => AtcfType::TY,
            w if w >= 34.0 => AtcfType::TS,
            w if w >= 24.0 => AtcfType::TD,
            w if w > 0.0 => AtcfType::DB,
            _ => AtcfType::LO,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AtcfType::SD => "SD",
            AtcfType::SS => "SS",
            AtcfType::EX => "EX",
            AtcfType::ST => "ST",
            AtcfType::TY => "TY",
            AtcfType::TS => "TS",
            AtcfType::TD => "TD",
            AtcfType::DB => "DB",
            AtcfType::LO => "LO",
        }
    }
}

impl fmt::Display for AtcfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Saffir-Simpson style ladder with subtropical and extratropical overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    SubtropicalDepression,
    SubtropicalStorm,
    Extratropical,
    Transitioning,
    LowPressureArea,
    TropicalDepression,
    TropicalStorm,
    Cat1,
    Cat2,
    Cat3,
    Cat4,
    Cat5,
}

impl Category {
    pub fn classify(
        wind_kt: f64,
        is_transitioning: bool,
        is_extratropical: bool,
        is_subtropical: bool,
    ) -> Category {
        if is_subtropical {
            return if wind_kt < 34.0 {
                Category::SubtropicalDepression
            } else {
                Category::SubtropicalStorm
            };
        }
        if is_extratropical {
            return Category::Extratropical;
        }
        if is_transitioning {
            return Category::Transitioning;
        }
        match wind_kt {
            w if w < 24.0 => Category::LowPressureArea,
            w if w < 34.0 => Category::TropicalDepression,
            w if w < 64.0 => Category::TropicalStorm,
            w if w < 83.0 => Category::Cat1,
            w if w < 96.0 => Category::Cat2,
            w if w < 113.0 => Category::Cat3,
            w if w < 137.0 => Category::Cat4,
            _ => Category::Cat5,
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Category::SubtropicalDepression => "SD",
            Category::SubtropicalStorm => "SS",
            Category::Extratropical => "EXT",
            Category::Transitioning => "ET",
            Category::LowPressureArea => "LPA",
            Category::TropicalDepression => "TD",
            Category::TropicalStorm => "TS",
            Category::Cat1 => "Cat 1",
            Category::Cat2 => "Cat 2",
            Category::Cat3 => "Cat 3",
            Category::Cat4 => "Cat 4",
            Category::Cat5 => "Cat 5",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::SubtropicalDepression => "Subtropical Depression",
            Category::SubtropicalStorm => "Subtropical Storm",
            Category::Extratropical => "Extratropical Cyclone",
            Category::Transitioning => "Extratropical Transition",
            Category::LowPressureArea => "Low Pressure Area",
            Category::TropicalDepression => "Tropical Depression",
            Category::TropicalStorm => "Tropical Storm",
            Category::Cat1 => "Category 1",
            Category::Cat2 => "Category 2",
            Category::Cat3 => "Category 3 (Major)",
            Category::Cat4 => "Category 4 (Major)",
            Category::Cat5 => "Category 5 (Major)",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calm_is_reference_pressure() {
        assert_eq!(wind_to_pressure(0.0, 300.0), 1013.0);
    }

    #[test]
    fn stronger_winds_lower_pressure() {
        let mut last = f64::MAX;
        for kt in (20..=160).step_by(10) {
            let p = wind_to_pressure(kt as f64, 300.0);
            assert!(p < last, "{} kt -> {} hPa", kt, p);
            last = p;
        }
    }

    #[test]
    fn larger_storms_are_deeper() {
        assert!(wind_to_pressure(100.0, 700.0) < wind_to_pressure(100.0, 200.0));
    }

    #[test]
    fn pressure_floor_applies() {
        assert_eq!(wind_to_pressure(400.0, 800.0), MIN_CENTRAL_PRESSURE_HPA);
    }

    #[test]
    fn pressure_to_wind_inverts_wind_to_pressure() {
        for size in [150.0, 300.0, 600.0] {
            for kt in 30..=150 {
                let kt = kt as f64;
                let back = pressure_to_wind(wind_to_pressure(kt, size), size);
                assert!((back - kt).abs() < 2.0, "{} kt (size {}) -> {}", kt, size, back);
            }
        }
    }

    #[test]
    fn pressure_to_wind_is_zero_at_or_above_reference() {
        assert_eq!(pressure_to_wind(1020.0, 300.0), 0.0);
    }

    #[test]
    fn atcf_thresholds() {
        assert_eq!(AtcfType::classify(0.0, false, false), AtcfType::LO);
        assert_eq!(AtcfType::classify(15.0, false, false), AtcfType::DB);
        assert_eq!(AtcfType::classify(24.0, false, false), AtcfType::TD);
        assert_eq!(AtcfType::classify(34.0, false, false), AtcfType::TS);
        assert_eq!(AtcfType::classify(64.0, false, false), AtcfType::TY);
        assert_eq!(AtcfType::classify(130.0, false, false), AtcfType::ST);
        assert_eq!(AtcfType::classify(130.0, true, false), AtcfType::EX);
        assert_eq!(AtcfType::classify(30.0, true, true), AtcfType::SD);
        assert_eq!(AtcfType::classify(40.0, false, true), AtcfType::SS);
        assert_eq!(AtcfType::TY.to_string(), "TY");
    }

    #[test]
    fn category_ladder() {
        let cases = [
            (20.0, Category::LowPressureArea),
            (30.0, Category::TropicalDepression),
            (50.0, Category::TropicalStorm),
            (70.0, Category::Cat1),
            (90.0, Category::Cat2),
            (100.0, Category::Cat3),
            (120.0, Category::Cat4),
            (140.0, Category::Cat5),
        ];
        for (kt, expected) in cases {
            assert_eq!(Category::classify(kt, false, false, false), expected, "{} kt", kt);
        }
        assert_eq!(Category::classify(140.0, true, false, false), Category::Transitioning);
        assert_eq!(Category::classify(140.0, true, true, false), Category::Extratropical);
        assert_eq!(Category::classify(20.0, true, true, true), Category::SubtropicalDepression);
        assert_eq!(Category::Cat4.short_name(), "Cat 4");
    }

    #[test]
    fn unit_conversions_round() {
        assert_eq!(knots_to_kph(100.0), 185.0);
        assert_eq!(knots_to_mph(100.0), 115.0);
    }
}
