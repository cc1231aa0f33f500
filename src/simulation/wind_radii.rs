use rand::prelude::*;

use crate::world::cyclone::WindRadii;

/// Fraction of the gap to the target closed each tick.
const SMOOTHING_RATE: f64 = 0.1;

/// Relax the 34/50/64 kt radii toward targets derived from the current
/// intensity and circulation size.
pub fn update_wind_radii(
    radii: &mut WindRadii,
    intensity: f64,
    circulation_size: f64,
    rng: &mut impl Rng,
) {
    let rmw = intensity * (0.75 + rng.r#gen::<f64>());

    let target_r34 = if intensity > 34.0 {
        circulation_size * ((intensity - 24.0) / (rmw * 0.6))
    } else {
        0.0
    };
    // Negative ratios would pull the radius below zero for weaker storms
    let target_r50 = target_r34 * ((intensity - 50.0) / rmw).max(0.0);
    let target_r64 = target_r34 * ((intensity - 64.0) / rmw).max(0.0);

    radii.r34 += (target_r34 - radii.r34) * SMOOTHING_RATE;
    radii.r50 += (target_r50 - radii.r50) * SMOOTHING_RATE;
    radii.r64 += (target_r64 - radii.r64) * SMOOTHING_RATE;
}
