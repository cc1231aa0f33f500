/// Longitude/latitude helpers shared by the pressure field, SST model and
/// the cyclone motion step.
///
/// Longitudes are degrees in [-180, 180]. Bearings are compass degrees
/// (0=N, 90=E, 180=S, 270=W).

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude used by the motion step.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Kilometres per nautical mile.
pub const KM_PER_NAUTICAL_MILE: f64 = 1.852;

/// Length of one simulation step in hours.
pub const STEP_HOURS: f64 = 3.0;

/// Floor for `cos(lat)` when converting an eastward distance to degrees of
/// longitude. Keeps the step finite at the poles.
const MIN_COS_LAT: f64 = 0.01;

/// Wrap a longitude into [-180, 180).
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Shortest signed angular distance `lon1 - lon2` in degrees, wrapping
/// across the dateline. Result lies in [-180, 180).
pub fn shortest_longitude_distance(lon1: f64, lon2: f64) -> f64 {
    normalize_longitude(lon1 - lon2)
}

/// Shortest signed turn from bearing `from` to bearing `to`, in [-180, 180).
pub fn bearing_difference(from: f64, to: f64) -> f64 {
    normalize_longitude(to - from)
}

/// Wrap a bearing into [0, 360).
pub fn normalize_bearing(bearing: f64) -> f64 {
    bearing.rem_euclid(360.0)
}

/// Convert a tangent-plane vector (east, north) to a bearing in degrees.
pub fn tangent_to_bearing(east: f64, north: f64) -> f64 {
    normalize_bearing(east.atan2(north).to_degrees())
}

/// Distance covered in one step, in degrees of arc, at `speed_kt` knots.
pub fn step_distance_degrees(speed_kt: f64) -> f64 {
    speed_kt * STEP_HOURS * KM_PER_NAUTICAL_MILE / KM_PER_DEGREE
}

/// Move a point `distance_deg` along compass `bearing` on an
/// equirectangular grid. Returns `(lat, lon)` with the longitude normalised.
pub fn step_position(lat: f64, lon: f64, bearing: f64, distance_deg: f64) -> (f64, f64) {
    let angle = (90.0 - bearing).to_radians();
    let cos_lat = lat.to_radians().cos().max(MIN_COS_LAT);

    let new_lat = (lat + distance_deg * angle.sin()).clamp(-90.0, 90.0);
    let new_lon = lon + distance_deg * angle.cos() / cos_lat;
    (new_lat, normalize_longitude(new_lon))
}

/// Great-circle (haversine) distance between two points in kilometres.
pub fn great_circle_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// 16-point compass name for a bearing.
pub fn compass_point(bearing: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let idx = (normalize_bearing(bearing) / 22.5 + 0.5).floor() as usize % 16;
    POINTS[idx]
}
