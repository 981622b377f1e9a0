//! Navigation math: great-circle distance/bearing, polar/cartesian
//! conversion, and lat/lon offset by a planar distance.
//!
//! All angle inputs/outputs are degrees unless noted; internal trig
//! uses radians.

pub const EARTH_RADIUS: f64 = 6372008.8;
pub const MS_TO_KNT: f64 = 1.9438444924406045;
pub const KNT_TO_MS: f64 = 1.0 / MS_TO_KNT;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

/// Great-circle distance between two WGS84 points, in meters.
pub fn distance_haversine(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let phi_a = lat_a * DEG_TO_RAD;
    let phi_b = lat_b * DEG_TO_RAD;
    let lambda_a = lon_a * DEG_TO_RAD;
    let lambda_b = lon_b * DEG_TO_RAD;

    let a = ((phi_b - phi_a) / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * ((lambda_b - lambda_a) / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * a.sqrt().asin()
}

/// Bearing from `(lat_own, lon_own)` to `(lat_other, lon_other)`,
/// relative to `heading` (pass `0.0` for an absolute bearing). Result is
/// in `[0, 360)` — callers needing a signed `[-180, 180]` error subtract
/// 360 when the result exceeds 180, matching the source.
pub fn relative_bearing(
    heading: f64,
    lat_own: f64,
    lon_own: f64,
    lat_other: f64,
    lon_other: f64,
) -> f64 {
    let lat_own = DEG_TO_RAD * lat_own;
    let lon_own = DEG_TO_RAD * lon_own;
    let lat_other = DEG_TO_RAD * lat_other;
    let lon_other = DEG_TO_RAD * lon_other;

    let delta = lon_other - lon_own;
    let theta = (delta.sin() * lat_other.cos()).atan2(
        lat_own.cos() * lat_other.sin() - lat_own.sin() * lat_other.cos() * delta.cos(),
    );

    ((theta * RAD_TO_DEG) + 720.0 - heading).rem_euclid(360.0)
}

/// Heading of `heading_other` relative to `heading_own`, in `[0, 360)`.
pub fn relative_heading(heading_own: f64, heading_other: f64) -> f64 {
    (720.0 - heading_own + heading_other).rem_euclid(360.0)
}

/// Convert a polar `(angle degrees, distance)` pair to planar
/// `(x, y)` meters.
pub fn polar_to_cartesian(angle: f64, distance: f64) -> (f64, f64) {
    let phi = angle * DEG_TO_RAD;
    (distance * phi.cos(), distance * phi.sin())
}

/// Shift `lon` east by `distance` meters at latitude `lat`.
pub fn shift_long(lat: f64, lon: f64, distance: f64) -> f64 {
    let phi_a = lat * DEG_TO_RAD;
    let lambda_a = lon * DEG_TO_RAD;
    let lambda_b = lambda_a + 2.0 * (distance / (2.0 * EARTH_RADIUS * phi_a.cos())).asin();
    lambda_b * RAD_TO_DEG
}

/// Shift `lat` north by `distance` meters.
pub fn shift_lat(lat: f64, _lon: f64, distance: f64) -> f64 {
    let phi_a = lat * DEG_TO_RAD;
    let phi_b = phi_a + 2.0 * (distance / (2.0 * EARTH_RADIUS)).asin();
    phi_b * RAD_TO_DEG
}
