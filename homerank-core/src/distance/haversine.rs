use geo::Coord;

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3_959.0;

/// Great-circle distance between two WGS84 coordinates, in miles.
///
/// Coordinates follow the `geo` convention of `x = longitude` and
/// `y = latitude`, both in degrees.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use homerank_core::haversine_miles;
///
/// let ny = Coord { x: -74.0060, y: 40.7128 };
/// let la = Coord { x: -118.2437, y: 34.0522 };
/// let miles = haversine_miles(ny, la);
/// assert!((miles - 2_445.0).abs() < 5.0);
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "spherical trigonometry")]
pub fn haversine_miles(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let lat1 = from.y.to_radians();
    let lat2 = to.y.to_radians();
    let dlat = (to.y - from.y).to_radians();
    let dlon = (to.x - from.x).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}
