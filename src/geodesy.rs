//! Great-circle helpers on top of `geo`'s haversine metric.

use geo::{Destination, Distance, Haversine, Point};

use crate::models::GeoPoint;

/// Mean Earth radius in meters, matching the radius `geo::Haversine` uses
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Length of one degree of latitude along a meridian
pub const METERS_PER_DEGREE_LAT: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Lower bounds are shrunk by this factor so float rounding never makes them exceed a true distance
const BOUND_SLACK: f64 = 1.0 - 1e-6;

/// Great-circle distance in meters
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Point reached by travelling `meters` from `origin` at `bearing_deg` (clockwise from north)
pub fn destination(origin: GeoPoint, bearing_deg: f64, meters: f64) -> GeoPoint {
    let p = Haversine.destination(Point::from(origin), bearing_deg, meters);
    GeoPoint::new(p.x(), p.y())
}

/// Meters spanned by one degree of longitude at `lat`
pub fn meters_per_degree_lon(lat: f64) -> f64 {
    METERS_PER_DEGREE_LAT * lat.to_radians().cos()
}

/// Lower bound on the great-circle distance from `p` to any point whose latitude
/// differs from `p.lat` by at least `dlat_deg`.
pub fn min_distance_for_lat_gap(dlat_deg: f64) -> f64 {
    if dlat_deg <= 0.0 {
        return 0.0;
    }
    dlat_deg.to_radians() * EARTH_RADIUS_M * BOUND_SLACK
}

/// Lower bound on the great-circle distance from `p` to any point whose longitude
/// differs from `p.lon` by at least `dlon_deg`: the distance from `p` to that meridian.
pub fn min_distance_for_lon_gap(p: GeoPoint, dlon_deg: f64) -> f64 {
    if dlon_deg <= 0.0 {
        return 0.0;
    }
    let dlon = dlon_deg.min(90.0).to_radians();
    let x = (p.lat.to_radians().cos() * dlon.sin()).clamp(0.0, 1.0);
    x.asin() * EARTH_RADIUS_M * BOUND_SLACK
}

/// Kilometers rounded to two decimals
pub fn round_km(meters: f64) -> f64 {
    (meters / 10.0).round() / 100.0
}
