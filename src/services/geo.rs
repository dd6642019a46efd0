//! Geographic estimates for the mock matrix backend
//!
//! Offline runs and tests have no Distance Matrix API, so arc distances and
//! travel times are estimated from coordinates alone: great-circle distance,
//! scaled up to a road distance, divided by a motorway-ish average speed.

use crate::types::Coordinates;

/// Mean earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Dutch road network detour factor over the great-circle line
const ROAD_COEFFICIENT: f64 = 1.3;

/// Average door-to-door speed in km/h for intercity taxi trips
const AVERAGE_SPEED_KMH: f64 = 55.0;

/// Great-circle distance between two coordinates in kilometers.
///
/// Haversine on a spherical earth; at Dutch latitudes the error is far
/// smaller than what geocoding introduces, so nothing fancier is needed.
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    let half_dlat = (to.lat - from.lat).to_radians() / 2.0;
    let half_dlng = (to.lng - from.lng).to_radians() / 2.0;

    let h = half_dlat.sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * half_dlng.sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Estimate road distance in meters from the great-circle distance
pub fn road_distance_meters(from: &Coordinates, to: &Coordinates) -> i64 {
    (haversine_distance(from, to) * ROAD_COEFFICIENT * 1000.0) as i64
}

/// Estimate travel time in seconds
pub fn travel_time_seconds(from: &Coordinates, to: &Coordinates) -> i64 {
    let road_km = haversine_distance(from, to) * ROAD_COEFFICIENT;
    (road_km / AVERAGE_SPEED_KMH * 3600.0) as i64
}
