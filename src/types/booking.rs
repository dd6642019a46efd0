//! Booking and coordinate types
//!
//! Bookings arrive as JSON (camelCase keys from the dispatch frontend) or via
//! the CSV importer. Internally all times are reduced to seconds since
//! midnight of the booking's calendar day.

use chrono::{DateTime, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

/// Geographic coordinates (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "latitude")]
    pub lat: f64,
    #[serde(rename = "longitude")]
    pub lng: f64,
}

impl Coordinates {
    /// Placeholder coordinates used by the CSV importer before geocoding
    pub fn zero() -> Self {
        Self { lat: 0.0, lng: 0.0 }
    }

    /// True for missing/placeholder coordinates that still need geocoding
    pub fn is_zero(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }
}

/// A single transport request: one pickup and one delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    /// Customer name, advisory (output only)
    #[serde(default)]
    pub customer: String,
    pub passengers: u32,
    /// Wheelchairs travelling with the booking; absent in older exports
    #[serde(default)]
    pub wheelchairs: u32,
    #[serde(alias = "pickupTime")]
    pub pickup_time: DateTime<FixedOffset>,
    #[serde(alias = "pickupAddress", default)]
    pub pickup_address: String,
    #[serde(alias = "deliveryTime")]
    pub delivery_time: DateTime<FixedOffset>,
    #[serde(alias = "deliveryAddress", default)]
    pub delivery_address: String,
    pub pickup: Option<Coordinates>,
    pub delivery: Option<Coordinates>,
}

impl Booking {
    /// Requested pickup time as seconds since midnight
    pub fn pickup_seconds(&self) -> i64 {
        seconds_from_midnight(&self.pickup_time)
    }

    /// Requested delivery time as seconds since midnight
    pub fn delivery_seconds(&self) -> i64 {
        seconds_from_midnight(&self.delivery_time)
    }

    /// True when the pickup coordinates still need geocoding
    pub fn needs_pickup_geocoding(&self) -> bool {
        self.pickup.map(|c| c.is_zero()).unwrap_or(true)
    }

    /// True when the delivery coordinates still need geocoding
    pub fn needs_delivery_geocoding(&self) -> bool {
        self.delivery.map(|c| c.is_zero()).unwrap_or(true)
    }

    /// Validate fields the solver depends on. Runs before geocoding, so
    /// coordinates are not checked here.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("booking id must not be empty".to_string());
        }
        if self.passengers == 0 && self.wheelchairs == 0 {
            return Err(format!(
                "booking {} carries neither passengers nor wheelchairs",
                self.id
            ));
        }
        if self.needs_pickup_geocoding() && self.pickup_address.trim().is_empty() {
            return Err(format!(
                "booking {} has no pickup coordinates and no pickup address",
                self.id
            ));
        }
        if self.needs_delivery_geocoding() && self.delivery_address.trim().is_empty() {
            return Err(format!(
                "booking {} has no delivery coordinates and no delivery address",
                self.id
            ));
        }
        Ok(())
    }
}

/// Seconds since midnight of the timestamp's own wall-clock day.
/// The date and offset are kept only for display; the solver plans a single
/// calendar day.
fn seconds_from_midnight(ts: &DateTime<FixedOffset>) -> i64 {
    ts.time().num_seconds_from_midnight() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "id": "15706825",
            "customer": "Langelaar",
            "passengers": 2,
            "wheelchairs": 0,
            "pickupTime": "2025-07-22T07:21:00+00:00",
            "pickupAddress": "Prinses Margrietstraat 15 3314NP Dordrecht",
            "deliveryTime": "2025-07-22T08:30:00+00:00",
            "deliveryAddress": "Catsheuvel 37 2517JZ 's-Gravenhage",
            "pickup": { "latitude": 51.7991788, "longitude": 4.6682264 },
            "delivery": { "latitude": 52.091497, "longitude": 4.2807814 }
        }"#
    }

    #[test]
    fn test_parse_booking_camel_case() {
        let booking: Booking = serde_json::from_str(sample_json()).unwrap();

        assert_eq!(booking.id, "15706825");
        assert_eq!(booking.passengers, 2);
        assert_eq!(booking.wheelchairs, 0);
        assert!((booking.pickup.unwrap().lat - 51.7991788).abs() < 1e-9);
    }

    #[test]
    fn test_parse_booking_missing_wheelchairs_defaults_zero() {
        let json = r#"{
            "id": "1",
            "customer": "X",
            "passengers": 1,
            "pickupTime": "2025-07-22T07:00:00+00:00",
            "pickupAddress": "A",
            "deliveryTime": "2025-07-22T08:00:00+00:00",
            "deliveryAddress": "B",
            "pickup": { "latitude": 51.0, "longitude": 4.0 },
            "delivery": { "latitude": 52.0, "longitude": 5.0 }
        }"#;
        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.wheelchairs, 0);
    }

    #[test]
    fn test_seconds_from_midnight() {
        let booking: Booking = serde_json::from_str(sample_json()).unwrap();
        // 07:21 = 7*3600 + 21*60
        assert_eq!(booking.pickup_seconds(), 7 * 3600 + 21 * 60);
        // 08:30
        assert_eq!(booking.delivery_seconds(), 8 * 3600 + 30 * 60);
    }

    #[test]
    fn test_serializes_snake_case() {
        let booking: Booking = serde_json::from_str(sample_json()).unwrap();
        let value = serde_json::to_value(&booking).unwrap();

        assert!(value.get("pickup_time").is_some());
        assert!(value.get("pickupTime").is_none());
        assert!(value["pickup"].get("latitude").is_some());
    }

    #[test]
    fn test_zero_coordinates_need_geocoding() {
        let mut booking: Booking = serde_json::from_str(sample_json()).unwrap();
        assert!(!booking.needs_pickup_geocoding());

        booking.pickup = Some(Coordinates::zero());
        assert!(booking.needs_pickup_geocoding());

        booking.delivery = None;
        assert!(booking.needs_delivery_geocoding());
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let mut booking: Booking = serde_json::from_str(sample_json()).unwrap();
        booking.id = "  ".to_string();
        assert!(booking.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_load() {
        let mut booking: Booking = serde_json::from_str(sample_json()).unwrap();
        booking.passengers = 0;
        booking.wheelchairs = 0;
        assert!(booking.validate().is_err());
    }

    #[test]
    fn test_validate_requires_address_when_ungeocode() {
        let mut booking: Booking = serde_json::from_str(sample_json()).unwrap();
        booking.pickup = None;
        booking.pickup_address = String::new();
        assert!(booking.validate().is_err());

        booking.pickup_address = "Somewhere 1".to_string();
        assert!(booking.validate().is_ok());
    }
}
