//! Fleet and vehicle capacity types

use serde::{Deserialize, Serialize};

/// Per-vehicle capacities. Every vehicle starts and ends at the depot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSpec {
    /// Ordinary seats
    pub seat_capacity: i64,
    /// Wheelchair tie-down spaces
    pub wheelchair_capacity: i64,
}

impl VehicleSpec {
    pub fn new(seat_capacity: i64, wheelchair_capacity: i64) -> Self {
        Self {
            seat_capacity,
            wheelchair_capacity,
        }
    }
}

/// Parse a fleet description of the form `"8:2,8:2,8:2,8:0"`
/// (seatCapacity:wheelchairCapacity per vehicle, comma separated).
pub fn parse_fleet(spec: &str) -> Result<Vec<VehicleSpec>, String> {
    let mut fleet = Vec::new();
    for (idx, part) in spec.split(',').enumerate() {
        let part = part.trim();
        let (seats, wheelchairs) = part
            .split_once(':')
            .ok_or_else(|| format!("vehicle {}: expected seats:wheelchairs, got '{}'", idx, part))?;
        let seats: i64 = seats
            .trim()
            .parse()
            .map_err(|_| format!("vehicle {}: invalid seat capacity '{}'", idx, seats))?;
        let wheelchairs: i64 = wheelchairs
            .trim()
            .parse()
            .map_err(|_| format!("vehicle {}: invalid wheelchair capacity '{}'", idx, wheelchairs))?;
        if seats < 0 || wheelchairs < 0 {
            return Err(format!("vehicle {}: capacities must be non-negative", idx));
        }
        fleet.push(VehicleSpec::new(seats, wheelchairs));
    }
    if fleet.is_empty() {
        return Err("fleet must contain at least one vehicle".to_string());
    }
    Ok(fleet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fleet_default_shape() {
        let fleet = parse_fleet("8:2,8:2,8:2,8:0").unwrap();
        assert_eq!(fleet.len(), 4);
        assert_eq!(fleet[0], VehicleSpec::new(8, 2));
        assert_eq!(fleet[3], VehicleSpec::new(8, 0));
    }

    #[test]
    fn test_parse_fleet_with_spaces() {
        let fleet = parse_fleet(" 6:1 , 4:0 ").unwrap();
        assert_eq!(fleet.len(), 2);
        assert_eq!(fleet[0].seat_capacity, 6);
        assert_eq!(fleet[1].wheelchair_capacity, 0);
    }

    #[test]
    fn test_parse_fleet_rejects_garbage() {
        assert!(parse_fleet("").is_err());
        assert!(parse_fleet("8").is_err());
        assert!(parse_fleet("8:two").is_err());
        assert!(parse_fleet("8:-1").is_err());
    }

    #[test]
    fn test_vehicle_spec_serde_camel_case() {
        let json = r#"{"seatCapacity": 8, "wheelchairCapacity": 2}"#;
        let spec: VehicleSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec, VehicleSpec::new(8, 2));
    }
}
