//! Shared defaults for the optimizer and its adapters

use crate::types::{Coordinates, VehicleSpec};

/// Dummy depot every vehicle starts and ends at (Rotterdam dispatch office)
pub fn default_depot() -> Coordinates {
    Coordinates {
        lat: 51.92173421692392,
        lng: 4.487105575001821,
    }
}

/// Default fleet: three wheelchair-capable taxis plus one seats-only taxi
pub fn default_fleet() -> Vec<VehicleSpec> {
    vec![
        VehicleSpec::new(8, 2),
        VehicleSpec::new(8, 2),
        VehicleSpec::new(8, 2),
        VehicleSpec::new(8, 0),
    ]
}

/// Dwell time at every non-depot stop, seconds
pub const DEFAULT_SERVICE_TIME_SEC: i64 = 300;

/// Pickup may happen this many seconds before or after the requested time
pub const DEFAULT_PICKUP_TOLERANCE_SEC: i64 = 1500;

/// Delivery may happen up to this many seconds after the requested time
/// (never before it)
pub const DEFAULT_DELIVERY_LATE_SEC: i64 = 1500;

/// Wall-clock budget for one solve, seconds
pub const DEFAULT_SOLVE_TIME_LIMIT_SEC: u64 = 30;

/// Objective penalty for leaving a booking unserved
pub const DEFAULT_DROP_PENALTY: i64 = 100_000_000;

/// Matrix value for unreachable location pairs
pub const UNREACHABLE_PENALTY: i64 = 1_000_000_000;

/// Effective seat footprint cap shared by passengers and wheelchairs
pub const SHARED_SPACE_SEATS: i64 = 8;

/// One secured wheelchair occupies the footprint of two ordinary seats
pub const WHEELCHAIR_SEAT_FOOTPRINT: i64 = 2;

/// Waiting slack allowed at any stop, seconds (12 h)
pub const TIME_SLACK_SEC: i64 = 43_200;

/// Added to the latest time-window end to form the per-route time horizon
pub const HORIZON_BUFFER_SEC: i64 = 86_400;

/// Depot window padding on each side of the booked day, seconds
pub const DEPOT_WINDOW_PADDING_SEC: i64 = 3_600;

/// Upper bound on cumulative route distance, meters
pub const MAX_ROUTE_DISTANCE_M: i64 = 2_000_000;

/// Workload balancing: weight on the largest per-route distance
pub const DISTANCE_SPAN_COEFFICIENT: i64 = 100;

/// Workload balancing: weight on the fleet-wide time span
pub const TIME_SPAN_COEFFICIENT: i64 = 50;
