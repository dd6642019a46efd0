//! Problem model builder
//!
//! Converts a validated booking list plus distance/time matrices into the
//! internal routing instance. Node 0 is the shared dummy depot; booking k
//! (1-indexed) contributes pickup node 2k−1 and delivery node 2k.

use crate::defaults::{DEPOT_WINDOW_PADDING_SEC, HORIZON_BUFFER_SEC};
use crate::services::routing::DistanceTimeMatrices;
use crate::types::{Booking, Coordinates, VehicleSpec};

use super::config::OptimizerSettings;
use super::OptimizeError;

/// Closed time window in seconds since midnight
pub type TimeWindow = (i64, i64);

/// Which half of a booking a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    Pickup,
    Dropoff,
}

/// The routing instance: locations, matrices, windows, demands and fleet.
/// Built once per solve and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Problem {
    pub bookings: Vec<Booking>,
    pub locations: Vec<Coordinates>,
    /// Meters, node to node
    pub distances: Vec<Vec<i64>>,
    /// Seconds, node to node
    pub travel_times: Vec<Vec<i64>>,
    /// Per-node [start, end], index 0 is the depot window
    pub time_windows: Vec<TimeWindow>,
    /// Signed seat demand per node (+p at pickup, −p at delivery, 0 at depot)
    pub seat_demands: Vec<i64>,
    /// Signed wheelchair demand per node
    pub wheelchair_demands: Vec<i64>,
    /// (pickup node, delivery node) per booking, in input order
    pub pairs: Vec<(usize, usize)>,
    pub fleet: Vec<VehicleSpec>,
    /// Dwell time at non-depot stops, seconds
    pub service_time: i64,
    /// Upper bound on any cumulative time value
    pub horizon: i64,
    /// Objective penalty per unserved booking
    pub drop_penalty: i64,
}

/// Pickup node index for the k-th booking (0-indexed)
pub fn pickup_node(booking_idx: usize) -> usize {
    2 * booking_idx + 1
}

/// Delivery node index for the k-th booking (0-indexed)
pub fn delivery_node(booking_idx: usize) -> usize {
    2 * booking_idx + 2
}

/// Ordered location list with the depot at index 0.
/// Fails when a booking still lacks coordinates after geocoding.
pub fn build_locations(
    depot: &Coordinates,
    bookings: &[Booking],
) -> Result<Vec<Coordinates>, OptimizeError> {
    let mut locations = Vec::with_capacity(1 + 2 * bookings.len());
    locations.push(*depot);

    for booking in bookings {
        let pickup = booking.pickup.filter(|c| !c.is_zero()).ok_or_else(|| {
            OptimizeError::InvalidInput(format!(
                "booking {} has no pickup coordinates after geocoding",
                booking.id
            ))
        })?;
        let delivery = booking.delivery.filter(|c| !c.is_zero()).ok_or_else(|| {
            OptimizeError::InvalidInput(format!(
                "booking {} has no delivery coordinates after geocoding",
                booking.id
            ))
        })?;
        locations.push(pickup);
        locations.push(delivery);
    }

    Ok(locations)
}

impl Problem {
    /// Build the routing instance from bookings and provider matrices.
    pub fn build(
        bookings: Vec<Booking>,
        matrices: &DistanceTimeMatrices,
        settings: &OptimizerSettings,
    ) -> Result<Self, OptimizeError> {
        if bookings.is_empty() {
            return Err(OptimizeError::EmptyProblem);
        }

        let n = 1 + 2 * bookings.len();
        if !matrices.is_square(n) {
            return Err(OptimizeError::MatrixShape {
                expected: n,
                rows: matrices.distances.len(),
                cols: matrices.distances.first().map(|r| r.len()).unwrap_or(0),
            });
        }

        let locations = build_locations(&settings.depot, &bookings)?;

        let mut time_windows: Vec<TimeWindow> = Vec::with_capacity(n);
        let mut seat_demands: Vec<i64> = Vec::with_capacity(n);
        let mut wheelchair_demands: Vec<i64> = Vec::with_capacity(n);
        let mut pairs = Vec::with_capacity(bookings.len());

        // Depot placeholder, replaced once all booking windows are known
        time_windows.push((0, 0));
        seat_demands.push(0);
        wheelchair_demands.push(0);

        let mut earliest_pickup = i64::MAX;
        let mut latest_delivery = 0i64;

        for (idx, booking) in bookings.iter().enumerate() {
            let pickup_time = booking.pickup_seconds();
            let delivery_time = booking.delivery_seconds();

            let pickup_window = (
                pickup_time - settings.pickup_tolerance_sec,
                pickup_time + settings.pickup_tolerance_sec,
            );
            // No early tolerance on deliveries
            let delivery_window = (delivery_time, delivery_time + settings.delivery_late_sec);

            time_windows.push(pickup_window);
            time_windows.push(delivery_window);

            let seats = booking.passengers as i64;
            let wheelchairs = booking.wheelchairs as i64;
            seat_demands.push(seats);
            seat_demands.push(-seats);
            wheelchair_demands.push(wheelchairs);
            wheelchair_demands.push(-wheelchairs);

            pairs.push((pickup_node(idx), delivery_node(idx)));

            earliest_pickup = earliest_pickup.min(pickup_window.0);
            latest_delivery = latest_delivery.max(delivery_window.1);
        }

        // Depot window spans the busiest day with an hour of slack each side
        time_windows[0] = (
            (earliest_pickup - DEPOT_WINDOW_PADDING_SEC).max(0),
            latest_delivery + DEPOT_WINDOW_PADDING_SEC,
        );

        let max_window_end = time_windows
            .iter()
            .map(|&(_, end)| end)
            .max()
            .unwrap_or(0);

        Ok(Self {
            bookings,
            locations,
            distances: matrices.distances.clone(),
            travel_times: matrices.durations.clone(),
            time_windows,
            seat_demands,
            wheelchair_demands,
            pairs,
            fleet: settings.fleet.clone(),
            service_time: settings.service_time_sec,
            horizon: max_window_end + HORIZON_BUFFER_SEC,
            drop_penalty: settings.drop_penalty,
        })
    }

    /// Total node count including the depot
    pub fn node_count(&self) -> usize {
        self.locations.len()
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    pub fn vehicle_count(&self) -> usize {
        self.fleet.len()
    }

    /// Depot time window
    pub fn depot_window(&self) -> TimeWindow {
        self.time_windows[0]
    }

    /// Map a node back to its booking and stop kind; None for the depot
    pub fn booking_of_node(&self, node: usize) -> Option<(usize, StopKind)> {
        if node == 0 || node >= self.node_count() {
            return None;
        }
        let booking_idx = (node - 1) / 2;
        let kind = if node % 2 == 1 {
            StopKind::Pickup
        } else {
            StopKind::Dropoff
        };
        Some((booking_idx, kind))
    }

    /// Service time paid when arriving at a node (zero at the depot)
    pub fn service_at(&self, node: usize) -> i64 {
        if node == 0 {
            0
        } else {
            self.service_time
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::optimizer::test_support::{booking, matrices_with_uniform, settings};

    #[test]
    fn test_node_indexing() {
        assert_eq!(pickup_node(0), 1);
        assert_eq!(delivery_node(0), 2);
        assert_eq!(pickup_node(2), 5);
        assert_eq!(delivery_node(2), 6);
    }

    #[test]
    fn test_build_empty_bookings_fails() {
        let matrices = matrices_with_uniform(1, 0, 0);
        let err = Problem::build(vec![], &matrices, &settings()).unwrap_err();
        assert!(matches!(err, OptimizeError::EmptyProblem));
    }

    #[test]
    fn test_build_matrix_shape_mismatch() {
        let bookings = vec![booking("a", 1, 0, "09:00", "09:30")];
        // One booking needs a 3x3 matrix
        let matrices = matrices_with_uniform(2, 1000, 300);

        let err = Problem::build(bookings, &matrices, &settings()).unwrap_err();
        assert!(matches!(err, OptimizeError::MatrixShape { expected: 3, .. }));
    }

    #[test]
    fn test_time_windows_and_demands() {
        let bookings = vec![
            booking("a", 2, 1, "09:00", "09:30"),
            booking("b", 1, 0, "10:00", "11:00"),
        ];
        let matrices = matrices_with_uniform(5, 1000, 300);
        let problem = Problem::build(bookings, &matrices, &settings()).unwrap();

        // Pickup window is symmetric ±25 min around 09:00
        assert_eq!(problem.time_windows[1], (9 * 3600 - 1500, 9 * 3600 + 1500));
        // Delivery window only tolerates lateness
        assert_eq!(problem.time_windows[2], (9 * 3600 + 1800, 9 * 3600 + 1800 + 1500));

        assert_eq!(problem.seat_demands, vec![0, 2, -2, 1, -1]);
        assert_eq!(problem.wheelchair_demands, vec![0, 1, -1, 0, 0]);
        assert_eq!(problem.pairs, vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn test_depot_window_padding() {
        let bookings = vec![booking("a", 1, 0, "09:00", "09:30")];
        let matrices = matrices_with_uniform(3, 1000, 300);
        let problem = Problem::build(bookings, &matrices, &settings()).unwrap();

        let (start, end) = problem.depot_window();
        // earliest pickup start 08:35 minus one hour
        assert_eq!(start, 9 * 3600 - 1500 - 3600);
        // latest delivery end 09:55 plus one hour
        assert_eq!(end, 9 * 3600 + 1800 + 1500 + 3600);
    }

    #[test]
    fn test_depot_window_clamps_at_midnight() {
        let bookings = vec![booking("a", 1, 0, "00:10", "01:00")];
        let matrices = matrices_with_uniform(3, 1000, 300);
        let problem = Problem::build(bookings, &matrices, &settings()).unwrap();

        assert_eq!(problem.depot_window().0, 0);
    }

    #[test]
    fn test_booking_of_node() {
        let bookings = vec![
            booking("a", 1, 0, "09:00", "09:30"),
            booking("b", 1, 0, "10:00", "11:00"),
        ];
        let matrices = matrices_with_uniform(5, 1000, 300);
        let problem = Problem::build(bookings, &matrices, &settings()).unwrap();

        assert_eq!(problem.booking_of_node(0), None);
        assert_eq!(problem.booking_of_node(1), Some((0, StopKind::Pickup)));
        assert_eq!(problem.booking_of_node(2), Some((0, StopKind::Dropoff)));
        assert_eq!(problem.booking_of_node(3), Some((1, StopKind::Pickup)));
        assert_eq!(problem.booking_of_node(4), Some((1, StopKind::Dropoff)));
        assert_eq!(problem.booking_of_node(5), None);
    }

    #[test]
    fn test_horizon_covers_latest_window() {
        let bookings = vec![booking("a", 1, 0, "09:00", "09:30")];
        let matrices = matrices_with_uniform(3, 1000, 300);
        let problem = Problem::build(bookings, &matrices, &settings()).unwrap();

        let latest = problem.time_windows.iter().map(|&(_, e)| e).max().unwrap();
        assert_eq!(problem.horizon, latest + 86_400);
    }

    #[test]
    fn test_build_locations_requires_coordinates() {
        let mut b = booking("a", 1, 0, "09:00", "09:30");
        b.pickup = None;
        let err = build_locations(&crate::defaults::default_depot(), &[b]).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidInput(_)));
    }

    #[test]
    fn test_service_time_zero_at_depot() {
        let bookings = vec![booking("a", 1, 0, "09:00", "09:30")];
        let matrices = matrices_with_uniform(3, 1000, 300);
        let problem = Problem::build(bookings, &matrices, &settings()).unwrap();

        assert_eq!(problem.service_at(0), 0);
        assert_eq!(problem.service_at(1), 300);
    }
}
