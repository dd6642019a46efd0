//! Solution extraction
//!
//! Projects the solver's best assignment onto the output schema: one cluster
//! per used vehicle with the visited path and per-booking pickup/dropoff
//! times, plus the bookings that could not be served.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Booking;

use super::problem::{Problem, StopKind};
use super::search::Assignment;

impl Serialize for StopKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StopKind::Pickup => serializer.serialize_str("Pickup"),
            StopKind::Dropoff => serializer.serialize_str("Dropoff"),
        }
    }
}

impl<'de> Deserialize<'de> for StopKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        match value.as_str() {
            "Pickup" => Ok(StopKind::Pickup),
            "Dropoff" => Ok(StopKind::Dropoff),
            other => Err(serde::de::Error::custom(format!(
                "unknown stop kind '{}'",
                other
            ))),
        }
    }
}

/// One stop on a vehicle's path. Depot stops carry no booking fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathStop {
    pub node_index: usize,
    /// Seconds since midnight
    pub arrival_time: i64,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub stop_type: Option<StopKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
}

/// A served booking with its scheduled pickup and dropoff times
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServedBooking {
    pub booking: Booking,
    /// Seconds since midnight
    pub pickup_time: i64,
    /// Seconds since midnight
    pub dropoff_time: i64,
}

/// One vehicle's itinerary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub vehicle_id: usize,
    pub bookings: Vec<ServedBooking>,
    pub path: Vec<PathStop>,
}

/// The complete optimization result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedRoutes {
    pub clusters: Vec<Cluster>,
    pub dropped_bookings: Vec<Booking>,
}

impl OptimizedRoutes {
    /// Result for a solve with nothing to plan
    pub fn empty() -> Self {
        Self {
            clusters: vec![],
            dropped_bookings: vec![],
        }
    }

    /// Total number of served bookings across clusters
    pub fn served_count(&self) -> usize {
        self.clusters.iter().map(|c| c.bookings.len()).sum()
    }
}

/// Walk every vehicle's schedule and build the output structure.
/// Clusters come out in ascending vehicle id, paths in visit order, dropped
/// bookings in ascending input index; vehicles without bookings are omitted.
pub fn extract(problem: &Problem, assignment: &Assignment) -> OptimizedRoutes {
    let mut clusters = Vec::new();

    for (vehicle_id, schedule) in assignment.schedules.iter().enumerate() {
        let schedule = match schedule {
            Some(schedule) => schedule,
            None => continue,
        };

        let mut path = Vec::with_capacity(schedule.nodes.len() + 2);
        path.push(PathStop {
            node_index: 0,
            arrival_time: schedule.start_time,
            stop_type: None,
            booking_id: None,
        });

        // (booking index, pickup time, dropoff time) in first-visit order
        let mut served: Vec<(usize, Option<i64>, Option<i64>)> = Vec::new();

        for (&node, &arrival) in schedule.nodes.iter().zip(&schedule.arrivals) {
            let mut stop = PathStop {
                node_index: node,
                arrival_time: arrival,
                stop_type: None,
                booking_id: None,
            };

            if let Some((booking_idx, kind)) = problem.booking_of_node(node) {
                stop.stop_type = Some(kind);
                stop.booking_id = Some(problem.bookings[booking_idx].id.clone());

                let pos = match served.iter().position(|(idx, _, _)| *idx == booking_idx) {
                    Some(pos) => pos,
                    None => {
                        served.push((booking_idx, None, None));
                        served.len() - 1
                    }
                };
                match kind {
                    StopKind::Pickup => served[pos].1 = Some(arrival),
                    StopKind::Dropoff => served[pos].2 = Some(arrival),
                }
            }

            path.push(stop);
        }

        path.push(PathStop {
            node_index: 0,
            arrival_time: schedule.end_time,
            stop_type: None,
            booking_id: None,
        });

        let bookings: Vec<ServedBooking> = served
            .into_iter()
            .filter_map(|(idx, pickup_time, dropoff_time)| {
                match (pickup_time, dropoff_time) {
                    (Some(pickup_time), Some(dropoff_time)) => Some(ServedBooking {
                        booking: problem.bookings[idx].clone(),
                        pickup_time,
                        dropoff_time,
                    }),
                    _ => {
                        warn!(
                            booking = %problem.bookings[idx].id,
                            vehicle_id, "booking visited without both stops"
                        );
                        None
                    }
                }
            })
            .collect();

        if !bookings.is_empty() {
            clusters.push(Cluster {
                vehicle_id,
                bookings,
                path,
            });
        }
    }

    let dropped_bookings = assignment
        .dropped
        .iter()
        .map(|&idx| problem.bookings[idx].clone())
        .collect();

    OptimizedRoutes {
        clusters,
        dropped_bookings,
    }
}
