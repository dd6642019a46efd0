//! Route optimizer
//!
//! The full pipeline for one solve: validate bookings, geocode missing
//! coordinates, fetch distance/time matrices, build the routing instance,
//! search for the best assignment, and extract the structured result.
//! Matrices and problem data are read-only once built; nothing survives a
//! solve except the returned value.

pub mod config;
pub mod constraints;
pub mod problem;
pub mod search;
pub mod solution;

pub use config::{OptimizerSettings, SolverConfig};
pub use problem::{Problem, StopKind};
pub use solution::{Cluster, OptimizedRoutes, PathStop, ServedBooking};

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::services::geocoding::Geocoder;
use crate::services::routing::MatrixProvider;
use crate::types::Booking;

/// Everything that can go wrong during a solve
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Booking validation or unresolvable address; never reaches the solver
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No bookings to plan; callers usually map this to an empty result
    #[error("no bookings to optimize")]
    EmptyProblem,

    /// Geocoder or matrix provider failed
    #[error("external provider failure: {0}")]
    ExternalProvider(#[source] anyhow::Error),

    /// Provider returned matrices of the wrong shape
    #[error("matrix shape mismatch: expected {expected}x{expected}, got {rows}x{cols}")]
    MatrixShape {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    /// The search found no feasible assignment at all
    #[error("no feasible assignment found")]
    NoSolution,

    /// A solver invariant was violated
    #[error("internal solver error: {0}")]
    Internal(String),
}

/// The optimizer facade wiring adapters to the solver
pub struct RouteOptimizer {
    geocoder: Box<dyn Geocoder>,
    matrix_provider: Box<dyn MatrixProvider>,
    settings: OptimizerSettings,
    solver: SolverConfig,
}

impl RouteOptimizer {
    pub fn new(
        geocoder: Box<dyn Geocoder>,
        matrix_provider: Box<dyn MatrixProvider>,
        settings: OptimizerSettings,
        solver: SolverConfig,
    ) -> Self {
        Self {
            geocoder,
            matrix_provider,
            settings,
            solver,
        }
    }

    /// Run one full solve. An empty booking list yields the empty result.
    pub async fn optimize(
        &self,
        mut bookings: Vec<Booking>,
    ) -> Result<OptimizedRoutes, OptimizeError> {
        if bookings.is_empty() {
            debug!("no bookings, returning empty result");
            return Ok(OptimizedRoutes::empty());
        }

        for booking in &bookings {
            booking.validate().map_err(OptimizeError::InvalidInput)?;
        }

        self.fill_coordinates(&mut bookings).await?;

        let locations = problem::build_locations(&self.settings.depot, &bookings)?;

        info!(
            bookings = bookings.len(),
            locations = locations.len(),
            provider = self.matrix_provider.name(),
            "fetching distance matrices"
        );
        let matrices = self
            .matrix_provider
            .matrices(&locations)
            .await
            .map_err(OptimizeError::ExternalProvider)?;

        let problem = Problem::build(bookings, &matrices, &self.settings)?;
        let solver_config = self.solver.clone();

        let started = Instant::now();
        let (problem, assignment) = tokio::task::spawn_blocking(move || {
            let assignment = search::solve(&problem, &solver_config);
            (problem, assignment)
        })
        .await
        .map_err(|e| OptimizeError::Internal(format!("solver task failed: {}", e)))?;

        let routes = solution::extract(&problem, &assignment);

        info!(
            served = routes.served_count(),
            dropped = routes.dropped_bookings.len(),
            clusters = routes.clusters.len(),
            solve_time_ms = started.elapsed().as_millis() as u64,
            "solve finished"
        );

        Ok(routes)
    }

    /// Geocode bookings whose pickup or delivery coordinates are missing or
    /// placeholders. Lookups for all bookings run concurrently.
    async fn fill_coordinates(&self, bookings: &mut [Booking]) -> Result<(), OptimizeError> {
        let mut lookups = Vec::new();

        for (idx, booking) in bookings.iter().enumerate() {
            if booking.needs_pickup_geocoding() {
                lookups.push((idx, true, booking.pickup_address.clone()));
            }
            if booking.needs_delivery_geocoding() {
                lookups.push((idx, false, booking.delivery_address.clone()));
            }
        }

        if lookups.is_empty() {
            return Ok(());
        }

        debug!(count = lookups.len(), "geocoding missing coordinates");

        let geocoder = self.geocoder.as_ref();
        let results = futures::future::join_all(lookups.iter().map(|(_, _, address)| async move {
            geocoder.geocode(address).await
        }))
        .await;

        for ((idx, is_pickup, address), result) in lookups.iter().zip(results) {
            let coords = result
                .map_err(OptimizeError::ExternalProvider)?
                .ok_or_else(|| {
                    OptimizeError::InvalidInput(format!("address unresolvable: '{}'", address))
                })?;

            if *is_pickup {
                bookings[*idx].pickup = Some(coords);
            } else {
                bookings[*idx].delivery = Some(coords);
            }
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::booking;
    use super::*;
    use crate::services::geocoding::MockGeocoder;
    use crate::services::routing::MockMatrixProvider;
    use crate::types::Coordinates;

    fn optimizer() -> RouteOptimizer {
        RouteOptimizer::new(
            Box::new(MockGeocoder::new()),
            Box::new(MockMatrixProvider::new()),
            OptimizerSettings::default(),
            test_support::test_solver_config(),
        )
    }

    #[tokio::test]
    async fn test_empty_bookings_give_empty_result() {
        let routes = optimizer().optimize(vec![]).await.unwrap();
        assert!(routes.clusters.is_empty());
        assert!(routes.dropped_bookings.is_empty());
    }

    #[tokio::test]
    async fn test_single_booking_end_to_end() {
        let mut b = booking("a", 1, 0, "09:00", "10:30");
        b.pickup = Some(Coordinates { lat: 51.92, lng: 4.48 });
        b.delivery = Some(Coordinates { lat: 52.07, lng: 4.30 });

        let routes = optimizer().optimize(vec![b]).await.unwrap();

        assert_eq!(routes.clusters.len(), 1);
        assert!(routes.dropped_bookings.is_empty());
        assert_eq!(routes.clusters[0].bookings[0].booking.id, "a");
    }

    #[tokio::test]
    async fn test_geocoding_fills_placeholder_coordinates() {
        let mut b = booking("a", 1, 0, "09:00", "10:30");
        b.pickup = Some(Coordinates::zero());
        b.delivery = None;

        let routes = optimizer().optimize(vec![b]).await.unwrap();

        // The mock geocoder resolves every non-empty address
        assert_eq!(routes.served_count() + routes.dropped_bookings.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_booking_rejected_before_solving() {
        let mut b = booking("a", 0, 0, "09:00", "10:30");
        b.passengers = 0;
        b.wheelchairs = 0;

        let err = optimizer().optimize(vec![b]).await.unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unresolvable_address_is_invalid_input() {
        struct NoneGeocoder;

        #[async_trait::async_trait]
        impl crate::services::geocoding::Geocoder for NoneGeocoder {
            async fn geocode(&self, _address: &str) -> anyhow::Result<Option<Coordinates>> {
                Ok(None)
            }

            fn name(&self) -> &'static str {
                "none"
            }
        }

        let optimizer = RouteOptimizer::new(
            Box::new(NoneGeocoder),
            Box::new(MockMatrixProvider::new()),
            OptimizerSettings::default(),
            test_support::test_solver_config(),
        );

        let mut b = booking("a", 1, 0, "09:00", "10:30");
        b.pickup = None;

        let err = optimizer.optimize(vec![b]).await.unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidInput(_)));
    }

    #[test]
    fn test_error_display() {
        let err = OptimizeError::MatrixShape {
            expected: 5,
            rows: 4,
            cols: 5,
        };
        assert_eq!(
            err.to_string(),
            "matrix shape mismatch: expected 5x5, got 4x5"
        );

        assert_eq!(
            OptimizeError::NoSolution.to_string(),
            "no feasible assignment found"
        );
    }
}
