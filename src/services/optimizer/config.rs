//! Optimizer configuration

use crate::defaults;
use crate::types::{Coordinates, VehicleSpec};

/// Model-level knobs: window tolerances, service time, fleet and depot.
#[derive(Debug, Clone)]
pub struct OptimizerSettings {
    /// Depot coordinates; every vehicle starts and ends here
    pub depot: Coordinates,
    /// Vehicle fleet with per-vehicle capacities
    pub fleet: Vec<VehicleSpec>,
    /// Dwell time at every non-depot stop, seconds
    pub service_time_sec: i64,
    /// Pickup window half-width around the requested time, seconds
    pub pickup_tolerance_sec: i64,
    /// Allowed delivery lateness after the requested time, seconds
    pub delivery_late_sec: i64,
    /// Objective penalty per unserved booking
    pub drop_penalty: i64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            depot: defaults::default_depot(),
            fleet: defaults::default_fleet(),
            service_time_sec: defaults::DEFAULT_SERVICE_TIME_SEC,
            pickup_tolerance_sec: defaults::DEFAULT_PICKUP_TOLERANCE_SEC,
            delivery_late_sec: defaults::DEFAULT_DELIVERY_LATE_SEC,
            drop_penalty: defaults::DEFAULT_DROP_PENALTY,
        }
    }
}

/// Search budget and reproducibility knobs.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum solving time in seconds
    pub max_time_seconds: u64,
    /// Maximum improvement iterations
    pub max_iterations: usize,
    /// RNG seed for the improvement phase; identical seed + iteration budget
    /// reproduces the same solution
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_time_seconds: defaults::DEFAULT_SOLVE_TIME_LIMIT_SEC,
            max_iterations: 20_000,
            seed: 1,
        }
    }
}

impl SolverConfig {
    /// Create config with custom time and iteration budget
    pub fn new(max_time_seconds: u64, max_iterations: usize) -> Self {
        Self {
            max_time_seconds,
            max_iterations,
            seed: 1,
        }
    }

    /// Fast configuration for interactive use
    pub fn fast() -> Self {
        Self {
            max_time_seconds: 5,
            max_iterations: 2_000,
            seed: 1,
        }
    }

    /// Quality configuration for background processing
    pub fn quality() -> Self {
        Self {
            max_time_seconds: 60,
            max_iterations: 100_000,
            seed: 1,
        }
    }

    /// Override the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
