//! Configuration management

use anyhow::{Context, Result};

use crate::defaults;
use crate::services::optimizer::{OptimizerSettings, SolverConfig};
use crate::services::results_store::DEFAULT_RESULT_PATH;
use crate::types::{parse_fleet, Coordinates, VehicleSpec};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Google Maps API key (matrix + geocoding); mock backends need none
    pub google_api_key: Option<String>,

    /// Depot coordinates; every vehicle starts and ends here
    pub depot: Coordinates,

    /// Vehicle fleet with per-vehicle capacities
    pub fleet: Vec<VehicleSpec>,

    /// Wall-clock budget for one solve, seconds
    pub solve_time_limit_sec: u64,

    /// Dwell time at every non-depot stop, seconds
    pub service_time_sec: i64,

    /// Pickup window half-width, seconds
    pub pickup_window_tolerance_sec: i64,

    /// Allowed delivery lateness, seconds
    pub delivery_window_late_sec: i64,

    /// Objective penalty per unserved booking
    pub drop_penalty: i64,

    /// Where the last successful result is persisted
    pub last_result_path: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let google_api_key = std::env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty());

        let depot = match std::env::var("DEPOT_COORD") {
            Ok(raw) => parse_depot(&raw).context("DEPOT_COORD is invalid")?,
            Err(_) => defaults::default_depot(),
        };

        let fleet = match std::env::var("FLEET") {
            Ok(raw) => parse_fleet(&raw).map_err(|e| anyhow::anyhow!("FLEET is invalid: {}", e))?,
            Err(_) => defaults::default_fleet(),
        };

        Ok(Self {
            google_api_key,
            depot,
            fleet,
            solve_time_limit_sec: env_number(
                "SOLVE_TIME_LIMIT_SEC",
                defaults::DEFAULT_SOLVE_TIME_LIMIT_SEC,
            )?,
            service_time_sec: env_number("SERVICE_TIME_SEC", defaults::DEFAULT_SERVICE_TIME_SEC)?,
            pickup_window_tolerance_sec: env_number(
                "PICKUP_WINDOW_TOLERANCE_SEC",
                defaults::DEFAULT_PICKUP_TOLERANCE_SEC,
            )?,
            delivery_window_late_sec: env_number(
                "DELIVERY_WINDOW_LATE_SEC",
                defaults::DEFAULT_DELIVERY_LATE_SEC,
            )?,
            drop_penalty: env_number("DROP_PENALTY", defaults::DEFAULT_DROP_PENALTY)?,
            last_result_path: std::env::var("LAST_RESULT_PATH")
                .unwrap_or_else(|_| DEFAULT_RESULT_PATH.to_string()),
        })
    }

    /// Model-level settings for the optimizer
    pub fn optimizer_settings(&self) -> OptimizerSettings {
        OptimizerSettings {
            depot: self.depot,
            fleet: self.fleet.clone(),
            service_time_sec: self.service_time_sec,
            pickup_tolerance_sec: self.pickup_window_tolerance_sec,
            delivery_late_sec: self.delivery_window_late_sec,
            drop_penalty: self.drop_penalty,
        }
    }

    /// Search budget for the optimizer
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            max_time_seconds: self.solve_time_limit_sec,
            ..SolverConfig::default()
        }
    }
}

/// Parse "lat,lng" into coordinates
pub fn parse_depot(raw: &str) -> Result<Coordinates> {
    let (lat, lng) = raw
        .split_once(',')
        .with_context(|| format!("expected 'lat,lng', got '{}'", raw))?;
    let lat: f64 = lat.trim().parse().context("latitude is not a number")?;
    let lng: f64 = lng.trim().parse().context("longitude is not a number")?;
    Ok(Coordinates { lat, lng })
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} is not a valid number: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}
