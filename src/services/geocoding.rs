//! Geocoding abstraction layer
//!
//! This module provides geocoding implementations:
//! - MockGeocoder for tests (deterministic, no network)
//! - GoogleGeocoder for production (Geocoding API with failure backoff)
//!
//! Configuration via GEOCODER_BACKEND env variable:
//! - "mock" → MockGeocoder (tests, development)
//! - "google" → GoogleGeocoder (requires GOOGLE_API_KEY)

use anyhow::Result;
use async_trait::async_trait;

use crate::types::Coordinates;

/// Geocoder trait - abstraction for all geocoding implementations
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocode a full address string to coordinates.
    /// Returns None if the address cannot be resolved.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>>;

    /// Get the name of this geocoder implementation
    fn name(&self) -> &'static str;
}

// ==========================================================================
// MockGeocoder
// ==========================================================================

/// Mock geocoder for testing - returns deterministic fake coordinates
pub struct MockGeocoder;

impl MockGeocoder {
    pub fn new() -> Self {
        Self
    }

    /// Generate deterministic coordinates from the address hash.
    /// Coordinates land inside the Netherlands, away from the coastline.
    fn hash_to_coordinates(address: &str) -> Coordinates {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        address.hash(&mut hasher);
        let hash = hasher.finish();

        const LAT_MIN: f64 = 51.4;
        const LAT_MAX: f64 = 52.4;
        const LNG_MIN: f64 = 4.3;
        const LNG_MAX: f64 = 5.9;

        let lat_normalized = ((hash >> 32) as f64) / (u32::MAX as f64);
        let lng_normalized = ((hash & 0xFFFFFFFF) as f64) / (u32::MAX as f64);

        Coordinates {
            lat: LAT_MIN + lat_normalized * (LAT_MAX - LAT_MIN),
            lng: LNG_MIN + lng_normalized * (LNG_MAX - LNG_MIN),
        }
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        if address.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::hash_to_coordinates(address)))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ==========================================================================
// GoogleGeocoder
// ==========================================================================

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::services::google_geocoder::GoogleGeocodeClient;

/// Consecutive failures before the geocoder stops calling out.
/// A whole day of bookings geocodes in one burst, so a handful of failures
/// in a row means the key or the API is broken, not a single flaky lookup.
const GEOCODE_FAILURE_THRESHOLD: u32 = 5;

/// How long to fail fast once suspended. Transient Geocoding API errors
/// (quota spikes, 5xx) typically clear within a couple of minutes.
const GEOCODE_SUSPEND_SECS: u64 = 120;

/// Suspension tracking for the Geocoding API.
///
/// Counts consecutive failures; once the threshold is crossed, requests are
/// rejected without touching the network until a cooldown deadline passes.
/// The first attempt after the deadline probes the API again, and a success
/// lifts the suspension. State transitions are traced so a broken key shows
/// up in the logs once, not once per booking.
struct FailureBackoff {
    consecutive_failures: AtomicU32,
    suspended_until: Mutex<Option<Instant>>,
    threshold: u32,
    cooldown: Duration,
}

impl FailureBackoff {
    fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            consecutive_failures: AtomicU32::new(0),
            suspended_until: Mutex::new(None),
            threshold,
            cooldown,
        }
    }

    /// True when a request may go out. A suspension whose deadline has
    /// passed lets one probe through instead of clearing eagerly.
    fn allows_request(&self) -> bool {
        match *self.suspended_until.lock() {
            Some(deadline) => Instant::now() >= deadline,
            None => true,
        }
    }

    fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.threshold {
            let deadline = Instant::now() + self.cooldown;
            *self.suspended_until.lock() = Some(deadline);
            tracing::warn!(
                failures,
                cooldown_secs = self.cooldown.as_secs(),
                "geocoding suspended after repeated failures"
            );
        }
    }

    fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        if self.suspended_until.lock().take().is_some() {
            tracing::info!("geocoding suspension lifted");
        }
    }
}

/// Google geocoder that suspends itself after repeated failures
pub struct GoogleGeocoder {
    client: GoogleGeocodeClient,
    backoff: FailureBackoff,
}

impl GoogleGeocoder {
    /// Create a new Google geocoder with default backoff tuning
    pub fn new(api_key: &str) -> Self {
        Self::with_backoff(
            api_key,
            GEOCODE_FAILURE_THRESHOLD,
            Duration::from_secs(GEOCODE_SUSPEND_SECS),
        )
    }

    /// Create with custom failure threshold and cooldown
    pub fn with_backoff(api_key: &str, threshold: u32, cooldown: Duration) -> Self {
        Self {
            client: GoogleGeocodeClient::new(api_key),
            backoff: FailureBackoff::new(threshold, cooldown),
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        if !self.backoff.allows_request() {
            return Err(anyhow::anyhow!(
                "geocoding suspended after repeated failures, retrying later"
            ));
        }

        match self.client.geocode(address).await {
            Ok(result) => {
                // No result found is not a failure
                self.backoff.record_success();
                Ok(result)
            }
            Err(e) => {
                self.backoff.record_failure();
                tracing::error!("Geocoding failed for '{}': {}", address, e);
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

// ==========================================================================
// Factory function
// ==========================================================================

/// Create geocoder based on GEOCODER_BACKEND environment variable
///
/// # Environment Variables
///
/// - `GEOCODER_BACKEND`: "mock" or "google" (default: "mock")
/// - `GOOGLE_API_KEY`: API key, required for the google backend
pub fn create_geocoder(api_key: Option<&str>) -> Box<dyn Geocoder> {
    let backend = std::env::var("GEOCODER_BACKEND").unwrap_or_else(|_| "mock".to_string());

    match (backend.as_str(), api_key) {
        ("google", Some(key)) => {
            tracing::info!("Using GoogleGeocoder");
            Box::new(GoogleGeocoder::new(key))
        }
        ("google", None) => {
            tracing::warn!("GEOCODER_BACKEND=google but GOOGLE_API_KEY is not set, using mock");
            Box::new(MockGeocoder::new())
        }
        ("mock", _) => {
            tracing::info!("Using MockGeocoder");
            Box::new(MockGeocoder::new())
        }
        (other, _) => {
            tracing::warn!("Unknown GEOCODER_BACKEND '{}', using mock", other);
            Box::new(MockGeocoder::new())
        }
    }
}
