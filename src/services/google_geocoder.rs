//! Google Geocoding API client

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::Coordinates;

/// Google Geocoding API response
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

/// Google Geocoding client
pub struct GoogleGeocodeClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GoogleGeocodeClient {
    /// Create a new client
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, "https://maps.googleapis.com/maps/api/geocode")
    }

    /// Create a client against a custom endpoint (tests)
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            client,
        }
    }

    /// Geocode an address to coordinates.
    /// Returns None when the address yields no results.
    pub async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        let url = format!(
            "{}/json?address={}&key={}",
            self.base_url,
            urlencoding::encode(address),
            self.api_key,
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send geocoding request")?;

        if !response.status().is_success() {
            anyhow::bail!("Geocoding API returned status {}", response.status());
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        match body.status.as_str() {
            "OK" => Ok(body.results.first().map(|r| Coordinates {
                lat: r.geometry.location.lat,
                lng: r.geometry.location.lng,
            })),
            "ZERO_RESULTS" => Ok(None),
            other => anyhow::bail!("Geocoding API rejected request: {}", other),
        }
    }
}
