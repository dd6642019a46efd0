//! Google Distance Matrix API client
//!
//! API documentation:
//! https://developers.google.com/maps/documentation/distance-matrix
//!
//! The API caps each request at 25 origins, 25 destinations and 100 elements,
//! so the full N×N matrix is fetched as tiles and stitched together.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{DistanceTimeMatrices, MatrixProvider};
use crate::defaults::UNREACHABLE_PENALTY;
use crate::types::Coordinates;

/// Request tiling limits imposed by the Distance Matrix API
const MAX_ELEMENTS_PER_REQUEST: usize = 100;
const MAX_ORIGINS_PER_REQUEST: usize = 25;
const MAX_DESTINATIONS_PER_REQUEST: usize = 25;

/// Google Distance Matrix client configuration
#[derive(Debug, Clone)]
pub struct GoogleMatrixConfig {
    /// API key for the Distance Matrix endpoint
    pub api_key: String,
    /// Base URL, overridable for tests
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl GoogleMatrixConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://maps.googleapis.com/maps/api/distancematrix".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Google Distance Matrix provider
pub struct GoogleMatrixProvider {
    client: Client,
    config: GoogleMatrixConfig,
}

impl GoogleMatrixProvider {
    pub fn new(config: GoogleMatrixConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Tile row/column block sizes honoring all three API limits
    fn tile_shape() -> (usize, usize) {
        let rows = (MAX_ELEMENTS_PER_REQUEST / MAX_DESTINATIONS_PER_REQUEST)
            .min(MAX_ORIGINS_PER_REQUEST);
        let cols = (MAX_ELEMENTS_PER_REQUEST / rows).min(MAX_DESTINATIONS_PER_REQUEST);
        (rows, cols)
    }

    fn build_url(&self, origins: &[Coordinates], destinations: &[Coordinates]) -> String {
        format!(
            "{}/json?origins={}&destinations={}&mode=driving&key={}",
            self.config.base_url,
            urlencoding::encode(&join_coordinates(origins)),
            urlencoding::encode(&join_coordinates(destinations)),
            self.config.api_key,
        )
    }

    async fn fetch_tile(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
    ) -> Result<MatrixResponse> {
        let url = self.build_url(origins, destinations);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request to Google Distance Matrix")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Distance Matrix returned error {}: {}", status, body);
        }

        let matrix_response: MatrixResponse = response
            .json()
            .await
            .context("Failed to parse Distance Matrix response")?;

        if matrix_response.status != "OK" {
            anyhow::bail!(
                "Distance Matrix request rejected: {}",
                matrix_response.status
            );
        }

        Ok(matrix_response)
    }
}

#[async_trait]
impl MatrixProvider for GoogleMatrixProvider {
    async fn matrices(&self, locations: &[Coordinates]) -> Result<DistanceTimeMatrices> {
        let n = locations.len();
        if n == 0 {
            return Ok(DistanceTimeMatrices::empty());
        }

        let mut matrices = DistanceTimeMatrices::zeroed(n);
        let (tile_rows, tile_cols) = Self::tile_shape();

        debug!(
            "Fetching {}x{} distance matrix in {}x{} tiles",
            n, n, tile_rows, tile_cols
        );

        for row_start in (0..n).step_by(tile_rows) {
            let origins = &locations[row_start..(row_start + tile_rows).min(n)];

            for col_start in (0..n).step_by(tile_cols) {
                let destinations = &locations[col_start..(col_start + tile_cols).min(n)];

                let response = self.fetch_tile(origins, destinations).await?;
                stitch_tile(&mut matrices, &response, row_start, col_start);
            }
        }

        debug!("Distance matrix complete: {}x{}", n, n);
        Ok(matrices)
    }

    fn name(&self) -> &str {
        "google"
    }
}

/// Copy one response tile into the global matrices at the given offset.
/// Elements without a route get the unreachable penalty so the solver
/// avoids them without failing the whole fetch.
fn stitch_tile(
    matrices: &mut DistanceTimeMatrices,
    response: &MatrixResponse,
    row_start: usize,
    col_start: usize,
) {
    for (oi, row) in response.rows.iter().enumerate() {
        for (dj, element) in row.elements.iter().enumerate() {
            let (distance, duration) = match (&element.distance, &element.duration) {
                (Some(d), Some(t)) if element.status == "OK" => (d.value, t.value),
                _ => {
                    warn!(
                        "No route for element ({}, {}): status={}",
                        row_start + oi,
                        col_start + dj,
                        element.status
                    );
                    (UNREACHABLE_PENALTY, UNREACHABLE_PENALTY)
                }
            };
            matrices.distances[row_start + oi][col_start + dj] = distance;
            matrices.durations[row_start + oi][col_start + dj] = duration;
        }
    }
}

fn join_coordinates(coords: &[Coordinates]) -> String {
    coords
        .iter()
        .map(|c| format!("{},{}", c.lat, c.lng))
        .collect::<Vec<_>>()
        .join("|")
}

// Distance Matrix API types

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<ValueField>,
    duration: Option<ValueField>,
}

#[derive(Debug, Deserialize)]
struct ValueField {
    value: i64,
}
