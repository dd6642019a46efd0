//! Distance/time matrix providers
//!
//! The optimizer consumes two square integer matrices over the ordered
//! location list (depot first). Production uses the Google Distance Matrix
//! API; tests and offline runs use a haversine-based estimate.

mod google;

pub use google::{GoogleMatrixConfig, GoogleMatrixProvider};

use anyhow::Result;
use async_trait::async_trait;

use crate::services::geo;
use crate::types::Coordinates;

/// Distance and time matrices between locations
#[derive(Debug, Clone)]
pub struct DistanceTimeMatrices {
    /// Distance in meters [i][j] from location i to location j
    pub distances: Vec<Vec<i64>>,
    /// Duration in seconds [i][j] from location i to location j
    pub durations: Vec<Vec<i64>>,
    /// Number of locations
    pub size: usize,
}

impl DistanceTimeMatrices {
    /// Create empty matrices
    pub fn empty() -> Self {
        Self {
            distances: vec![],
            durations: vec![],
            size: 0,
        }
    }

    /// Zero-filled square matrices for n locations
    pub fn zeroed(n: usize) -> Self {
        Self {
            distances: vec![vec![0; n]; n],
            durations: vec![vec![0; n]; n],
            size: n,
        }
    }

    /// Get distance from location i to location j in meters
    pub fn distance(&self, from: usize, to: usize) -> i64 {
        self.distances[from][to]
    }

    /// Get duration from location i to location j in seconds
    pub fn duration(&self, from: usize, to: usize) -> i64 {
        self.durations[from][to]
    }

    /// Both matrices are n×n for the requested n
    pub fn is_square(&self, n: usize) -> bool {
        self.size == n
            && self.distances.len() == n
            && self.durations.len() == n
            && self.distances.iter().all(|row| row.len() == n)
            && self.durations.iter().all(|row| row.len() == n)
    }
}

/// Matrix provider trait. The first location is always the depot.
///
/// Implementations report unreachable pairs with the large penalty value,
/// never as an error.
#[async_trait]
pub trait MatrixProvider: Send + Sync {
    /// Get distance and time matrices for a list of locations
    async fn matrices(&self, locations: &[Coordinates]) -> Result<DistanceTimeMatrices>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Mock matrix provider for tests and offline use.
/// Uses haversine distance × road coefficient for estimation.
pub struct MockMatrixProvider;

impl MockMatrixProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockMatrixProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MatrixProvider for MockMatrixProvider {
    async fn matrices(&self, locations: &[Coordinates]) -> Result<DistanceTimeMatrices> {
        let n = locations.len();
        if n == 0 {
            return Ok(DistanceTimeMatrices::empty());
        }

        let mut matrices = DistanceTimeMatrices::zeroed(n);
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    matrices.distances[i][j] =
                        geo::road_distance_meters(&locations[i], &locations[j]);
                    matrices.durations[i][j] =
                        geo::travel_time_seconds(&locations[i], &locations[j]);
                }
            }
        }

        Ok(matrices)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Create a matrix provider based on the MATRIX_BACKEND environment variable
/// ("google" requires GOOGLE_API_KEY; anything else falls back to mock).
pub fn create_matrix_provider(api_key: Option<&str>) -> Box<dyn MatrixProvider> {
    let backend = std::env::var("MATRIX_BACKEND").unwrap_or_else(|_| "mock".to_string());

    match (backend.as_str(), api_key) {
        ("google", Some(key)) => {
            tracing::info!("Using Google Distance Matrix provider");
            Box::new(GoogleMatrixProvider::new(GoogleMatrixConfig::new(key)))
        }
        ("google", None) => {
            tracing::warn!("MATRIX_BACKEND=google but GOOGLE_API_KEY is not set, using mock");
            Box::new(MockMatrixProvider::new())
        }
        _ => {
            tracing::info!("Using mock matrix provider");
            Box::new(MockMatrixProvider::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotterdam() -> Coordinates {
        Coordinates { lat: 51.9225, lng: 4.47917 }
    }

    fn den_haag() -> Coordinates {
        Coordinates { lat: 52.0705, lng: 4.3007 }
    }

    fn delft() -> Coordinates {
        Coordinates { lat: 52.0116, lng: 4.3571 }
    }

    #[tokio::test]
    async fn test_mock_provider_empty_locations() {
        let provider = MockMatrixProvider::new();
        let matrices = provider.matrices(&[]).await.unwrap();

        assert_eq!(matrices.size, 0);
        assert!(matrices.distances.is_empty());
    }

    #[tokio::test]
    async fn test_mock_provider_diagonal_is_zero() {
        let provider = MockMatrixProvider::new();
        let locations = vec![rotterdam(), den_haag(), delft()];
        let matrices = provider.matrices(&locations).await.unwrap();

        assert_eq!(matrices.size, 3);
        for i in 0..3 {
            assert_eq!(matrices.distance(i, i), 0);
            assert_eq!(matrices.duration(i, i), 0);
        }
    }

    #[tokio::test]
    async fn test_mock_provider_symmetric_positive() {
        let provider = MockMatrixProvider::new();
        let matrices = provider
            .matrices(&[rotterdam(), den_haag()])
            .await
            .unwrap();

        assert!(matrices.distance(0, 1) > 0);
        assert_eq!(matrices.distance(0, 1), matrices.distance(1, 0));
        assert_eq!(matrices.duration(0, 1), matrices.duration(1, 0));
    }

    #[test]
    fn test_is_square() {
        let mut matrices = DistanceTimeMatrices::zeroed(3);
        assert!(matrices.is_square(3));
        assert!(!matrices.is_square(2));

        matrices.distances[1].pop();
        assert!(!matrices.is_square(3));
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(MockMatrixProvider::new().name(), "mock");
    }
}
