//! Last-result persistence
//!
//! The most recent successful optimization is kept in memory and mirrored to
//! a single JSON file so it survives restarts. Single writer,
//! last-writer-wins; readers get whatever was stored most recently.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::services::optimizer::OptimizedRoutes;

/// Default location of the persisted result
pub const DEFAULT_RESULT_PATH: &str = "optimized-routes.json";

/// File-backed store for the last optimization result
pub struct ResultsStore {
    path: PathBuf,
    current: RwLock<Option<OptimizedRoutes>>,
}

impl ResultsStore {
    /// Open a store at the given path, loading any persisted result
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match Self::load_from_disk(&path) {
            Some(routes) => {
                info!(
                    path = %path.display(),
                    clusters = routes.clusters.len(),
                    "loaded persisted optimization result"
                );
                Some(routes)
            }
            None => None,
        };

        Self {
            path,
            current: RwLock::new(current),
        }
    }

    /// Store a new result, replacing the previous one on disk and in memory
    pub fn store(&self, routes: &OptimizedRoutes) -> Result<()> {
        let json = serde_json::to_string_pretty(routes)
            .context("Failed to serialize optimization result")?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        *self.current.write() = Some(routes.clone());
        Ok(())
    }

    /// The most recently stored result, if any
    pub fn last(&self) -> Option<OptimizedRoutes> {
        self.current.read().clone()
    }

    fn load_from_disk(path: &Path) -> Option<OptimizedRoutes> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(routes) => Some(routes),
            Err(e) => {
                warn!(path = %path.display(), "ignoring unreadable result file: {}", e);
                None
            }
        }
    }
}
