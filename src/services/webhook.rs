//! Webhook job completion
//!
//! Long-running solves started on behalf of a remote caller report back by
//! POSTing the result to the caller's webhook URL. Delivery failures are
//! logged, never fatal; the result is still persisted locally.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::services::optimizer::OptimizedRoutes;

/// Payload delivered to the webhook on completion
#[derive(Debug, Serialize)]
pub struct CompletionPayload<'a> {
    pub job_id: Uuid,
    pub status: &'static str,
    pub optimized_routes: &'a OptimizedRoutes,
}

/// Notifier for completed optimization jobs
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// POST the completed result to the webhook URL
    pub async fn notify_completed(
        &self,
        webhook_url: &str,
        job_id: Uuid,
        routes: &OptimizedRoutes,
    ) -> Result<()> {
        let payload = CompletionPayload {
            job_id,
            status: "completed",
            optimized_routes: routes,
        };

        let response = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to reach webhook {}", webhook_url))?;

        if !response.status().is_success() {
            anyhow::bail!("Webhook {} answered {}", webhook_url, response.status());
        }

        info!(%job_id, webhook_url, "webhook delivered");
        Ok(())
    }

    /// Notify and swallow failures; the solve result is already persisted
    pub async fn notify_best_effort(
        &self,
        webhook_url: &str,
        job_id: Uuid,
        routes: &OptimizedRoutes,
    ) {
        if let Err(e) = self.notify_completed(webhook_url, job_id, routes).await {
            error!(%job_id, "webhook delivery failed: {}", e);
        }
    }
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}
