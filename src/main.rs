//! Paraplan - route optimization backend for paratransit taxi fleets
//!
//! Reads a day of bookings, assigns them to the fleet under time-window,
//! capacity and shared-space constraints, and emits per-vehicle itineraries
//! plus the bookings that could not be served.

mod cli;
mod config;
mod defaults;
mod services;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use services::geocoding::create_geocoder;
use services::ingest::read_bookings_csv;
use services::optimizer::{OptimizeError, RouteOptimizer, SolverConfig};
use services::results_store::ResultsStore;
use services::routing::create_matrix_provider;
use services::webhook::WebhookNotifier;
use types::Booking;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    dotenvy::dotenv().ok();
    let _guard = init_tracing();

    let config = config::Config::from_env()?;

    match cli.command {
        cli::Command::Solve {
            input,
            format,
            output,
            webhook_url,
            time_limit,
        } => {
            let format = format.unwrap_or_else(|| cli::InputFormat::infer(&input));
            let content = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let bookings: Vec<Booking> = match format {
                cli::InputFormat::Json => serde_json::from_slice(&content)
                    .context("Input is not a valid bookings JSON array")?,
                cli::InputFormat::Csv => read_bookings_csv(&content)?,
            };

            info!(count = bookings.len(), input = %input.display(), "bookings loaded");

            let mut solver_config = config.solver_config();
            if let Some(limit) = time_limit {
                solver_config = SolverConfig {
                    max_time_seconds: limit,
                    ..solver_config
                };
            }

            let optimizer = RouteOptimizer::new(
                create_geocoder(config.google_api_key.as_deref()),
                create_matrix_provider(config.google_api_key.as_deref()),
                config.optimizer_settings(),
                solver_config,
            );

            let routes = match optimizer.optimize(bookings).await {
                Ok(routes) => routes,
                Err(OptimizeError::EmptyProblem) => {
                    services::optimizer::OptimizedRoutes::empty()
                }
                Err(e) => return Err(e.into()),
            };

            let store = ResultsStore::open(&config.last_result_path);
            store.store(&routes)?;

            if let Some(url) = webhook_url {
                let job_id = Uuid::new_v4();
                WebhookNotifier::new()
                    .notify_best_effort(&url, job_id, &routes)
                    .await;
            }

            let json = serde_json::to_string_pretty(&routes)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(output = %path.display(), "result written");
                }
                None => println!("{}", json),
            }

            Ok(())
        }
        cli::Command::LastResult => {
            let store = ResultsStore::open(&config.last_result_path);
            match store.last() {
                Some(routes) => {
                    println!("{}", serde_json::to_string_pretty(&routes)?);
                    Ok(())
                }
                None => {
                    anyhow::bail!("No persisted result at {}", config.last_result_path)
                }
            }
        }
    }
}

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "paraplan.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,paraplan=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    guard
}
