// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Power Curve Tracker API Server
//!
//! Builds per-athlete power curves from recent Strava rides and serves
//! side-by-side comparisons.

use powercurve_tracker::{
    config::{Config, StoreBackend},
    db::{CurveStore, FirestoreDb, MemoryDb},
    services::StravaClient,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "powercurve_tracker=debug,info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.store_backend,
        activity_types = ?config.curve.power_activity_types,
        "Starting Power Curve Tracker API"
    );

    let store: Arc<dyn CurveStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; curves are lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    let strava = StravaClient::new(config.strava_api_base.clone());

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        strava,
    });

    let app = powercurve_tracker::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
