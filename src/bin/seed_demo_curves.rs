// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Populate the curve store with demo athletes and curves.
//!
//! Uses `STORE_BACKEND` and `GCP_PROJECT_ID` like the server. With the
//! memory backend this is a dry run.

use powercurve_tracker::config::StoreBackend;
use powercurve_tracker::db::seed::seed_demo_data;
use powercurve_tracker::db::{CurveStore, FirestoreDb, MemoryDb};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let backend: StoreBackend = env::var("STORE_BACKEND")
        .unwrap_or_else(|_| "firestore".to_string())
        .parse()?;

    let store: Arc<dyn CurveStore> = match backend {
        StoreBackend::Firestore => {
            let project_id = env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string());
            Arc::new(FirestoreDb::new(&project_id).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Memory backend selected; seeded data is discarded on exit");
            Arc::new(MemoryDb::new())
        }
    };

    let seeded = seed_demo_data(store.as_ref(), chrono::Utc::now()).await?;
    for user in &seeded {
        println!("Seeded {} ({})", user.display_name, user.athlete_id);
    }

    Ok(())
}
