// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use powercurve_tracker::config::Config;
use powercurve_tracker::db::{FirestoreDb, MemoryDb};
use powercurve_tracker::error::AppError;
use powercurve_tracker::middleware::auth::create_jwt;
use powercurve_tracker::models::User;
use powercurve_tracker::routes::create_router;
use powercurve_tracker::services::strava::StravaAthlete;
use powercurve_tracker::services::{ActivityCandidate, ActivitySource, StravaClient};
use powercurve_tracker::AppState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Strava base URL nothing listens on.
#[allow(dead_code)]
pub const UNREACHABLE_STRAVA: &str = "http://127.0.0.1:9";

/// Create a test app backed by an in-memory store.
/// Returns the router, the shared state and a handle on the store.
#[allow(dead_code)]
pub fn create_test_app(strava_api_base: &str) -> (axum::Router, Arc<AppState>, MemoryDb) {
    let mut config = Config::test_default();
    config.strava_api_base = strava_api_base.to_string();
    let db = MemoryDb::new();

    let state = Arc::new(AppState {
        strava: StravaClient::new(config.strava_api_base.clone()),
        config,
        store: Arc::new(db.clone()),
    });

    (create_router(state.clone()), state, db)
}

/// Session JWT signed with the test key.
#[allow(dead_code)]
pub fn test_jwt(athlete_id: u64) -> String {
    create_jwt(athlete_id, &Config::test_default().jwt_signing_key).unwrap()
}

/// Helper to create a basic test user
#[allow(dead_code)]
pub fn test_user(athlete_id: u64, firstname: &str, lastname: &str) -> User {
    let now = chrono::Utc::now().to_rfc3339();
    User {
        strava_athlete_id: athlete_id,
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        created_at: now.clone(),
        last_active: now,
    }
}

/// Strava profile as returned for a session token.
#[allow(dead_code)]
pub fn strava_athlete(athlete_id: u64) -> StravaAthlete {
    StravaAthlete {
        id: athlete_id,
        firstname: "Test".to_string(),
        lastname: "Rider".to_string(),
    }
}

/// What a fake candidate yields when its stream is fetched.
#[derive(Clone)]
#[allow(dead_code)]
pub enum FakeStream {
    Watts(Vec<f64>),
    NoPower,
    Malformed,
    Unavailable,
    TokenRejected,
    Hang,
}

/// Scripted activity provider recording which streams were fetched.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeSource {
    candidates: Vec<ActivityCandidate>,
    streams: HashMap<u64, FakeStream>,
    fail_listing: bool,
    fetched: Mutex<Vec<u64>>,
}

#[allow(dead_code)]
impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose activity listing fails outright.
    pub fn unreachable() -> Self {
        Self {
            fail_listing: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, id: u64, activity_type: &str, stream: FakeStream) -> Self {
        self.candidates.push(ActivityCandidate {
            id,
            activity_type: activity_type.to_string(),
            name: format!("Activity {}", id),
            distance_meters: 20_000.0,
        });
        self.streams.insert(id, stream);
        self
    }

    pub fn ride(self, id: u64, watts: Vec<f64>) -> Self {
        self.with(id, "Ride", FakeStream::Watts(watts))
    }

    /// Activity IDs whose stream was requested, in request order.
    pub fn fetched(&self) -> Vec<u64> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivitySource for FakeSource {
    async fn list_candidates(&self, limit: u32) -> Result<Vec<ActivityCandidate>, AppError> {
        if self.fail_listing {
            return Err(AppError::UpstreamUnavailable("connection refused".to_string()));
        }
        Ok(self
            .candidates
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn fetch_power_stream(&self, activity_id: u64) -> Result<Option<Vec<f64>>, AppError> {
        self.fetched.lock().unwrap().push(activity_id);
        match self.streams.get(&activity_id) {
            Some(FakeStream::Watts(watts)) => Ok(Some(watts.clone())),
            Some(FakeStream::NoPower) | None => Ok(None),
            Some(FakeStream::Malformed) => Err(AppError::MalformedStream(
                "watts data contains null".to_string(),
            )),
            Some(FakeStream::Unavailable) => {
                Err(AppError::UpstreamUnavailable("HTTP 500".to_string()))
            }
            Some(FakeStream::TokenRejected) => Err(AppError::UpstreamUnavailable(
                AppError::STRAVA_TOKEN_ERROR.to_string(),
            )),
            Some(FakeStream::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            }
        }
    }
}
