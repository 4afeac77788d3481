// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{PowerCurve, UserSummary};
use crate::services::compare::{compare_curves, curve_points, CurveComparison, CurvePoint};
use crate::services::curve::{ActivitySource, SkipReason};
use crate::services::{CurveService, StravaActivitySource};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Activities scanned for the recent rides list.
const RIDES_SCAN_LIMIT: u32 = 10;
/// Rides shown in the recent rides list.
const RIDES_SHOWN: usize = 5;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rides", get(get_rides))
        .route("/api/powercurve", get(get_curve).post(generate_curve))
        .route("/api/compare", get(compare))
}

// ─── Recent Rides ────────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RideSummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    pub distance_km: f64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RidesResponse {
    pub rides: Vec<RideSummary>,
}

fn meters_to_km(meters: f64) -> f64 {
    (meters / 10.0).round() / 100.0
}

/// Most recent qualifying rides, for the landing page.
async fn get_rides(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
) -> Result<Json<RidesResponse>> {
    let session = user.strava_session(&headers)?;
    let source = StravaActivitySource::new(&state.strava, &session);

    let candidates = source
        .list_candidates(RIDES_SCAN_LIMIT)
        .await
        .map_err(token_rejected_as_unauthorized)?;

    let rides: Vec<RideSummary> = candidates
        .into_iter()
        .filter(|c| state.config.curve.qualifies(&c.activity_type))
        .take(RIDES_SHOWN)
        .map(|c| RideSummary {
            id: c.id,
            name: c.name,
            distance_km: meters_to_km(c.distance_meters),
        })
        .collect();

    tracing::debug!(athlete_id = user.athlete_id, rides = rides.len(), "Listed recent rides");

    Ok(Json(RidesResponse { rides }))
}

// ─── Power Curve ─────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CurveResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub athlete_id: u64,
    /// Reference activity (first merged)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub activity_id: u64,
    pub created_at: String,
    pub points: Vec<CurvePoint>,
}

impl From<&PowerCurve> for CurveResponse {
    fn from(curve: &PowerCurve) -> Self {
        Self {
            athlete_id: curve.athlete_id,
            activity_id: curve.activity_id,
            created_at: format_utc_rfc3339(curve.created_at),
            points: curve_points(curve),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SkippedSummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub activity_id: u64,
    pub reason: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GenerateResponse {
    pub curve: CurveResponse,
    /// Activities merged into the curve, in provider order
    #[cfg_attr(feature = "binding-generation", ts(type = "number[]"))]
    pub activities_used: Vec<u64>,
    pub skipped: Vec<SkippedSummary>,
}

fn describe_skip(reason: &SkipReason) -> String {
    match reason {
        SkipReason::ActivityType(t) => format!("activity type {}", t),
        SkipReason::NoPowerData => "no power data".to_string(),
        SkipReason::Malformed(msg) => format!("malformed stream: {}", msg),
        SkipReason::Unavailable(msg) => format!("stream unavailable: {}", msg),
        SkipReason::TimedOut => "stream fetch timed out".to_string(),
    }
}

/// Generate the caller's curve from their recent rides and store it.
async fn generate_curve(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
) -> Result<Json<GenerateResponse>> {
    let session = user.strava_session(&headers)?;
    let service = CurveService::new(state.store.as_ref(), &state.config.curve);

    let athlete = service
        .resolve_strava_athlete(&state.strava, &session)
        .await?;

    let source = StravaActivitySource::new(&state.strava, &session);
    let run = service
        .generate(&athlete, &source)
        .await
        .map_err(token_rejected_as_unauthorized)?;

    Ok(Json(GenerateResponse {
        curve: CurveResponse::from(&run.curve),
        activities_used: run.accepted,
        skipped: run
            .skipped
            .iter()
            .map(|s| SkippedSummary {
                activity_id: s.activity_id,
                reason: describe_skip(&s.reason),
            })
            .collect(),
    }))
}

/// The caller's stored curve.
async fn get_curve(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CurveResponse>> {
    let curve = state
        .store
        .latest_curve(user.athlete_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No power curve yet".to_string()))?;

    Ok(Json(CurveResponse::from(&curve)))
}

// ─── Comparison ──────────────────────────────────────────────

#[derive(Deserialize)]
struct CompareQuery {
    /// Athlete to compare against
    with: Option<u64>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompareResponse {
    /// Other athletes with a stored curve
    pub users: Vec<UserSummary>,
    pub comparison: CurveComparison,
}

/// The caller's curve next to another athlete's.
///
/// An unknown `with` athlete, or one without a curve, yields an empty
/// second sequence rather than an error.
async fn compare(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<CompareQuery>,
) -> Result<Json<CompareResponse>> {
    let mine = state
        .store
        .latest_curve(user.athlete_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No power curve yet".to_string()))?;

    let users = state.store.list_users_with_curve(user.athlete_id).await?;

    let other = match params.with {
        Some(id) => state.store.latest_curve(id).await?,
        None => None,
    };

    Ok(Json(CompareResponse {
        users,
        comparison: compare_curves(&mine, other.as_ref()),
    }))
}

/// A rejected Strava token is the caller's problem, not an upstream outage.
fn token_rejected_as_unauthorized(e: AppError) -> AppError {
    if e.is_strava_token_error() {
        AppError::Unauthorized
    } else {
        e
    }
}
