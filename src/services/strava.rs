// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for activity listings and power streams.
//!
//! Handles:
//! - Athlete profile lookup (identity check before a curve is written)
//! - Recent activity listing
//! - Watts stream fetching and validation
//! - Rate limit / bad token detection
//!
//! The caller supplies the access token on every call; token exchange and
//! refresh live outside this crate.

use crate::error::AppError;
use crate::services::curve::{ActivityCandidate, ActivitySource};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
}

impl StravaClient {
    /// Create a new Strava client against the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get authenticated athlete profile.
    pub async fn get_athlete(&self, access_token: &str) -> Result<StravaAthlete, AppError> {
        let url = format!("{}/athlete", self.base_url);
        self.get_json(&url, access_token, &[]).await
    }

    /// List the athlete's most recent activities (first page, newest first).
    pub async fn list_activities(
        &self,
        access_token: &str,
        per_page: u32,
    ) -> Result<Vec<StravaActivitySummary>, AppError> {
        let url = format!("{}/athlete/activities", self.base_url);
        self.get_json(
            &url,
            access_token,
            &[("per_page", per_page.to_string()), ("page", "1".to_string())],
        )
        .await
    }

    /// Fetch the watts stream of one activity.
    ///
    /// `Ok(None)` means the activity has no power data. Non-success
    /// responses are `UpstreamUnavailable`; a watts series that is not a
    /// non-empty list of watts is `MalformedStream`.
    pub async fn get_watts_stream(
        &self,
        access_token: &str,
        activity_id: u64,
    ) -> Result<Option<Vec<f64>>, AppError> {
        let url = format!("{}/activities/{}/streams", self.base_url, activity_id);
        let body: Value = self
            .get_json(
                &url,
                access_token,
                &[
                    ("keys", "watts".to_string()),
                    ("key_by_type", "true".to_string()),
                ],
            )
            .await?;

        parse_watts_stream(&body)
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Strava rate limit hit (429)");
                return Err(AppError::UpstreamUnavailable(
                    AppError::STRAVA_RATE_LIMIT.to_string(),
                ));
            }

            if status.as_u16() == 401 {
                return Err(AppError::UpstreamUnavailable(
                    AppError::STRAVA_TOKEN_ERROR.to_string(),
                ));
            }

            return Err(AppError::UpstreamUnavailable(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("JSON parse error: {}", e)))
    }
}

/// Extract the watts series from a `key_by_type=true` streams body.
///
/// Returns `Ok(None)` when the body has no watts stream at all. A present
/// stream must be a non-empty array of finite, non-negative numbers.
pub fn parse_watts_stream(body: &Value) -> Result<Option<Vec<f64>>, AppError> {
    let streams = body
        .as_object()
        .ok_or_else(|| AppError::MalformedStream("streams body is not an object".to_string()))?;

    let watts = match streams.get("watts") {
        Some(watts) => watts,
        None => return Ok(None),
    };

    let data = watts
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::MalformedStream("watts data is not a list".to_string()))?;

    if data.is_empty() {
        return Err(AppError::MalformedStream("watts data is empty".to_string()));
    }

    data.iter()
        .enumerate()
        .map(|(i, v)| match v.as_f64() {
            Some(w) if w.is_finite() && w >= 0.0 => Ok(w),
            _ => Err(AppError::MalformedStream(format!(
                "invalid sample at index {}: {}",
                i, v
            ))),
        })
        .collect::<Result<Vec<f64>, AppError>>()
        .map(Some)
}

/// Athlete profile from `GET /athlete`.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaAthlete {
    pub id: u64,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
}

/// Summary activity for list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaActivitySummary {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Legacy activity type ("Ride", "Run", ...)
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub distance: f64,
}

impl From<StravaActivitySummary> for ActivityCandidate {
    fn from(summary: StravaActivitySummary) -> Self {
        Self {
            id: summary.id,
            activity_type: summary.activity_type,
            name: summary.name,
            distance_meters: summary.distance,
        }
    }
}

/// An authenticated Strava session, passed explicitly into each call.
#[derive(Debug, Clone)]
pub struct StravaSession {
    /// Local identity the caller claims (from the session JWT)
    pub athlete_id: u64,
    /// Strava bearer token for this request
    pub access_token: String,
}

/// `ActivitySource` backed by the Strava REST API for one session.
pub struct StravaActivitySource<'a> {
    client: &'a StravaClient,
    session: &'a StravaSession,
}

impl<'a> StravaActivitySource<'a> {
    pub fn new(client: &'a StravaClient, session: &'a StravaSession) -> Self {
        Self { client, session }
    }
}

#[async_trait]
impl ActivitySource for StravaActivitySource<'_> {
    async fn list_candidates(&self, limit: u32) -> Result<Vec<ActivityCandidate>, AppError> {
        let activities = self
            .client
            .list_activities(&self.session.access_token, limit)
            .await?;
        Ok(activities.into_iter().map(ActivityCandidate::from).collect())
    }

    async fn fetch_power_stream(&self, activity_id: u64) -> Result<Option<Vec<f64>>, AppError> {
        self.client
            .get_watts_stream(&self.session.access_token, activity_id)
            .await
    }
}
