// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Curve aggregation across a batch of recent activities.
//!
//! Candidates are scanned in provider order. Each qualifying candidate's
//! watts stream is fetched (bounded by a timeout); the first
//! `max_activities` usable streams are merged into one curve by taking, per
//! duration, the maximum of the rounded per-activity best averages.

use crate::config::CurveSettings;
use crate::error::AppError;
use crate::models::{round_watts, PowerCurve, DURATIONS};
use crate::services::power::best_efforts;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use std::collections::BTreeMap;

/// One activity offered by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityCandidate {
    pub id: u64,
    /// Provider activity type tag ("Ride", "Run", ...)
    pub activity_type: String,
    pub name: String,
    pub distance_meters: f64,
}

/// Anything that can list activities and fetch their power streams.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Up to `limit` recent activities, in provider order.
    async fn list_candidates(&self, limit: u32) -> Result<Vec<ActivityCandidate>, AppError>;

    /// Watts samples (1 Hz) for an activity; `Ok(None)` if it has none.
    async fn fetch_power_stream(&self, activity_id: u64) -> Result<Option<Vec<f64>>, AppError>;
}

/// Why a candidate did not contribute to the curve.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    ActivityType(String),
    NoPowerData,
    Malformed(String),
    Unavailable(String),
    TimedOut,
}

/// A candidate that was passed over.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedActivity {
    pub activity_id: u64,
    pub reason: SkipReason,
}

/// Result of one aggregation run.
#[derive(Debug, Clone)]
pub struct CurveRun {
    pub curve: PowerCurve,
    /// Merged activities, in provider order
    pub accepted: Vec<u64>,
    pub skipped: Vec<SkippedActivity>,
}

/// Merge per-activity series into one duration → watts map.
///
/// Every configured duration starts at 0. A series shorter than a duration
/// contributes nothing to it. The result does not depend on input order.
pub fn merge_series<'a, I>(series: I) -> BTreeMap<u32, f64>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut curve: BTreeMap<u32, f64> = DURATIONS.iter().map(|&d| (d, 0.0)).collect();

    for samples in series {
        for (duration, best) in best_efforts(samples) {
            if let Some(best) = best {
                let slot = curve.entry(duration).or_insert(0.0);
                *slot = slot.max(round_watts(best));
            }
        }
    }

    curve
}

/// Drives candidate selection and merging for one athlete.
pub struct CurveAggregator<'a> {
    settings: &'a CurveSettings,
}

impl<'a> CurveAggregator<'a> {
    pub fn new(settings: &'a CurveSettings) -> Self {
        Self { settings }
    }

    /// Build a curve for `athlete_id` from `source`.
    ///
    /// Fails with `UpstreamUnavailable` if listing fails or the token is
    /// rejected during a stream fetch, and with `NoQualifyingActivity` if no
    /// candidate had a usable stream.
    pub async fn aggregate<S>(
        &self,
        athlete_id: u64,
        source: &S,
        now: DateTime<Utc>,
    ) -> Result<CurveRun, AppError>
    where
        S: ActivitySource + ?Sized,
    {
        let candidates = source
            .list_candidates(self.settings.candidate_page_size)
            .await?;

        tracing::debug!(
            athlete_id,
            candidates = candidates.len(),
            "Scanning activities for power data"
        );

        let mut skipped = Vec::new();
        let mut qualifying = Vec::new();
        for candidate in candidates {
            if self.settings.qualifies(&candidate.activity_type) {
                qualifying.push(candidate.id);
            } else {
                skipped.push(SkippedActivity {
                    activity_id: candidate.id,
                    reason: SkipReason::ActivityType(candidate.activity_type),
                });
            }
        }

        let timeout = self.settings.stream_fetch_timeout;
        // `buffered` yields in input order, so selection stays "first N in
        // provider order" even with several fetches in flight.
        let mut fetches = stream::iter(qualifying)
            .map(|activity_id| async move {
                let outcome =
                    tokio::time::timeout(timeout, source.fetch_power_stream(activity_id)).await;
                (activity_id, outcome)
            })
            .buffered(self.settings.stream_fetch_concurrency.max(1));

        let mut accepted: Vec<(u64, Vec<f64>)> = Vec::new();
        while accepted.len() < self.settings.max_activities {
            let Some((activity_id, outcome)) = fetches.next().await else {
                break;
            };

            let reason = match outcome {
                Ok(Ok(Some(samples))) if !samples.is_empty() => {
                    tracing::debug!(
                        athlete_id,
                        activity_id,
                        samples = samples.len(),
                        "Accepted power stream"
                    );
                    accepted.push((activity_id, samples));
                    continue;
                }
                Ok(Ok(Some(_))) => SkipReason::Malformed("watts data is empty".to_string()),
                Ok(Ok(None)) => SkipReason::NoPowerData,
                Ok(Err(AppError::MalformedStream(msg))) => SkipReason::Malformed(msg),
                // The token will fail for every remaining candidate too.
                Ok(Err(e)) if e.is_strava_token_error() => {
                    tracing::warn!(athlete_id, activity_id, "Strava token rejected mid-scan");
                    return Err(e);
                }
                Ok(Err(e)) => SkipReason::Unavailable(e.to_string()),
                Err(_) => SkipReason::TimedOut,
            };

            tracing::info!(athlete_id, activity_id, reason = ?reason, "Skipping activity");
            skipped.push(SkippedActivity {
                activity_id,
                reason,
            });
        }
        drop(fetches);

        let Some(&(reference_id, _)) = accepted.first() else {
            tracing::info!(athlete_id, skipped = skipped.len(), "No activities with power data");
            return Err(AppError::NoQualifyingActivity);
        };

        let watts = merge_series(accepted.iter().map(|(_, samples)| samples.as_slice()));
        let curve = PowerCurve {
            athlete_id,
            activity_id: reference_id,
            watts,
            created_at: now,
        };

        let violations = curve.monotonicity_violations();
        if !violations.is_empty() {
            tracing::warn!(
                athlete_id,
                durations = ?violations,
                "Power curve rises with duration"
            );
        }

        tracing::info!(
            athlete_id,
            accepted = accepted.len(),
            skipped = skipped.len(),
            reference_activity = reference_id,
            "Power curve aggregated"
        );

        Ok(CurveRun {
            curve,
            accepted: accepted.into_iter().map(|(id, _)| id).collect(),
            skipped,
        })
    }
}
