// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Power curve model and its persisted document form.
//!
//! In memory a curve is keyed by duration in seconds (`u32`). At the store
//! boundary keys are always the decimal string form ("5", "10", ...), so the
//! persisted shape never mixes string and numeric keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::AppError;
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};

/// Configured curve durations in seconds, ascending.
pub const DURATIONS: [u32; 13] = [
    5, 10, 20, 30, 60, 120, 180, 300, 600, 900, 1200, 1800, 3600,
];

/// Round watts to 2 decimal places.
pub fn round_watts(watts: f64) -> f64 {
    (watts * 100.0).round() / 100.0
}

/// Best sustained average power per duration for one athlete.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerCurve {
    /// Strava athlete ID (owner)
    pub athlete_id: u64,
    /// First activity merged into the curve (provenance only)
    pub activity_id: u64,
    /// Watts per duration (seconds)
    pub watts: BTreeMap<u32, f64>,
    /// When the curve was generated
    pub created_at: DateTime<Utc>,
}

impl PowerCurve {
    /// Create a curve with every configured duration at the 0 W baseline.
    pub fn baseline(athlete_id: u64, activity_id: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            athlete_id,
            activity_id,
            watts: DURATIONS.iter().map(|&d| (d, 0.0)).collect(),
            created_at,
        }
    }

    /// Watts recorded for a duration, if present.
    pub fn watts_at(&self, duration_secs: u32) -> Option<f64> {
        self.watts.get(&duration_secs).copied()
    }

    /// Whether every configured duration has a value.
    pub fn is_complete(&self) -> bool {
        DURATIONS.iter().all(|d| self.watts.contains_key(d))
    }

    /// Durations whose value exceeds the value of the next shorter duration.
    ///
    /// A physiological curve never rises with duration, but nothing enforces
    /// it; callers decide what to do with violations.
    pub fn monotonicity_violations(&self) -> Vec<u32> {
        self.watts
            .iter()
            .zip(self.watts.iter().skip(1))
            .filter(|((_, shorter), (_, longer))| longer > shorter)
            .map(|(_, (&duration, _))| duration)
            .collect()
    }

    /// Convert to the persisted document form.
    pub fn to_document(&self) -> StoredPowerCurve {
        StoredPowerCurve {
            athlete_id: self.athlete_id,
            activity_id: self.activity_id.to_string(),
            curve: self
                .watts
                .iter()
                .map(|(duration, watts)| (duration.to_string(), *watts))
                .collect(),
            created_at: format_utc_rfc3339(self.created_at),
        }
    }

    /// Decode a persisted document, validating the key encoding.
    ///
    /// Keys must be positive integers in decimal form and values must be
    /// finite and non-negative. Missing configured durations are tolerated
    /// (logged) so older documents remain readable.
    pub fn from_document(doc: &StoredPowerCurve) -> Result<Self, AppError> {
        let activity_id = doc.activity_id.parse::<u64>().map_err(|_| {
            AppError::Database(format!(
                "Invalid activity_id in stored curve for athlete {}: {}",
                doc.athlete_id, doc.activity_id
            ))
        })?;

        let created_at = parse_utc_rfc3339(&doc.created_at).map_err(|e| {
            AppError::Database(format!(
                "Invalid created_at in stored curve for athlete {}: {}",
                doc.athlete_id, e
            ))
        })?;

        let mut watts = BTreeMap::new();
        for (key, &value) in &doc.curve {
            let duration = parse_duration_key(key).ok_or_else(|| {
                AppError::Database(format!(
                    "Invalid duration key {:?} in stored curve for athlete {}",
                    key, doc.athlete_id
                ))
            })?;
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::Database(format!(
                    "Invalid watts {} at {}s in stored curve for athlete {}",
                    value, duration, doc.athlete_id
                )));
            }
            watts.insert(duration, value);
        }

        let curve = Self {
            athlete_id: doc.athlete_id,
            activity_id,
            watts,
            created_at,
        };

        if !curve.is_complete() {
            tracing::warn!(
                athlete_id = doc.athlete_id,
                stored = curve.watts.len(),
                "Stored curve is missing configured durations"
            );
        }

        Ok(curve)
    }
}

/// Canonical duration keys are plain decimal seconds ("5", "3600").
fn parse_duration_key(key: &str) -> Option<u32> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|&d| d > 0)
}

/// Power curve document as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPowerCurve {
    /// Strava athlete ID (owner)
    pub athlete_id: u64,
    /// Reference activity ID (string, as Strava IDs exceed JS integers)
    pub activity_id: String,
    /// Watts keyed by duration in seconds ("5" .. "3600")
    pub curve: HashMap<String, f64>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}
