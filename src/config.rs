// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default Strava REST API base URL.
pub const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";

/// Which curve store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Tuning knobs for curve generation.
#[derive(Debug, Clone)]
pub struct CurveSettings {
    /// Activity types whose power streams are analyzed (Strava `type`).
    pub power_activity_types: Vec<String>,
    /// Number of activities with usable streams merged into one curve.
    pub max_activities: usize,
    /// Activities requested from the provider per generation run.
    pub candidate_page_size: u32,
    /// Upper bound for one stream fetch; a timeout counts as "no stream".
    pub stream_fetch_timeout: Duration,
    /// Stream fetches kept in flight at once (1 = strictly sequential).
    pub stream_fetch_concurrency: usize,
}

impl Default for CurveSettings {
    fn default() -> Self {
        Self {
            power_activity_types: vec!["Ride".to_string()],
            max_activities: 5,
            candidate_page_size: 20,
            stream_fetch_timeout: Duration::from_secs(10),
            stream_fetch_concurrency: 1,
        }
    }
}

impl CurveSettings {
    /// Whether an activity type qualifies for power analysis.
    pub fn qualifies(&self, activity_type: &str) -> bool {
        self.power_activity_types
            .iter()
            .any(|t| t == activity_type)
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Curve store backend
    pub store_backend: StoreBackend,
    /// Strava REST API base URL (overridable for tests)
    pub strava_api_base: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Curve generation settings
    pub curve: CurveSettings,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            strava_api_base: STRAVA_API_BASE.to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            curve: CurveSettings::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = CurveSettings::default();

        let power_activity_types = match env::var("POWER_ACTIVITY_TYPES") {
            Ok(raw) => parse_list(&raw),
            Err(_) => defaults.power_activity_types,
        };
        if power_activity_types.is_empty() {
            return Err(ConfigError::Invalid(
                "POWER_ACTIVITY_TYPES",
                "empty list".to_string(),
            ));
        }

        let curve = CurveSettings {
            power_activity_types,
            max_activities: parse_positive("MAX_ACTIVITIES", defaults.max_activities)?,
            candidate_page_size: parse_positive(
                "CANDIDATE_PAGE_SIZE",
                defaults.candidate_page_size,
            )?,
            stream_fetch_timeout: Duration::from_secs(parse_positive(
                "STREAM_FETCH_TIMEOUT_SECS",
                defaults.stream_fetch_timeout.as_secs(),
            )?),
            stream_fetch_concurrency: parse_positive(
                "STREAM_FETCH_CONCURRENCY",
                defaults.stream_fetch_concurrency,
            )?,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend: env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "firestore".to_string())
                .parse()?,
            strava_api_base: env::var("STRAVA_API_BASE")
                .unwrap_or_else(|_| STRAVA_API_BASE.to_string()),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            curve,
        })
    }
}

/// Split a comma-separated env value, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Read a positive integer env var, falling back to `default` when unset.
fn parse_positive<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) if v > T::default() => Ok(v),
            _ => Err(ConfigError::Invalid(name, raw)),
        },
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
