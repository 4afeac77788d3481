// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Activity provider unreachable or returned a failure.
    #[error("Upstream provider unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Provider reachable, but no activity had a usable power stream.
    #[error("No usable activity data")]
    NoQualifyingActivity,

    /// A power stream was present but not a non-empty list of watts.
    /// Recovered locally by the aggregator (candidate skipped).
    #[error("Malformed power stream: {0}")]
    MalformedStream(String),

    /// Curve could not be attributed to a known local user.
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Marker stored in `UpstreamUnavailable` when Strava answers 429.
    pub const STRAVA_RATE_LIMIT: &'static str = "Strava rate limit exceeded";

    /// Marker stored in `UpstreamUnavailable` when Strava answers 401.
    pub const STRAVA_TOKEN_ERROR: &'static str = "Strava access token invalid or expired";

    /// Whether this error means the Strava token was rejected.
    pub fn is_strava_token_error(&self) -> bool {
        matches!(self, AppError::UpstreamUnavailable(msg) if msg == Self::STRAVA_TOKEN_ERROR)
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::UpstreamUnavailable(msg) => (
                StatusCode::BAD_GATEWAY,
                "upstream_unavailable",
                Some(msg.clone()),
            ),
            AppError::NoQualifyingActivity => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "no_qualifying_activity",
                Some("No rides with power data found".to_string()),
            ),
            AppError::MalformedStream(msg) => {
                (StatusCode::BAD_GATEWAY, "malformed_stream", Some(msg.clone()))
            }
            AppError::UnknownUser(msg) => {
                tracing::warn!(reason = %msg, "Refusing to attribute curve to unknown user");
                (StatusCode::FORBIDDEN, "unknown_user", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
