// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use powercurve_tracker::error::AppError;

#[test]
fn test_is_strava_token_error_matches() {
    let err = AppError::UpstreamUnavailable(AppError::STRAVA_TOKEN_ERROR.to_string());
    assert!(err.is_strava_token_error());
}

#[test]
fn test_is_strava_token_error_no_match() {
    let err = AppError::UpstreamUnavailable(AppError::STRAVA_RATE_LIMIT.to_string());
    assert!(!err.is_strava_token_error());

    let err = AppError::UpstreamUnavailable("HTTP 500 Internal Server Error".to_string());
    assert!(!err.is_strava_token_error());

    let err = AppError::BadRequest(AppError::STRAVA_TOKEN_ERROR.to_string());
    assert!(!err.is_strava_token_error());
}

#[test]
fn test_status_mapping() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::NotFound("curve".into()), StatusCode::NOT_FOUND),
        (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
        (
            AppError::UpstreamUnavailable("down".into()),
            StatusCode::BAD_GATEWAY,
        ),
        (
            AppError::NoQualifyingActivity,
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            AppError::MalformedStream("null".into()),
            StatusCode::BAD_GATEWAY,
        ),
        (AppError::UnknownUser("1".into()), StatusCode::FORBIDDEN),
        (
            AppError::Database("boom".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            AppError::Internal(anyhow::anyhow!("boom")),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, status) in cases {
        let label = err.to_string();
        assert_eq!(err.into_response().status(), status, "{}", label);
    }
}

#[tokio::test]
async fn test_database_details_not_exposed() {
    let response = AppError::Database("connection string secret".into()).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert!(body.get("details").is_none());
    assert!(!String::from_utf8_lossy(&bytes).contains("secret"));
}
