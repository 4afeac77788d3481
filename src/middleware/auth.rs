// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session middleware and per-request Strava credentials.

use crate::error::AppError;
use crate::services::StravaSession;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie holding the signed JWT.
pub const SESSION_COOKIE: &str = "powercurve_token";

/// Header carrying the caller's Strava access token.
pub const STRAVA_TOKEN_HEADER: &str = "x-strava-token";

/// Session lifetime in seconds.
const SESSION_TTL_SECS: usize = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (Strava athlete ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated caller extracted from the session JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub athlete_id: u64,
}

impl AuthUser {
    /// Pair the caller with the Strava token sent on this request.
    ///
    /// The token is used for this request only and never stored.
    pub fn strava_session(&self, headers: &HeaderMap) -> Result<StravaSession, AppError> {
        let access_token = headers
            .get(STRAVA_TOKEN_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;

        Ok(StravaSession {
            athlete_id: self.athlete_id,
            access_token: access_token.to_string(),
        })
    }
}

/// Session token from the cookie, else from an `Authorization: Bearer` header.
fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(String::from)
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = session_token(&jar, request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let athlete_id = verify_jwt(&token, &state.config.jwt_signing_key).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        StatusCode::UNAUTHORIZED
    })?;

    request.extensions_mut().insert(AuthUser { athlete_id });

    Ok(next.run(request).await)
}

/// Validate a session JWT and return its athlete ID.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> anyhow::Result<u64> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims.sub.parse()?)
}

/// Create a JWT for a user session.
pub fn create_jwt(athlete_id: u64, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: athlete_id.to_string(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const KEY: &[u8] = b"unit_test_signing_key_32_bytes!!";

    #[test]
    fn test_jwt_roundtrip() {
        let token = create_jwt(1001, KEY).unwrap();
        assert_eq!(verify_jwt(&token, KEY).unwrap(), 1001);
    }

    #[test]
    fn test_jwt_wrong_key_rejected() {
        let token = create_jwt(1001, KEY).unwrap();
        assert!(verify_jwt(&token, b"another_key_entirely_32_bytes!!!").is_err());
    }

    #[test]
    fn test_strava_session_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(STRAVA_TOKEN_HEADER, HeaderValue::from_static(" abc123 "));

        let session = AuthUser { athlete_id: 7 }.strava_session(&headers).unwrap();
        assert_eq!(session.athlete_id, 7);
        assert_eq!(session.access_token, "abc123");
    }

    #[test]
    fn test_strava_session_requires_token() {
        let user = AuthUser { athlete_id: 7 };
        assert!(matches!(
            user.strava_session(&HeaderMap::new()),
            Err(AppError::Unauthorized)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(STRAVA_TOKEN_HEADER, HeaderValue::from_static("  "));
        assert!(user.strava_session(&headers).is_err());
    }

    #[test]
    fn test_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok"),
        );
        assert_eq!(
            session_token(&CookieJar::new(), &headers).as_deref(),
            Some("tok")
        );
        assert_eq!(session_token(&CookieJar::new(), &HeaderMap::new()), None);
    }
}
