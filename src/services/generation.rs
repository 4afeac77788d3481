// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Power curve generation workflow.
//!
//! Handles the core workflow:
//! 1. Confirm the Strava token belongs to the caller
//! 2. Aggregate recent activities into one curve
//! 3. Store the curve and the caller's profile together, or not at all

use crate::config::CurveSettings;
use crate::db::CurveStore;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::curve::{ActivitySource, CurveAggregator, CurveRun};
use crate::services::strava::{StravaAthlete, StravaClient, StravaSession};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};

/// Generates and persists power curves.
pub struct CurveService<'a> {
    store: &'a dyn CurveStore,
    settings: &'a CurveSettings,
}

impl<'a> CurveService<'a> {
    pub fn new(store: &'a dyn CurveStore, settings: &'a CurveSettings) -> Self {
        Self { store, settings }
    }

    /// Fetch the Strava athlete behind the session token and check it is the
    /// session's athlete. Writes nothing.
    ///
    /// A token for a different athlete is `UnknownUser`; a rejected token
    /// is `Unauthorized`.
    pub async fn resolve_strava_athlete(
        &self,
        strava: &StravaClient,
        session: &StravaSession,
    ) -> Result<StravaAthlete> {
        let athlete = strava
            .get_athlete(&session.access_token)
            .await
            .map_err(|e| {
                if e.is_strava_token_error() {
                    AppError::Unauthorized
                } else {
                    e
                }
            })?;

        check_session_athlete(session.athlete_id, athlete)
    }

    /// Aggregate `source` into a curve for `athlete` and store it, replacing
    /// any previous curve.
    ///
    /// The profile is created or refreshed in the same store write as the
    /// curve, so a failed run leaves both untouched.
    pub async fn generate<S>(&self, athlete: &StravaAthlete, source: &S) -> Result<CurveRun>
    where
        S: ActivitySource + ?Sized,
    {
        let athlete_id = athlete.id;
        tracing::info!(athlete_id, "Generating power curve");

        let existing = self.store.get_user(athlete_id).await?;

        let now = Utc::now();
        let run = CurveAggregator::new(self.settings)
            .aggregate(athlete_id, source, now)
            .await?;

        let user = profile_for(existing, athlete, now);
        self.store.upsert_curve_with_user(&user, &run.curve).await?;

        tracing::info!(
            athlete_id,
            activities = run.accepted.len(),
            "Power curve stored"
        );

        Ok(run)
    }
}

/// Reject a Strava athlete that is not the session's athlete.
fn check_session_athlete(session_athlete_id: u64, athlete: StravaAthlete) -> Result<StravaAthlete> {
    if athlete.id != session_athlete_id {
        return Err(AppError::UnknownUser(format!(
            "Strava token belongs to athlete {}, session is athlete {}",
            athlete.id, session_athlete_id
        )));
    }
    Ok(athlete)
}

/// Profile to store with a fresh curve: names from Strava, `created_at`
/// kept from any existing profile.
fn profile_for(existing: Option<User>, athlete: &StravaAthlete, now: DateTime<Utc>) -> User {
    let now = format_utc_rfc3339(now);
    match existing {
        Some(mut user) => {
            user.firstname = athlete.firstname.clone();
            user.lastname = athlete.lastname.clone();
            user.last_active = now;
            user
        }
        None => {
            tracing::info!(athlete_id = athlete.id, "Creating local profile for athlete");
            User {
                strava_athlete_id: athlete.id,
                firstname: athlete.firstname.clone(),
                lastname: athlete.lastname.clone(),
                created_at: now.clone(),
                last_active: now,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn athlete(id: u64) -> StravaAthlete {
        StravaAthlete {
            id,
            firstname: "Alice".to_string(),
            lastname: "Example".to_string(),
        }
    }

    #[test]
    fn test_session_athlete_must_match() {
        assert_eq!(check_session_athlete(1001, athlete(1001)).unwrap().id, 1001);

        let err = check_session_athlete(1001, athlete(2002)).unwrap_err();
        assert!(matches!(err, AppError::UnknownUser(_)));
    }

    #[test]
    fn test_profile_for_new_athlete() {
        let now = Utc::now();
        let user = profile_for(None, &athlete(1001), now);

        assert_eq!(user.strava_athlete_id, 1001);
        assert_eq!(user.display_name(), "Alice Example");
        assert_eq!(user.created_at, user.last_active);
    }

    #[test]
    fn test_profile_for_existing_keeps_created_at() {
        let existing = User {
            strava_athlete_id: 1001,
            firstname: "Old".to_string(),
            lastname: "Name".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            last_active: "2024-01-01T00:00:00Z".to_string(),
        };

        let mut renamed = athlete(1001);
        renamed.lastname = "Renamed".to_string();
        let user = profile_for(Some(existing), &renamed, Utc::now());

        assert_eq!(user.created_at, "2024-01-01T00:00:00Z");
        assert_ne!(user.last_active, "2024-01-01T00:00:00Z");
        assert_eq!(user.display_name(), "Alice Renamed");
    }
}
