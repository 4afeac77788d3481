// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Demo athletes with synthetic curves, for local development.

use crate::db::CurveStore;
use crate::error::AppError;
use crate::models::{round_watts, PowerCurve, User, UserSummary, DURATIONS};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};

/// A demo athlete and the shape of their synthetic curve.
#[derive(Debug, Clone, Copy)]
pub struct DemoAthlete {
    pub athlete_id: u64,
    pub firstname: &'static str,
    pub lastname: &'static str,
    /// Power sustainable for very long efforts (W)
    pub critical_power: f64,
    /// Extra work available above critical power (J)
    pub anaerobic_capacity: f64,
}

pub const DEMO_ATHLETES: [DemoAthlete; 3] = [
    DemoAthlete {
        athlete_id: 1001,
        firstname: "Alice",
        lastname: "Example",
        critical_power: 250.0,
        anaerobic_capacity: 18_000.0,
    },
    DemoAthlete {
        athlete_id: 1002,
        firstname: "Bob",
        lastname: "Example",
        critical_power: 220.0,
        anaerobic_capacity: 15_000.0,
    },
    DemoAthlete {
        athlete_id: 1003,
        firstname: "Charlie",
        lastname: "Example",
        critical_power: 280.0,
        anaerobic_capacity: 21_000.0,
    },
];

/// Offset keeping sprint values finite and realistic (seconds).
const SPRINT_OFFSET_SECS: f64 = 30.0;

impl DemoAthlete {
    /// Deterministic curve: critical power plus a decaying anaerobic term.
    pub fn curve(&self, created_at: DateTime<Utc>) -> PowerCurve {
        let mut curve = PowerCurve::baseline(self.athlete_id, self.athlete_id * 1000, created_at);
        for duration in DURATIONS {
            let watts = self.critical_power
                + self.anaerobic_capacity / (f64::from(duration) + SPRINT_OFFSET_SECS);
            curve.watts.insert(duration, round_watts(watts));
        }
        curve
    }

    fn user(&self, now: DateTime<Utc>) -> User {
        let ts = format_utc_rfc3339(now);
        User {
            strava_athlete_id: self.athlete_id,
            firstname: self.firstname.to_string(),
            lastname: self.lastname.to_string(),
            created_at: ts.clone(),
            last_active: ts,
        }
    }
}

/// Write every demo athlete and their curve, replacing earlier demo curves.
pub async fn seed_demo_data(
    store: &dyn CurveStore,
    now: DateTime<Utc>,
) -> Result<Vec<UserSummary>, AppError> {
    let mut seeded = Vec::with_capacity(DEMO_ATHLETES.len());

    for athlete in &DEMO_ATHLETES {
        let user = match store.get_user(athlete.athlete_id).await? {
            Some(existing) => existing,
            None => {
                let user = athlete.user(now);
                store.upsert_user(&user).await?;
                tracing::info!(athlete_id = athlete.athlete_id, "Added demo user");
                user
            }
        };

        store
            .upsert_curve(athlete.athlete_id, &athlete.curve(now))
            .await?;
        tracing::info!(athlete_id = athlete.athlete_id, "Stored demo power curve");

        seeded.push(UserSummary::from(&user));
    }

    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;

    #[test]
    fn test_demo_curves_are_complete_and_monotone() {
        for athlete in &DEMO_ATHLETES {
            let curve = athlete.curve(Utc::now());
            assert!(curve.is_complete());
            assert!(curve.monotonicity_violations().is_empty());
            assert!(curve.watts_at(3600).unwrap() > athlete.critical_power);
        }
    }

    #[test]
    fn test_demo_curve_is_deterministic() {
        let now = Utc::now();
        assert_eq!(DEMO_ATHLETES[0].curve(now), DEMO_ATHLETES[0].curve(now));
        // 250 + 18000 / 35
        assert_eq!(DEMO_ATHLETES[0].curve(now).watts_at(5), Some(764.29));
    }

    #[tokio::test]
    async fn test_seed_is_repeatable() {
        let db = MemoryDb::new();
        let now = Utc::now();

        seed_demo_data(&db, now).await.unwrap();
        let seeded = seed_demo_data(&db, now).await.unwrap();

        assert_eq!(seeded.len(), 3);
        for athlete in &DEMO_ATHLETES {
            assert_eq!(db.curve_count(athlete.athlete_id), 1);
        }
        let others = db.list_users_with_curve(1001).await.unwrap();
        let names: Vec<&str> = others.iter().map(|u| u.display_name.as_str()).collect();
        assert_eq!(names, vec!["Bob Example", "Charlie Example"]);
    }
}
