// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Strava athlete ID (also used as document ID)
    pub strava_athlete_id: u64,
    /// First name
    pub firstname: String,
    /// Last name
    pub lastname: String,
    /// When user first connected
    pub created_at: String,
    /// Last curve generation timestamp
    pub last_active: String,
}

impl User {
    /// Name shown in comparison pickers ("First Last", trimmed).
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
            .trim()
            .to_string()
    }
}

/// User identity and display name for comparison selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserSummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub athlete_id: u64,
    pub display_name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            athlete_id: user.strava_athlete_id,
            display_name: user.display_name(),
        }
    }
}

/// Sort summaries by display name, then athlete ID.
pub fn sort_summaries(summaries: &mut [UserSummary]) {
    summaries.sort_by(|a, b| {
        a.display_name
            .cmp(&b.display_name)
            .then_with(|| a.athlete_id.cmp(&b.athlete_id))
    });
}
