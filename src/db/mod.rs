// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: the curve store contract and its backends.

pub mod firestore;
pub mod memory;
pub mod seed;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{PowerCurve, User, UserSummary};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const POWER_CURVES: &str = "power_curves";
}

/// Persistence contract for users and their single current power curve.
#[async_trait]
pub trait CurveStore: Send + Sync {
    /// Get a user by their Strava athlete ID.
    async fn get_user(&self, athlete_id: u64) -> Result<Option<User>, AppError>;

    /// Create or update a user profile.
    async fn upsert_user(&self, user: &User) -> Result<(), AppError>;

    /// Atomically replace every curve owned by `athlete_id` with `curve`.
    ///
    /// Readers never observe zero curves mid-replace, nor two curves for the
    /// same user.
    async fn upsert_curve(&self, athlete_id: u64, curve: &PowerCurve) -> Result<(), AppError>;

    /// Replace the curve and write the owner's profile in one atomic step.
    ///
    /// Either both land or neither does.
    async fn upsert_curve_with_user(
        &self,
        user: &User,
        curve: &PowerCurve,
    ) -> Result<(), AppError>;

    /// Most recent curve for a user.
    async fn latest_curve(&self, athlete_id: u64) -> Result<Option<PowerCurve>, AppError>;

    /// Users owning a curve, minus `excluding`, sorted by display name.
    async fn list_users_with_curve(&self, excluding: u64) -> Result<Vec<UserSummary>, AppError>;
}

/// Reject a curve that belongs to someone other than the target user.
pub(crate) fn check_curve_owner(athlete_id: u64, curve: &PowerCurve) -> Result<(), AppError> {
    if curve.athlete_id != athlete_id {
        return Err(AppError::UnknownUser(format!(
            "curve owned by athlete {} cannot be stored for athlete {}",
            curve.athlete_id, athlete_id
        )));
    }
    Ok(())
}
