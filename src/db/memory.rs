// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for local development and tests.
//!
//! Curves are kept in their persisted document form so the key encoding is
//! validated on every read, same as with Firestore.

use crate::db::{check_curve_owner, CurveStore};
use crate::error::AppError;
use crate::models::user::sort_summaries;
use crate::models::{PowerCurve, StoredPowerCurve, User, UserSummary};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// `DashMap`-backed store; one curve document per athlete.
#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<u64, User>>,
    curves: Arc<DashMap<u64, StoredPowerCurve>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored curve documents for a user (0 or 1).
    pub fn curve_count(&self, athlete_id: u64) -> usize {
        usize::from(self.curves.contains_key(&athlete_id))
    }

    /// Raw stored document, for inspecting the persisted shape.
    pub fn stored_curve(&self, athlete_id: u64) -> Option<StoredPowerCurve> {
        self.curves.get(&athlete_id).map(|doc| doc.clone())
    }
}

#[async_trait]
impl CurveStore for MemoryDb {
    async fn get_user(&self, athlete_id: u64) -> Result<Option<User>, AppError> {
        Ok(self.users.get(&athlete_id).map(|u| u.clone()))
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.users.insert(user.strava_athlete_id, user.clone());
        Ok(())
    }

    async fn upsert_curve(&self, athlete_id: u64, curve: &PowerCurve) -> Result<(), AppError> {
        check_curve_owner(athlete_id, curve)?;
        // Insert swaps the entry under the shard write lock.
        self.curves.insert(athlete_id, curve.to_document());
        tracing::debug!(athlete_id, "Power curve replaced (memory store)");
        Ok(())
    }

    async fn upsert_curve_with_user(
        &self,
        user: &User,
        curve: &PowerCurve,
    ) -> Result<(), AppError> {
        check_curve_owner(user.strava_athlete_id, curve)?;
        // Neither insert can fail once the owner check has passed.
        self.curves.insert(user.strava_athlete_id, curve.to_document());
        self.users.insert(user.strava_athlete_id, user.clone());
        tracing::debug!(
            athlete_id = user.strava_athlete_id,
            "Power curve and profile stored (memory store)"
        );
        Ok(())
    }

    async fn latest_curve(&self, athlete_id: u64) -> Result<Option<PowerCurve>, AppError> {
        let doc = match self.curves.get(&athlete_id) {
            Some(doc) => doc.clone(),
            None => return Ok(None),
        };
        PowerCurve::from_document(&doc).map(Some)
    }

    async fn list_users_with_curve(&self, excluding: u64) -> Result<Vec<UserSummary>, AppError> {
        let owner_ids: Vec<u64> = self
            .curves
            .iter()
            .map(|entry| *entry.key())
            .filter(|&id| id != excluding)
            .collect();

        let mut summaries: Vec<UserSummary> = owner_ids
            .into_iter()
            .filter_map(|id| self.users.get(&id).map(|u| UserSummary::from(&*u)))
            .collect();

        sort_summaries(&mut summaries);
        Ok(summaries)
    }
}
