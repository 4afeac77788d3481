// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Power curves (one current curve per user, replaced transactionally)

use crate::db::{check_curve_owner, collections, CurveStore};
use crate::error::AppError;
use crate::models::user::sort_summaries;
use crate::models::{PowerCurve, StoredPowerCurve, User, UserSummary};
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use serde::Deserialize;
use std::collections::BTreeSet;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// IDs of every curve document a user owns, current and legacy.
    async fn curve_document_ids(&self, athlete_id: u64) -> Result<Vec<String>, AppError> {
        let refs: Vec<CurveDocumentRef> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::POWER_CURVES)
            .filter(move |q| q.for_all([q.field("athlete_id").eq(athlete_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(refs
            .into_iter()
            .filter_map(|r| {
                if r.doc_id.is_none() {
                    tracing::warn!(athlete_id, "Curve document without an ID, skipping");
                }
                r.doc_id
            })
            .collect())
    }

    /// Number of curve documents a user owns.
    pub async fn curve_document_count(&self, athlete_id: u64) -> Result<usize, AppError> {
        Ok(self.curve_document_ids(athlete_id).await?.len())
    }

    /// Overwrite the user's curve document and drop any legacy ones, with an
    /// optional profile write, in one transaction.
    async fn replace_curve(
        &self,
        athlete_id: u64,
        curve: &PowerCurve,
        profile: Option<&User>,
    ) -> Result<(), AppError> {
        check_curve_owner(athlete_id, curve)?;

        let client = self.get_client()?;
        let doc_id = curve_doc_id(athlete_id);
        let legacy: Vec<String> = self
            .curve_document_ids(athlete_id)
            .await?
            .into_iter()
            .filter(|id| *id != doc_id)
            .collect();

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for legacy_id in &legacy {
            client
                .fluent()
                .delete()
                .from(collections::POWER_CURVES)
                .document_id(legacy_id)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add curve deletion to transaction: {}",
                        e
                    ))
                })?;
        }

        client
            .fluent()
            .update()
            .in_col(collections::POWER_CURVES)
            .document_id(&doc_id)
            .object(&curve.to_document())
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add curve to transaction: {}", e))
            })?;

        if let Some(user) = profile {
            client
                .fluent()
                .update()
                .in_col(collections::USERS)
                .document_id(athlete_id.to_string())
                .object(user)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add profile to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            athlete_id,
            legacy_removed = legacy.len(),
            with_profile = profile.is_some(),
            "Power curve replaced atomically"
        );

        Ok(())
    }

    /// Newest curve among documents written before curves were keyed by
    /// athlete alone.
    async fn latest_legacy_curve(&self, athlete_id: u64) -> Result<Option<PowerCurve>, AppError> {
        let docs: Vec<StoredPowerCurve> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::POWER_CURVES)
            .filter(move |q| q.for_all([q.field("athlete_id").eq(athlete_id)]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        docs.first().map(PowerCurve::from_document).transpose()
    }
}

/// Only the Firestore document ID of a curve document.
#[derive(Debug, Deserialize)]
struct CurveDocumentRef {
    #[serde(alias = "_firestore_id")]
    doc_id: Option<String>,
}

/// Document ID of a user's one curve document.
fn curve_doc_id(athlete_id: u64) -> String {
    athlete_id.to_string()
}

#[async_trait]
impl CurveStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, athlete_id: u64) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&athlete_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.strava_athlete_id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Power Curve Operations ──────────────────────────────────

    /// Overwrite the user's single curve document in one transaction,
    /// removing legacy per-run documents alongside.
    async fn upsert_curve(&self, athlete_id: u64, curve: &PowerCurve) -> Result<(), AppError> {
        self.replace_curve(athlete_id, curve, None).await
    }

    async fn upsert_curve_with_user(
        &self,
        user: &User,
        curve: &PowerCurve,
    ) -> Result<(), AppError> {
        self.replace_curve(user.strava_athlete_id, curve, Some(user)).await
    }

    async fn latest_curve(&self, athlete_id: u64) -> Result<Option<PowerCurve>, AppError> {
        let current: Option<StoredPowerCurve> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::POWER_CURVES)
            .obj()
            .one(&curve_doc_id(athlete_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match current {
            Some(doc) => PowerCurve::from_document(&doc).map(Some),
            None => self.latest_legacy_curve(athlete_id).await,
        }
    }

    async fn list_users_with_curve(&self, excluding: u64) -> Result<Vec<UserSummary>, AppError> {
        let docs: Vec<StoredPowerCurve> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::POWER_CURVES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let owner_ids: BTreeSet<u64> = docs
            .iter()
            .map(|doc| doc.athlete_id)
            .filter(|&id| id != excluding)
            .collect();

        let users = stream::iter(owner_ids)
            .map(|id| async move { self.get_user(id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<User>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<User>>, AppError>>()?;

        let mut summaries: Vec<UserSummary> =
            users.iter().flatten().map(UserSummary::from).collect();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_doc_id_is_athlete_id() {
        assert_eq!(curve_doc_id(42), "42");
    }

    #[test]
    fn test_curve_document_ref_reads_id_only() {
        let with_id: CurveDocumentRef = serde_json::from_value(serde_json::json!({
            "_firestore_id": "42_1750000000",
            "athlete_id": 42,
            "created_at": "not a timestamp",
        }))
        .unwrap();
        assert_eq!(with_id.doc_id.as_deref(), Some("42_1750000000"));

        let without_id: CurveDocumentRef =
            serde_json::from_value(serde_json::json!({ "athlete_id": 42 })).unwrap();
        assert!(without_id.doc_id.is_none());
    }

    #[tokio::test]
    async fn test_offline_store_reports_database_error() {
        let db = FirestoreDb::new_mock();
        let err = db.latest_curve(1).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_foreign_curve_rejected_before_any_io() {
        let db = FirestoreDb::new_mock();
        let curve = PowerCurve::baseline(2, 1, chrono::Utc::now());
        let err = db.upsert_curve(1, &curve).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownUser(_)));
    }
}
