// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Runners (one document per user, keyed by a hash of the email)
//! - Runs (one document per logged run, referencing its runner)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Run, Runner};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator rejects real credentials, so skip the default token source
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
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

        Ok(Self { client })
    }

    // ─── Runner Operations ───────────────────────────────────────

    /// Get a runner by document ID.
    pub async fn get_runner(&self, runner_id: &str) -> Result<Option<Runner>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::RUNNERS)
            .obj()
            .one(runner_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Query runners by their `user` field.
    pub async fn find_runners_by_user(&self, user: &str) -> Result<Vec<Runner>, AppError> {
        let user = user.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::RUNNERS)
            .filter(move |q| q.for_all([q.field("user").eq(user.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a runner.
    pub async fn put_runner(&self, runner: &Runner) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::RUNNERS)
            .document_id(&runner.id)
            .object(runner)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Run Operations ──────────────────────────────────────────

    /// Get a run by document ID.
    pub async fn get_run(&self, run_id: &str) -> Result<Option<Run>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::RUNS)
            .obj()
            .one(run_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all runs that reference a runner, unordered.
    ///
    /// Sorting happens in [`crate::db::Datastore`] so the query needs no
    /// composite index.
    pub async fn list_runs_for_runner(&self, runner_id: &str) -> Result<Vec<Run>, AppError> {
        let runner_id = runner_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::RUNS)
            .filter(move |q| q.for_all([q.field("runner_id").eq(runner_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a run.
    pub async fn put_run(&self, run: &Run) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::RUNS)
            .document_id(&run.id)
            .object(run)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a run.
    pub async fn delete_run(&self, run_id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::RUNS)
            .document_id(run_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
