// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Runner and run access with a cache-aside run list.
//!
//! Reads check the cache first and fall back to the datastore. Writes go to
//! the datastore and then refresh (or clear) the cached list. Cache failures
//! are logged and never returned; datastore failures always are.

use crate::cache::codec::{deserialize_entities, serialize_entities};
use crate::cache::{CacheError, Entities, RunCache};
use crate::db::Datastore;
use crate::error::AppError;
use crate::identity::Identity;
use crate::models::{NewRun, Run, Runner};

/// Domain access to runners and their runs.
#[derive(Clone)]
pub struct RunLog {
    db: Datastore,
    cache: RunCache,
}

impl RunLog {
    pub fn new(db: Datastore, cache: RunCache) -> Self {
        Self { db, cache }
    }

    // ─── Runners ─────────────────────────────────────────────────

    /// The runner record for `identity`, if one has been created.
    pub async fn get_runner(&self, identity: &Identity) -> Result<Option<Runner>, AppError> {
        self.db
            .get_runner(&Runner::id_for_user(&identity.email))
            .await
    }

    /// Write a runner record for `identity`.
    ///
    /// The document ID is derived from the email, so repeated calls overwrite
    /// the same record instead of adding another one.
    pub async fn put_runner(&self, identity: &Identity) -> Result<Runner, AppError> {
        let runner = Runner::new(&identity.email);
        self.db.put_runner(&runner).await?;
        tracing::info!(runner_id = %runner.id, "Runner created");
        Ok(runner)
    }

    /// Existing runner for `identity`, creating it on first use.
    pub async fn ensure_runner(&self, identity: &Identity) -> Result<Runner, AppError> {
        match self.get_runner(identity).await? {
            Some(runner) => Ok(runner),
            None => self.put_runner(identity).await,
        }
    }

    // ─── Runs ────────────────────────────────────────────────────

    /// All runs for `identity`, from cache when possible.
    pub async fn get_runs(&self, identity: &Identity) -> Result<Vec<Run>, AppError> {
        let key = identity.cache_key();

        match deserialize_entities::<Run>(self.cache.get(key).as_deref()) {
            Ok(Some(entities)) => {
                tracing::debug!("Run cache hit");
                return Ok(entities.into_vec());
            }
            Ok(None) => tracing::debug!("Run cache miss"),
            Err(e) => tracing::warn!(error = %e, "Discarding undecodable run cache entry"),
        }

        let Some(runner) = self.get_runner(identity).await? else {
            return Ok(Vec::new());
        };

        let runs = self.db.list_runs_for_runner(&runner.id).await?;
        self.cache_runs(identity, &runs);
        Ok(runs)
    }

    /// Store a new run for `runner` and refresh the cached list.
    pub async fn put_run(
        &self,
        identity: &Identity,
        runner: &Runner,
        new_run: NewRun,
    ) -> Result<Run, AppError> {
        let run = Run::create(&runner.id, new_run)?;
        self.db.put_run(&run).await?;

        let runs = self.db.list_runs_for_runner(&runner.id).await?;
        self.cache_runs(identity, &runs);

        tracing::info!(run_id = %run.id, runner_id = %runner.id, "Run added");
        Ok(run)
    }

    /// Delete the run stored under `key` and clear the cached list.
    ///
    /// A key that does not exist, or that belongs to another runner, is
    /// reported as not found.
    pub async fn remove_run(&self, identity: &Identity, key: &str) -> Result<(), AppError> {
        let not_found = || AppError::NotFound(format!("Run {} not found", key));

        let run = self.db.get_run(key).await?.ok_or_else(not_found)?;
        if run.runner_id != Runner::id_for_user(&identity.email) {
            tracing::warn!(run_id = %key, "Refusing to remove run owned by another runner");
            return Err(not_found());
        }

        self.db.delete_run(&run.id).await?;
        self.clear_run_cache(identity);

        tracing::info!(run_id = %run.id, "Run removed");
        Ok(())
    }

    /// Drop the cached run list for `identity`.
    pub fn clear_run_cache(&self, identity: &Identity) {
        self.cache.delete(identity.cache_key());
    }

    /// Best-effort cache write; failures are only logged.
    fn cache_runs(&self, identity: &Identity, runs: &[Run]) {
        let result = serialize_entities(Some(&Entities::Many(runs.to_vec())))
            .and_then(|blob| self.cache.set(identity.cache_key(), blob.unwrap_or_default()));

        match result {
            Ok(()) => {}
            Err(CacheError::Disabled) => tracing::debug!("Run cache disabled; not caching"),
            Err(e) => tracing::error!(error = %e, "Run cache set failed"),
        }
    }
}
