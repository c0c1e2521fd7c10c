//! Database layer.
//!
//! [`Datastore`] is what the rest of the app talks to. It forwards every call
//! to either Firestore or an in-memory backend chosen at startup.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::config::{Config, DatastoreBackend};
use crate::error::AppError;
use crate::models::{Run, Runner};
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const RUNNERS: &str = "runners";
    pub const RUNS: &str = "runs";
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreStore),
    Memory(Arc<MemoryStore>),
}

/// Persistent store for runners and runs.
#[derive(Clone)]
pub struct Datastore {
    backend: Backend,
}

impl Datastore {
    /// Connect to the backend named in the config.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.datastore {
            DatastoreBackend::Firestore => {
                Ok(Self::from(FirestoreStore::new(&config.gcp_project_id).await?))
            }
            DatastoreBackend::Memory => {
                tracing::warn!("Using in-memory datastore; data is lost on restart");
                Ok(Self::in_memory())
            }
        }
    }

    /// Empty in-memory datastore.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    // ─── Runner Operations ───────────────────────────────────────

    /// Get a runner by ID.
    pub async fn get_runner(&self, runner_id: &str) -> Result<Option<Runner>, AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.get_runner(runner_id).await,
            Backend::Memory(store) => Ok(store.get_runner(runner_id)),
        }
    }

    /// All runners whose `user` field matches.
    pub async fn find_runners_by_user(&self, user: &str) -> Result<Vec<Runner>, AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.find_runners_by_user(user).await,
            Backend::Memory(store) => Ok(store.find_runners_by_user(user)),
        }
    }

    /// Create or overwrite a runner.
    pub async fn put_runner(&self, runner: &Runner) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.put_runner(runner).await,
            Backend::Memory(store) => {
                store.put_runner(runner);
                Ok(())
            }
        }
    }

    // ─── Run Operations ──────────────────────────────────────────

    /// Get a run by its key.
    pub async fn get_run(&self, run_id: &str) -> Result<Option<Run>, AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.get_run(run_id).await,
            Backend::Memory(store) => Ok(store.get_run(run_id)),
        }
    }

    /// All runs owned by a runner, oldest first.
    pub async fn list_runs_for_runner(&self, runner_id: &str) -> Result<Vec<Run>, AppError> {
        let mut runs = match &self.backend {
            Backend::Firestore(store) => store.list_runs_for_runner(runner_id).await?,
            Backend::Memory(store) => store.list_runs_for_runner(runner_id),
        };
        runs.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(runs)
    }

    /// Store a run.
    pub async fn put_run(&self, run: &Run) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.put_run(run).await,
            Backend::Memory(store) => {
                store.put_run(run);
                Ok(())
            }
        }
    }

    /// Delete a run by its key.
    pub async fn delete_run(&self, run_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.delete_run(run_id).await,
            Backend::Memory(store) => {
                store.delete_run(run_id);
                Ok(())
            }
        }
    }
}

impl From<FirestoreStore> for Datastore {
    fn from(store: FirestoreStore) -> Self {
        Self {
            backend: Backend::Firestore(store),
        }
    }
}
