// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory datastore backend.

use crate::models::{Run, Runner};
use dashmap::DashMap;

/// Process-local store keyed by document ID.
#[derive(Default)]
pub struct MemoryStore {
    runners: DashMap<String, Runner>,
    runs: DashMap<String, Run>,
}

impl MemoryStore {
    pub fn get_runner(&self, runner_id: &str) -> Option<Runner> {
        self.runners.get(runner_id).map(|r| r.value().clone())
    }

    pub fn find_runners_by_user(&self, user: &str) -> Vec<Runner> {
        self.runners
            .iter()
            .filter(|r| r.user == user)
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn put_runner(&self, runner: &Runner) {
        self.runners.insert(runner.id.clone(), runner.clone());
    }

    pub fn get_run(&self, run_id: &str) -> Option<Run> {
        self.runs.get(run_id).map(|r| r.value().clone())
    }

    pub fn list_runs_for_runner(&self, runner_id: &str) -> Vec<Run> {
        self.runs
            .iter()
            .filter(|r| r.runner_id == runner_id)
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn put_run(&self, run: &Run) {
        self.runs.insert(run.id.clone(), run.clone());
    }

    pub fn delete_run(&self, run_id: &str) {
        self.runs.remove(run_id);
    }
}
