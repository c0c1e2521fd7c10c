// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Run model: one logged workout.

use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Longest accepted value for any free-text run field.
pub const MAX_FIELD_LEN: u64 = 500;

/// Stored run record in Firestore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Random key (also used as document ID)
    pub id: String,
    /// Owning runner's ID
    pub runner_id: String,
    /// Run name/title
    pub name: String,
    /// Distance as typed by the runner (free text)
    pub distance: String,
    /// Duration as typed by the runner (free text)
    pub duration: String,
    /// When the run was logged
    pub date: DateTime<Utc>,
}

/// Form payload for a new run.
///
/// Distance and duration are deliberately free text; only length is bounded.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewRun {
    #[serde(default)]
    #[validate(length(max = 500))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub distance: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub duration: String,
}

impl Run {
    /// Create a run owned by `runner_id`, stamped with the current time.
    pub fn create(runner_id: &str, new_run: NewRun) -> anyhow::Result<Self> {
        Ok(Self {
            id: generate_run_id()?,
            runner_id: runner_id.to_string(),
            name: new_run.name,
            distance: new_run.distance,
            duration: new_run.duration,
            date: Utc::now(),
        })
    }
}

/// Generate a random 128-bit hex key.
fn generate_run_id() -> anyhow::Result<String> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| anyhow::anyhow!("Failed to generate run ID"))?;
    Ok(hex::encode(bytes))
}
