// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Runner model: one record per signed-in user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Runner profile stored in Firestore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runner {
    /// Deterministic ID derived from `user` (also used as document ID)
    pub id: String,
    /// Identity email this runner belongs to
    pub user: String,
    /// When the runner first added a run
    pub created_at: DateTime<Utc>,
}

impl Runner {
    /// Build a new runner for `user`.
    pub fn new(user: &str) -> Self {
        Self {
            id: Self::id_for_user(user),
            user: user.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Document ID for a user's runner record.
    ///
    /// Every write for the same user lands on the same document, which is what
    /// keeps runners unique without a separate existence check.
    pub fn id_for_user(user: &str) -> String {
        hex::encode(Sha256::digest(user.trim().to_lowercase().as_bytes()))
    }
}
