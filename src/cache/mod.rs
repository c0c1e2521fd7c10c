// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Best-effort run list cache.
//!
//! Entries are opaque blobs keyed by identity email. Nothing here is
//! authoritative: callers fall back to the datastore on a miss and only log
//! when a write is refused. A full cache evicts an arbitrary entry to make
//! room for a new one.

pub mod codec;

pub use codec::Entities;

use dashmap::DashMap;
use std::sync::Arc;

/// Cache errors. Never converted into an HTTP error.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache disabled (capacity 0)")]
    Disabled,

    #[error("Cache codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Shared key→blob cache.
#[derive(Clone)]
pub struct RunCache {
    entries: Arc<DashMap<String, Vec<u8>>>,
    max_entries: usize,
}

impl RunCache {
    /// Create a cache holding at most `max_entries` keys. A capacity of 0
    /// disables the cache and every write is refused.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    /// Get the blob stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    /// Store `value` under `key`, replacing any previous blob.
    ///
    /// When this pushes the cache over capacity, other keys are evicted until
    /// it fits again. Concurrent writers may briefly overshoot; each one keeps
    /// evicting until the bound holds.
    pub fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        if self.max_entries == 0 {
            return Err(CacheError::Disabled);
        }

        self.entries.insert(key.to_string(), value);

        while self.entries.len() > self.max_entries {
            // The iterator holds shard locks, so pick the victim before removing it
            let victim = self
                .entries
                .iter()
                .map(|entry| entry.key().clone())
                .find(|candidate| candidate.as_str() != key);

            let Some(victim) = victim else {
                break;
            };
            if self.entries.remove(&victim).is_some() {
                tracing::debug!(max_entries = self.max_entries, "Evicted run cache entry");
            }
        }

        Ok(())
    }

    /// Remove the entry for `key`. Returns whether one existed.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
