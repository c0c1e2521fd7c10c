// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Serialization helper for cache blobs.
//!
//! A blob holds either a single record or a list of records.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::CacheError;

/// One record or a list of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entities<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Entities<T> {
    /// Flatten into a list.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Entities::Many(items) => items,
            Entities::One(item) => vec![item],
        }
    }
}

/// Encode entities into a cache blob. `None` stays `None`.
pub fn serialize_entities<T: Serialize>(
    entities: Option<&Entities<T>>,
) -> Result<Option<Vec<u8>>, CacheError> {
    entities
        .map(|e| serde_json::to_vec(e).map_err(CacheError::from))
        .transpose()
}

/// Decode a cache blob. `None` stays `None`.
pub fn deserialize_entities<T: DeserializeOwned>(
    data: Option<&[u8]>,
) -> Result<Option<Entities<T>>, CacheError> {
    data.map(|bytes| serde_json::from_slice(bytes).map_err(CacheError::from))
        .transpose()
}
