// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Run Tracker: a personal running log
//!
//! Signed-in users record runs (name, distance, duration) and browse or
//! delete their history. Run lists are cached per user in front of the
//! datastore.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod views;

use config::Config;
use identity::IdentitySource;
use services::RunLog;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub identity: IdentitySource,
    pub run_log: RunLog,
}
