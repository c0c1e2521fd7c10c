// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod avatar;
pub mod iap;
pub mod run_log;

pub use avatar::{avatar_url, gravatar};
pub use run_log::RunLog;
