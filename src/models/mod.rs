// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod run;
pub mod runner;

pub use run::{NewRun, Run};
pub use runner::Runner;
