// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Logging
//!
//! Structured logging setup via `tracing` + `tracing-subscriber`. A run
//! initializes this once, before the DAG executor starts, so every stage
//! dispatch and cache lookup is recorded on a consistent subscriber.

use crate::infrastructure::config::LoggingSettings;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber for the process.
///
/// `settings.level` seeds the default filter; `RUST_LOG`, if set, still
/// takes precedence, matching `EnvFilter`'s normal precedence rules.
pub fn init(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if settings.format == "json" {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(err) = result {
        eprintln!("tracing subscriber already initialized: {err}");
    }
}
