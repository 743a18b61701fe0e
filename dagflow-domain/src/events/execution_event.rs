// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Execution Events
//!
//! A run's provenance trail is a flat, append-only sequence of
//! `ExecutionEvent`s, one per node completion. Replaying a run means
//! re-deriving the same sequence of `(node_id, cache_key, outcome)`
//! triples in the same order -- nothing here is mutated once appended.

use serde::{Deserialize, Serialize};

/// Whether a node's job was actually executed or served from cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeOutcome {
    Computed,
    CacheHit,
}

/// One node's completion record within a run's execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub node_id: String,
    pub cache_key: String,
    pub outcome: NodeOutcome,
    /// Position of this event in the run's observed completion order.
    /// Not the topological order -- this reflects wall-clock dispatch,
    /// which is why replay checks it only for set-completeness, not for
    /// an exact ordering match (invariant: every node appears exactly
    /// once by the time the run finishes).
    pub sequence: u64,
}

impl ExecutionEvent {
    pub fn new(node_id: impl Into<String>, cache_key: impl Into<String>, outcome: NodeOutcome, sequence: u64) -> Self {
        Self { node_id: node_id.into(), cache_key: cache_key.into(), outcome, sequence }
    }
}
