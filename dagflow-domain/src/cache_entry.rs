// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cache Entry
//!
//! `DagCacheEntry` is what a [`crate::repositories::CachePayload`]
//! deserializes into once the infrastructure cache adapter has decoded
//! its `state_blob` back into a typed [`State`]. It is the reconstructed
//! shape of a previously-computed node, whether this run just produced it
//! or loaded it from a prior one.

use crate::stage::MetricValue;
use crate::state::State;
use std::collections::BTreeMap;

/// Reconstructed record of a completed node: its output state, the
/// metrics it reported, and the provenance fields it attached.
#[derive(Debug, Clone)]
pub struct DagCacheEntry<S: State> {
    pub state: S,
    pub metrics: BTreeMap<String, MetricValue>,
    pub provenance: serde_json::Map<String, serde_json::Value>,
}

impl<S: State> DagCacheEntry<S> {
    pub fn new(
        state: S,
        metrics: BTreeMap<String, MetricValue>,
        provenance: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self { state, metrics, provenance }
    }
}
