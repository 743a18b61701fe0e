// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stage Configuration
//!
//! `StageConfig` is the immutable, validated, typed record a [`crate::stage::Stage`]
//! owns. It must expose a canonical serialisation for hashing (`canonical_json`)
//! and carries a human-readable `name` and an open `tags` map, per the data
//! model. Canonicalisation relies on `serde_json::Map` sorting its keys by
//! default (no `preserve_order` feature enabled anywhere in this workspace),
//! so any `StageConfig` that round-trips through `serde_json::to_value` gets
//! a deterministic byte representation for free.

use std::collections::BTreeMap;

/// Typed, frozen configuration owned by exactly one stage instance.
///
/// Once a node is constructed its config never changes -- `StageConfig`
/// implementations should hold plain owned fields and derive `Clone`, not
/// interior mutability.
pub trait StageConfig: Send + Sync + 'static {
    /// Human-readable identifier, distinct from the node id (many nodes can
    /// share a config "kind" name, e.g. all `scale` stages).
    fn name(&self) -> &str;

    /// Open tag map carried alongside the config for bookkeeping; not
    /// hashed separately (it is included in `canonical_json`).
    fn tags(&self) -> &BTreeMap<String, String>;

    /// Canonical field tree used by [`crate::hashing::hash_config`]. Sorted
    /// by construction since `serde_json::Map` is a `BTreeMap` here.
    fn canonical_json(&self) -> serde_json::Value;
}
