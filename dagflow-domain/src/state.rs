// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # State
//!
//! `State` is the application payload that flows between stages. Each
//! application supplies its own variant; the engine requires only that it
//! can be cloned independently (`deep_copy`) and reduced to bytes whose
//! equality matches semantic equality (`hashable_repr`), since those bytes
//! feed the cache-key derivation in [`crate::hashing`].
//!
//! States must also be (de)serializable: the disk cache backend persists a
//! completed node's state so a later run with the same cache key can
//! reconstruct it without recomputation.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Capability contract every pipeline state payload must satisfy.
///
/// Implementations define their own internal structure; the engine only
/// ever touches a state through this trait.
pub trait State: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Bytes whose equality matches the semantic equality of `self`. Used
    /// as the basis for `hash_state` (see [`crate::hashing`]). Must be
    /// stable across process runs for equal-valued states.
    fn hashable_repr(&self) -> Vec<u8>;

    /// Produces an independent clone. States are `Clone`, so the default
    /// simply delegates; it exists as a named operation distinct from
    /// Rust's `Clone` because stages must deep-copy before mutating a
    /// shared input.
    fn deep_copy(&self) -> Self {
        self.clone()
    }
}

/// Fan-in container: maps each dependency's id to the state it produced.
/// Bound to a node only when it has more than one dependency and no
/// `input_selector` was supplied.
pub type DagState<S> = BTreeMap<String, S>;
