// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stage
//!
//! A `Stage` is a single node's unit of work: a pure, deterministic
//! function from an input [`State`] (plus optional [`PolicyBag`]
//! overrides) to a [`StageResult`]. Stages never perform their own I/O or
//! scheduling -- the executor dispatches them onto worker threads and the
//! scheduler owns concurrency, retries, and resource admission.
//!
//! `process` is synchronous on purpose: stage bodies are CPU-bound
//! transformations over in-memory state, so the executor runs them the
//! way `BasicStageExecutor` runs its stage services -- handed to the
//! scheduler as blocking work, not as an `async fn`.

use crate::error::EngineError;
use crate::state::State;
use crate::value_objects::policy_bag::PolicyBag;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Scalar metric value an accumulator merges under a namespaced key.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// A deferred artifact producer, identified by a stable symbolic name so
/// hashing can treat two runs deferring the same computation as equal
/// (see [`crate::hashing::hash_stage_result`]) without ever invoking the
/// closure during hashing itself.
#[derive(Clone)]
pub struct LazyArtifact {
    pub symbolic_name: String,
    pub producer: Arc<dyn Fn() -> serde_json::Value + Send + Sync>,
}

impl fmt::Debug for LazyArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyArtifact").field("symbolic_name", &self.symbolic_name).finish()
    }
}

impl PartialEq for LazyArtifact {
    fn eq(&self, other: &Self) -> bool {
        self.symbolic_name == other.symbolic_name
    }
}

/// An artifact a stage produces: either materialised immediately or
/// deferred behind a named producer closure, evaluated only when the
/// accumulator actually needs its value (e.g. when writing provenance).
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactValue {
    Eager(serde_json::Value),
    Lazy(LazyArtifact),
}

impl ArtifactValue {
    /// Resolves the value, invoking the producer for lazy artifacts.
    pub fn resolve(&self) -> serde_json::Value {
        match self {
            ArtifactValue::Eager(v) => v.clone(),
            ArtifactValue::Lazy(lazy) => (lazy.producer)(),
        }
    }
}

/// Output of a single stage invocation: the next state plus whatever the
/// stage chooses to report for accumulation and provenance.
#[derive(Debug, Clone)]
pub struct StageResult<S: State> {
    pub state: S,
    pub metrics: BTreeMap<String, MetricValue>,
    pub artifacts: BTreeMap<String, ArtifactValue>,
    pub provenance: serde_json::Map<String, serde_json::Value>,
}

impl<S: State> StageResult<S> {
    /// A result carrying no metrics, artifacts, or provenance -- the
    /// common case for stages that only transform state.
    pub fn new(state: S) -> Self {
        Self {
            state,
            metrics: BTreeMap::new(),
            artifacts: BTreeMap::new(),
            provenance: serde_json::Map::new(),
        }
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: MetricValue) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    pub fn with_artifact(mut self, key: impl Into<String>, value: ArtifactValue) -> Self {
        self.artifacts.insert(key.into(), value);
        self
    }
}

/// The unit of work a DAG node wraps. Implementations own their
/// [`crate::config::StageConfig`] and must report a stable `cfg_hash` for
/// cache-key derivation without re-hashing the config on every call.
pub trait Stage<S: State>: Send + Sync {
    /// Runs the stage. `policy` carries any per-run overrides collapsed
    /// from a sweep or CLI override; stages that ignore policy entirely
    /// are free to do so.
    fn process(
        &self,
        state: &S,
        policy: Option<&PolicyBag>,
    ) -> Result<StageResult<S>, EngineError>;

    /// Coarse cost estimate (arbitrary unit, larger means more expensive)
    /// used only for scheduling heuristics, never for correctness.
    fn estimated_cost(&self, _state: &S) -> u64 {
        1
    }

    /// Name of a resource dimension this stage can be sharded over (e.g.
    /// `"gpu"`), or `None` if the stage always runs as a single unit.
    fn parallelisable_over(&self) -> Option<String> {
        None
    }

    /// Stable hash of this stage's frozen [`crate::config::StageConfig`].
    /// Computed once at construction time via [`crate::hashing::hash_config`]
    /// and returned here so the executor never has to special-case how a
    /// particular stage stores its config.
    fn cfg_hash(&self) -> String;
}
