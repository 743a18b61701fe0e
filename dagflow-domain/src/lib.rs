// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dagflow Domain
//!
//! The pure, reusable model of a reproducible compute-pipeline run: DAG
//! construction, content-addressed hashing, and the ports an executor
//! needs from a cache and a scheduler. Nothing here touches a filesystem,
//! a network socket, or a thread pool -- those live in the `dagflow`
//! crate's infrastructure layer.
//!
//! ## Module Structure
//!
//! ### Aggregates
//! - [`aggregates::Dag`]: the validated, topologically-ordered node graph
//!   a run walks. Built once by [`aggregates::DagBuilder`], never mutated.
//!
//! ### Value Objects
//! - [`value_objects::PolicyBag`]: order-independent per-run overrides
//! - [`value_objects::NodeResources`]: a node's CPU/GPU/rank request
//! - [`value_objects::NodeSpec`]: a node's frozen declaration
//!
//! ### Domain Services (free functions)
//! - [`hashing`]: every `hash_*` function and the `cache_key` formula that
//!   composes them. The single source of truth for reproducibility.
//!
//! ### Repositories (outbound ports)
//! - [`repositories::CacheBackend`]: content-addressed get/put/exists
//! - [`repositories::Scheduler`]: submit/wait_any/shutdown over jobs
//!
//! ### Domain Events
//! - [`events::ExecutionEvent`]: one node's completion record, the unit
//!   of a run's provenance trail
//!
//! ## Reproducibility Invariant
//!
//! Two runs with identical node specs, configs, policy, and input state
//! must produce identical cache keys (`hashing::cache_key`) and identical
//! [`aggregates::Dag::topo_order`] output, independent of node
//! construction order, dependency-map iteration order, or wall-clock
//! completion order. Every `BTreeMap` in this crate exists to uphold that.

pub mod aggregates;
pub mod cache_entry;
pub mod config;
pub mod error;
pub mod events;
pub mod hashing;
pub mod repositories;
pub mod stage;
pub mod state;
pub mod value_objects;

pub use aggregates::{Dag, DagBuilder};
pub use cache_entry::DagCacheEntry;
pub use config::StageConfig;
pub use error::EngineError;
pub use events::{ExecutionEvent, NodeOutcome};
pub use repositories::{CacheBackend, CachePayload, JobHandle, Scheduler};
pub use stage::{ArtifactValue, LazyArtifact, MetricValue, Stage, StageResult};
pub use state::{DagState, State};
pub use value_objects::{NodeResources, NodeSpec, PolicyBag};
