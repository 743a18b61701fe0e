// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # dagflow
//!
//! A reproducible compute-pipeline runtime: executes a user-supplied DAG
//! of stages over a mutable application state, caches stage outputs by a
//! content-addressed key, enforces resource limits while running nodes
//! concurrently, and emits the provenance needed to replay or compare
//! runs exactly.
//!
//! Split into three layers:
//!
//! - **application** — [`application::DagExecutor`], the ready-queue
//!   dispatch loop; [`application::GraphLoader`], which turns a graph
//!   file into node specs; [`application::SweepExpander`], which turns
//!   one node into a parameter sweep.
//! - **infrastructure** — cache backends, the in-process scheduler,
//!   config loading, logging, and metrics, all adapting
//!   `dagflow_domain`'s outbound ports.
//! - **stages** — the demonstration stage registry this binary ships
//!   with (`add_constant`, `scale`, `sum_fan_in`).
//!
//! The DAG/state/hashing/error model itself lives in `dagflow_domain`,
//! kept dependency-free of any particular stage implementation.

pub mod application;
pub mod infrastructure;
pub mod presentation;
pub mod stages;

pub use application::{Accumulator, DagExecutor, ExecutorSettings, GraphLoader, SweepExpander};
