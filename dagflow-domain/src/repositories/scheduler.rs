// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Scheduler Port
//!
//! The executor submits stage jobs through this port and waits for
//! whichever finishes first. A concrete `Scheduler` owns resource
//! admission (CPU/GPU token limits), retries, and timeouts; the domain
//! only needs the submit/wait/shutdown shape.

use crate::error::EngineError;
use async_trait::async_trait;

/// Handle identifying one submitted job. `attempt` counts retries of the
/// same logical submission so a `SchedulerRetry` error can report how
/// many times a node was tried before giving up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub node_id: String,
    pub job_id: u64,
    pub attempt: u32,
}

/// Submits blocking work and reports completions one at a time, in
/// arrival order, via `wait_any`.
#[async_trait]
pub trait Scheduler<Out: Send + 'static>: Send + Sync {
    /// Submits `work` for execution under the given resource request,
    /// returning a handle immediately without waiting for completion.
    async fn submit(
        &self,
        node_id: String,
        resources: crate::value_objects::NodeResources,
        work: Box<dyn FnOnce() -> Result<Out, EngineError> + Send>,
    ) -> Result<JobHandle, EngineError>;

    /// Blocks until at least one outstanding job completes, returning its
    /// handle and result. Returns `Err` if no jobs are outstanding.
    async fn wait_any(&self) -> Result<(JobHandle, Result<Out, EngineError>), EngineError>;

    /// Releases any outstanding jobs and their resources. Called once the
    /// executor has no further work to dispatch.
    async fn shutdown(&self);
}
