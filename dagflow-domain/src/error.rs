// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Error Taxonomy
//!
//! Structured failure categories for the DAG execution engine. Every variant
//! names a specific failure mode raised by a specific component (the DAG
//! builder, the executor's dispatch phase, the accumulator, or the
//! scheduler) rather than a generic catch-all, so callers can match on the
//! kind of failure instead of parsing a message string.
//!
//! Recovery happens only at the retry boundary inside the executor's wait
//! phase (`SchedulerRetry` exhaustion); every other variant is fatal to the
//! run and unwinds through `DagExecutor::run`.

use thiserror::Error;

/// Errors raised anywhere in the DAG execution engine.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("node '{node}' depends on missing node '{dep}'")]
    MissingDependency { node: String, dep: String },

    #[error("dependency cycle detected among nodes: {0:?}")]
    Cycle(Vec<String>),

    #[error("node '{0}' has multiple dependencies but no input_selector was declared")]
    DagInput(String),

    #[error("stage contract violation: {0}")]
    StageContract(String),

    #[error("scheduler error: {0}")]
    SchedulerError(String),

    #[error("scheduler timeout: {0}")]
    SchedulerTimeout(String),

    #[error("node '{node_id}' exhausted retries: {source_message}")]
    SchedulerRetry { node_id: String, source_message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a caller could plausibly retry the operation that produced
    /// this error. Used by the executor's retry boundary, not by callers
    /// reaching further up the stack -- every variant here is otherwise
    /// fatal to the run per the propagation policy.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::SchedulerTimeout(_) | EngineError::Io(_))
    }

    /// Coarse category, useful for metrics labeling without matching on
    /// every variant at every call site.
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::DuplicateNode(_) => "dag_build",
            EngineError::MissingDependency { .. } => "dag_build",
            EngineError::Cycle(_) => "dag_build",
            EngineError::DagInput(_) => "dispatch",
            EngineError::StageContract(_) => "accumulator",
            EngineError::SchedulerError(_) => "scheduler",
            EngineError::SchedulerTimeout(_) => "scheduler",
            EngineError::SchedulerRetry { .. } => "scheduler",
            EngineError::InvalidConfiguration(_) => "configuration",
            EngineError::Io(_) => "io",
            EngineError::Serialization(_) => "serialization",
            EngineError::Internal(_) => "internal",
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}
