// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain events recording what happened during a run, for provenance
//! and replay -- distinct from [`crate::stage::StageResult`] metrics,
//! which are per-node outputs rather than a run-wide execution log.

pub mod execution_event;

pub use execution_event::{ExecutionEvent, NodeOutcome};
