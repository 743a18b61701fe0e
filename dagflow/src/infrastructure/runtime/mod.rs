// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Runtime adapters: the concrete [`crate::infrastructure::runtime::scheduler::LocalScheduler`]
//! implementing `dagflow_domain::Scheduler` over an in-process CPU/GPU
//! token pool.

pub mod scheduler;

pub use scheduler::LocalScheduler;
