// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `Dag` aggregate: the validated, topologically-ordered graph of
//! nodes an executor runs.

pub mod dag;

pub use dag::{Dag, DagBuilder};
