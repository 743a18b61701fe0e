// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Node Resources
//!
//! Declares what a node needs before the scheduler will admit it. The
//! executor checks these against the configured pool sizes and blocks
//! dispatch until tokens are available.

/// Resource request a node's job makes to the scheduler's admission
/// control. Defaults to one CPU slot, no GPU, a single rank -- the
/// common case of a lightweight in-process stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeResources {
    pub cpu: u32,
    pub gpu: u32,
    pub mpi_ranks: u32,
}

impl Default for NodeResources {
    fn default() -> Self {
        Self { cpu: 1, gpu: 0, mpi_ranks: 1 }
    }
}

impl NodeResources {
    pub fn new(cpu: u32, gpu: u32, mpi_ranks: u32) -> Self {
        Self { cpu, gpu, mpi_ranks }
    }

    pub fn cpu_only(cpu: u32) -> Self {
        Self { cpu, gpu: 0, mpi_ranks: 1 }
    }
}
