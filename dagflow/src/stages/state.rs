// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared state payload for the demonstration stages: one scalar field,
//! enough to exercise caching, fan-in, and sweep expansion end to end
//! without pulling in a domain-specific payload shape.

use dagflow_domain::state::State;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub payload: f64,
}

impl PipelineState {
    pub fn new(payload: f64) -> Self {
        Self { payload }
    }
}

impl State for PipelineState {
    fn hashable_repr(&self) -> Vec<u8> {
        self.payload.to_le_bytes().to_vec()
    }
}
