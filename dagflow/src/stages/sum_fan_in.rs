// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `sum_fan_in` — demonstrates the multi-dependency fan-in path (§8 S2):
//! every dependency's payload is summed into a single input before the
//! stage runs. The summing itself happens in the [`sum_selector`]
//! `input_selector`, which the DAG executor applies to build a single
//! input state out of a node's `DagState` fan-in container; the stage
//! body is a pass-through over whatever state it receives.

use super::state::PipelineState;
use dagflow_domain::config::StageConfig;
use dagflow_domain::error::EngineError;
use dagflow_domain::stage::{Stage, StageResult};
use dagflow_domain::state::DagState;
use dagflow_domain::value_objects::node_spec::InputSelector;
use dagflow_domain::value_objects::PolicyBag;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SumFanInConfig {
    pub tags: BTreeMap<String, String>,
}

impl StageConfig for SumFanInConfig {
    fn name(&self) -> &str {
        "sum_fan_in"
    }

    fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    fn canonical_json(&self) -> serde_json::Value {
        serde_json::json!({ "name": self.name() })
    }
}

pub struct SumFanIn {
    cfg_hash: String,
}

impl SumFanIn {
    pub fn new() -> Self {
        Self { cfg_hash: dagflow_domain::hashing::hash_config(&SumFanInConfig::default()) }
    }
}

impl Default for SumFanIn {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage<PipelineState> for SumFanIn {
    fn process(
        &self,
        state: &PipelineState,
        _policy: Option<&PolicyBag>,
    ) -> Result<StageResult<PipelineState>, EngineError> {
        Ok(StageResult::new(*state))
    }

    fn cfg_hash(&self) -> String {
        self.cfg_hash.clone()
    }
}

/// The `input_selector` every `sum_fan_in` node must be built with: sums
/// every dependency's payload, in dependency-id order (`DagState` is a
/// `BTreeMap`, so the sum is independent of completion order).
pub fn sum_selector() -> InputSelector<PipelineState> {
    Arc::new(|fan_in: &DagState<PipelineState>| {
        let total: f64 = fan_in.values().map(|s| s.payload).sum();
        PipelineState::new(total)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_every_dependency_payload() {
        let mut fan_in: DagState<PipelineState> = DagState::new();
        fan_in.insert("b".to_string(), PipelineState::new(2.0));
        fan_in.insert("c".to_string(), PipelineState::new(3.0));

        let selector = sum_selector();
        let combined = selector(&fan_in);
        assert_eq!(combined.payload, 5.0);
    }
}
