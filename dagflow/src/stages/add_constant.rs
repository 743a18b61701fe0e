// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `add_constant` — adds a fixed amount to the incoming payload. The
//! thinnest possible demonstration stage: single dependency, no fan-in,
//! one config field.

use super::state::PipelineState;
use dagflow_domain::config::StageConfig;
use dagflow_domain::error::EngineError;
use dagflow_domain::stage::{MetricValue, Stage, StageResult};
use dagflow_domain::value_objects::PolicyBag;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct AddConstantConfig {
    pub amount: f64,
    pub tags: BTreeMap<String, String>,
}

impl AddConstantConfig {
    pub fn new(amount: f64) -> Self {
        Self { amount, tags: BTreeMap::new() }
    }
}

impl StageConfig for AddConstantConfig {
    fn name(&self) -> &str {
        "add_constant"
    }

    fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    fn canonical_json(&self) -> serde_json::Value {
        serde_json::json!({ "name": self.name(), "amount": self.amount, "tags": self.tags })
    }
}

pub struct AddConstant {
    config: AddConstantConfig,
    cfg_hash: String,
}

impl AddConstant {
    pub fn new(config: AddConstantConfig) -> Self {
        let cfg_hash = dagflow_domain::hashing::hash_config(&config);
        Self { config, cfg_hash }
    }
}

impl Stage<PipelineState> for AddConstant {
    fn process(
        &self,
        state: &PipelineState,
        _policy: Option<&PolicyBag>,
    ) -> Result<StageResult<PipelineState>, EngineError> {
        let next = PipelineState::new(state.payload + self.config.amount);
        Ok(StageResult::new(next).with_metric("amount", MetricValue::Float(self.config.amount)))
    }

    fn cfg_hash(&self) -> String {
        self.cfg_hash.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_configured_amount() {
        let stage = AddConstant::new(AddConstantConfig::new(2.0));
        let result = stage.process(&PipelineState::new(1.0), None).unwrap();
        assert_eq!(result.state.payload, 3.0);
    }
}
