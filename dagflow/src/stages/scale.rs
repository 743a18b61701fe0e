// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `scale` — multiplies the incoming payload by a fixed factor. Used as
//! the sweep-expansion demonstration node (§8 S5): one `scale` node
//! expands into one node per grid value via `SweepExpander`.

use super::state::PipelineState;
use dagflow_domain::config::StageConfig;
use dagflow_domain::error::EngineError;
use dagflow_domain::stage::{MetricValue, Stage, StageResult};
use dagflow_domain::value_objects::PolicyBag;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct ScaleConfig {
    pub factor: f64,
    pub tags: BTreeMap<String, String>,
}

impl ScaleConfig {
    pub fn new(factor: f64) -> Self {
        Self { factor, tags: BTreeMap::new() }
    }
}

impl StageConfig for ScaleConfig {
    fn name(&self) -> &str {
        "scale"
    }

    fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    fn canonical_json(&self) -> serde_json::Value {
        serde_json::json!({ "name": self.name(), "factor": self.factor, "tags": self.tags })
    }
}

pub struct Scale {
    config: ScaleConfig,
    cfg_hash: String,
}

impl Scale {
    pub fn new(config: ScaleConfig) -> Self {
        let cfg_hash = dagflow_domain::hashing::hash_config(&config);
        Self { config, cfg_hash }
    }
}

impl Stage<PipelineState> for Scale {
    fn process(
        &self,
        state: &PipelineState,
        _policy: Option<&PolicyBag>,
    ) -> Result<StageResult<PipelineState>, EngineError> {
        let next = PipelineState::new(state.payload * self.config.factor);
        Ok(StageResult::new(next).with_metric("factor", MetricValue::Float(self.config.factor)))
    }

    fn cfg_hash(&self) -> String {
        self.cfg_hash.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplies_by_configured_factor() {
        let stage = Scale::new(ScaleConfig::new(2.0));
        let result = stage.process(&PipelineState::new(3.0), None).unwrap();
        assert_eq!(result.state.payload, 6.0);
    }
}
