// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Maps a graph file's `op_name` string to a stage constructor, so the
//! TOML loader never needs a `match` over stage names of its own.

use super::add_constant::{AddConstant, AddConstantConfig};
use super::scale::{Scale, ScaleConfig};
use super::state::PipelineState;
use super::sum_fan_in::{sum_selector, SumFanIn};
use dagflow_domain::error::EngineError;
use dagflow_domain::stage::Stage;
use dagflow_domain::value_objects::node_spec::InputSelector;
use std::sync::Arc;

/// Builds a registered stage from the `params` table a graph node
/// declares alongside its `op_name`.
pub type StageBuilder = Arc<dyn Fn(&toml::Value) -> Result<Arc<dyn Stage<PipelineState>>, EngineError> + Send + Sync>;

pub struct StageRegistry;

impl StageRegistry {
    /// Looks up the constructor for a node's declared `op_name`. Returns
    /// `None` for an op the registry does not recognize; the caller turns
    /// that into an `EngineError::invalid_config`.
    pub fn builder(op_name: &str) -> Option<StageBuilder> {
        match op_name {
            "add_constant" => Some(Arc::new(|params: &toml::Value| {
                let amount = params
                    .get("amount")
                    .and_then(toml::Value::as_float)
                    .ok_or_else(|| EngineError::invalid_config("add_constant requires a numeric 'amount'"))?;
                Ok(Arc::new(AddConstant::new(AddConstantConfig::new(amount))) as Arc<dyn Stage<PipelineState>>)
            })),
            "scale" => Some(Arc::new(|params: &toml::Value| {
                let factor = params
                    .get("factor")
                    .and_then(toml::Value::as_float)
                    .ok_or_else(|| EngineError::invalid_config("scale requires a numeric 'factor'"))?;
                Ok(Arc::new(Scale::new(ScaleConfig::new(factor))) as Arc<dyn Stage<PipelineState>>)
            })),
            "sum_fan_in" => Some(Arc::new(|_params: &toml::Value| {
                Ok(Arc::new(SumFanIn::new()) as Arc<dyn Stage<PipelineState>>)
            })),
            _ => None,
        }
    }

    /// The `input_selector` an op requires to be wired onto its node, if
    /// any. Only `sum_fan_in` needs one; every other demonstration op is
    /// single-dependency and uses the executor's default input resolution.
    pub fn default_selector(op_name: &str) -> Option<InputSelector<PipelineState>> {
        match op_name {
            "sum_fan_in" => Some(sum_selector()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_add_constant_from_params() {
        let params = toml::Value::try_from(std::collections::BTreeMap::from([("amount", 5.0)])).unwrap();
        let builder = StageRegistry::builder("add_constant").expect("registered op");
        let stage = builder(&params).expect("valid params");
        let result = stage.process(&PipelineState::new(1.0), None).unwrap();
        assert_eq!(result.state.payload, 6.0);
    }

    #[test]
    fn unknown_op_returns_none() {
        assert!(StageRegistry::builder("does_not_exist").is_none());
    }

    #[test]
    fn sum_fan_in_carries_a_default_selector() {
        assert!(StageRegistry::default_selector("sum_fan_in").is_some());
        assert!(StageRegistry::default_selector("scale").is_none());
    }
}
