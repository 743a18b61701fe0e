// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Sweep Expander
//!
//! Replaces one node in a graph with the Cartesian product of a parameter
//! grid, each combination getting its own id, its own freshly-constructed
//! stage, and the override dict recorded under `metadata["sweep"]` so the
//! cache key and provenance trail can tell swept variants apart.
//!
//! Nodes that depend on the swept node by id are *not* rewired -- per the
//! data model, wiring a fan-out consumer to every sweep point is the
//! caller's responsibility.

use dagflow_domain::error::EngineError;
use dagflow_domain::stage::Stage;
use dagflow_domain::state::State;
use dagflow_domain::value_objects::NodeSpec;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a stage instance from an override dict; the swept equivalent of
/// constructing a fresh `Stage` from a cloned, field-overridden config.
pub type StageFactory<S> = Arc<dyn Fn(&BTreeMap<String, serde_json::Value>) -> Arc<dyn Stage<S>> + Send + Sync>;

/// Declares which node to sweep and over what grid.
pub struct SweepSpec<S: State> {
    pub node_id: String,
    pub param_grid: BTreeMap<String, Vec<serde_json::Value>>,
    pub factory: StageFactory<S>,
}

pub struct SweepExpander;

impl SweepExpander {
    /// Expands `base_nodes` by replacing the node named in `sweep` with
    /// one node per grid combination. All other nodes pass through
    /// unchanged. Errors if the named node does not exist or the grid is
    /// empty.
    pub fn expand<S: State>(
        base_nodes: Vec<NodeSpec<S>>,
        sweep: &SweepSpec<S>,
    ) -> Result<Vec<NodeSpec<S>>, EngineError> {
        if sweep.param_grid.is_empty() {
            return Err(EngineError::invalid_config(format!(
                "sweep for node '{}' has an empty param grid",
                sweep.node_id
            )));
        }

        let mut expanded = Vec::with_capacity(base_nodes.len());
        let mut found = false;

        for node in base_nodes {
            if node.id != sweep.node_id {
                expanded.push(node);
                continue;
            }
            found = true;

            for combo in cartesian_product(&sweep.param_grid) {
                let suffix = combo
                    .iter()
                    .map(|(k, v)| format!("{k}-{}", value_label(v)))
                    .collect::<Vec<_>>()
                    .join("_");
                let id = format!("{}__{}", node.id, suffix);

                let stage = (sweep.factory)(&combo);
                let mut metadata = node.metadata.clone();
                let sweep_obj: serde_json::Map<String, serde_json::Value> = combo.into_iter().collect();
                metadata.insert("sweep".to_string(), serde_json::Value::Object(sweep_obj));

                let mut spec = NodeSpec::new(id, node.deps.clone(), node.op_name.clone(), node.version.clone(), stage)
                    .with_resources(node.resources);
                spec.metadata = metadata;
                if let Some(selector) = &node.input_selector {
                    spec = spec.with_input_selector(selector.clone());
                }
                expanded.push(spec);
            }
        }

        if !found {
            return Err(EngineError::invalid_config(format!("sweep target node '{}' not found", sweep.node_id)));
        }

        Ok(expanded)
    }
}

/// Grid keys are iterated in sorted order (the map is a `BTreeMap`) so the
/// generated id suffix is a pure function of the grid's contents, not of
/// however the caller happened to build it.
fn cartesian_product(
    grid: &BTreeMap<String, Vec<serde_json::Value>>,
) -> Vec<BTreeMap<String, serde_json::Value>> {
    let mut combos: Vec<BTreeMap<String, serde_json::Value>> = vec![BTreeMap::new()];
    for (key, values) in grid {
        let mut next = Vec::with_capacity(combos.len() * values.len());
        for combo in &combos {
            for value in values {
                let mut extended = combo.clone();
                extended.insert(key.clone(), value.clone());
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

fn value_label(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagflow_domain::config::StageConfig;
    use dagflow_domain::value_objects::policy_bag::PolicyBag;
    use dagflow_domain::stage::StageResult;

    #[derive(Clone, serde::Serialize, serde::Deserialize)]
    struct NumState(f64);

    impl State for NumState {
        fn hashable_repr(&self) -> Vec<u8> {
            self.0.to_le_bytes().to_vec()
        }
    }

    struct ScaleConfig {
        factor: f64,
    }
    impl StageConfig for ScaleConfig {
        fn name(&self) -> &str {
            "scale"
        }
        fn tags(&self) -> &BTreeMap<String, String> {
            static EMPTY: BTreeMap<String, String> = BTreeMap::new();
            &EMPTY
        }
        fn canonical_json(&self) -> serde_json::Value {
            serde_json::json!({ "factor": self.factor })
        }
    }

    struct Scale(ScaleConfig);
    impl Stage<NumState> for Scale {
        fn process(&self, state: &NumState, _policy: Option<&PolicyBag>) -> Result<StageResult<NumState>, EngineError> {
            Ok(StageResult::new(NumState(state.0 * self.0.factor)))
        }
        fn cfg_hash(&self) -> String {
            format!("scale:{}", self.0.factor)
        }
    }

    fn scale_factory() -> StageFactory<NumState> {
        Arc::new(|overrides| {
            let factor = overrides.get("scale").and_then(|v| v.as_f64()).unwrap_or(1.0);
            Arc::new(Scale(ScaleConfig { factor }))
        })
    }

    #[test]
    fn expands_into_one_node_per_grid_value() {
        let base = vec![NodeSpec::new("scale", vec![], "scale", "v1", Arc::new(Scale(ScaleConfig { factor: 1.0 })))];
        let mut grid = BTreeMap::new();
        grid.insert("scale".to_string(), vec![serde_json::json!(1.0), serde_json::json!(2.0)]);
        let sweep = SweepSpec { node_id: "scale".to_string(), param_grid: grid, factory: scale_factory() };

        let expanded = SweepExpander::expand(base, &sweep).unwrap();
        let ids: Vec<&str> = expanded.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["scale__scale-1.0", "scale__scale-2.0"]);

        for node in &expanded {
            assert!(node.metadata.get("sweep").is_some());
        }
    }

    #[test]
    fn errors_when_target_node_missing() {
        let base: Vec<NodeSpec<NumState>> = vec![];
        let mut grid = BTreeMap::new();
        grid.insert("scale".to_string(), vec![serde_json::json!(1.0)]);
        let sweep = SweepSpec { node_id: "missing".to_string(), param_grid: grid, factory: scale_factory() };

        let err = SweepExpander::expand(base, &sweep).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }
}
