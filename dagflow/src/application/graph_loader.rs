// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Graph Loader
//!
//! Reads a graph file (`dagflow run path/to/graph.toml`) into the node
//! list a [`dagflow_domain::aggregates::DagBuilder`] validates. Each
//! node's `op` names a [`crate::stages::StageRegistry`] entry; the
//! registry turns that node's `params` table into a constructed stage
//! and, where the op requires one, its default `input_selector`.
//!
//! ```toml
//! [run]
//! initial_payload = 0.0
//!
//! [[nodes]]
//! id = "a"
//! op = "add_constant"
//! deps = []
//! [nodes.params]
//! amount = 1.0
//!
//! [[nodes]]
//! id = "b"
//! op = "scale"
//! deps = ["a"]
//! [nodes.params]
//! factor = 2.0
//! ```

use crate::stages::{PipelineState, StageRegistry};
use dagflow_domain::error::EngineError;
use dagflow_domain::value_objects::{NodeResources, NodeSpec};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct GraphFile {
    run: RunSection,
    #[serde(rename = "nodes", default)]
    nodes: Vec<NodeFile>,
}

#[derive(Debug, Deserialize)]
struct RunSection {
    initial_payload: f64,
}

#[derive(Debug, Deserialize)]
struct NodeFile {
    id: String,
    op: String,
    #[serde(default)]
    deps: Vec<String>,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default = "default_params")]
    params: toml::Value,
    resources: Option<ResourcesFile>,
}

fn default_version() -> String {
    "v1".to_string()
}

fn default_params() -> toml::Value {
    toml::Value::Table(toml::map::Map::new())
}

#[derive(Debug, Deserialize)]
struct ResourcesFile {
    #[serde(default = "default_cpu")]
    cpu: u32,
    #[serde(default)]
    gpu: u32,
    #[serde(default = "default_mpi_ranks")]
    mpi_ranks: u32,
}

fn default_cpu() -> u32 {
    1
}

fn default_mpi_ranks() -> u32 {
    1
}

pub struct GraphLoader;

impl GraphLoader {
    /// Parses a graph file into its initial state and a validated node
    /// list, failing with `EngineError::InvalidConfiguration` on a
    /// malformed file, an unrecognized `op`, or params that op's
    /// registered builder rejects.
    pub fn load(path: &Path) -> Result<(PipelineState, Vec<NodeSpec<PipelineState>>), EngineError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::invalid_config(format!("failed to read graph file {path:?}: {e}")))?;
        Self::parse(&raw)
    }

    /// Parses an in-memory graph document, the same format [`Self::load`]
    /// reads from disk. Exposed for callers (and tests) that already hold
    /// the TOML text rather than a path.
    pub fn parse(raw: &str) -> Result<(PipelineState, Vec<NodeSpec<PipelineState>>), EngineError> {
        let graph: GraphFile =
            toml::from_str(raw).map_err(|e| EngineError::invalid_config(format!("invalid graph file: {e}")))?;

        let mut nodes = Vec::with_capacity(graph.nodes.len());
        for node in graph.nodes {
            let builder = StageRegistry::builder(&node.op)
                .ok_or_else(|| EngineError::invalid_config(format!("node '{}' has unknown op '{}'", node.id, node.op)))?;
            let stage = builder(&node.params)?;

            let resources = node
                .resources
                .map(|r| NodeResources::new(r.cpu, r.gpu, r.mpi_ranks))
                .unwrap_or_default();

            let mut spec = NodeSpec::new(node.id, node.deps, node.op.clone(), node.version, stage)
                .with_resources(resources);
            if let Some(selector) = StageRegistry::default_selector(&node.op) {
                spec = spec.with_input_selector(selector);
            }
            nodes.push(spec);
        }

        Ok((PipelineState::new(graph.run.initial_payload), nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_linear_chain() {
        let raw = r#"
            [run]
            initial_payload = 10.0

            [[nodes]]
            id = "a"
            op = "add_constant"
            deps = []
            [nodes.params]
            amount = 1.0

            [[nodes]]
            id = "b"
            op = "scale"
            deps = ["a"]
            [nodes.params]
            factor = 2.0
        "#;

        let (initial, nodes) = GraphLoader::parse(raw).unwrap();
        assert_eq!(initial.payload, 10.0);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].deps, vec!["a".to_string()]);
    }

    #[test]
    fn sum_fan_in_node_gets_a_default_selector() {
        let raw = r#"
            [run]
            initial_payload = 0.0

            [[nodes]]
            id = "a"
            op = "add_constant"
            deps = []
            [nodes.params]
            amount = 1.0

            [[nodes]]
            id = "b"
            op = "add_constant"
            deps = []
            [nodes.params]
            amount = 2.0

            [[nodes]]
            id = "c"
            op = "sum_fan_in"
            deps = ["a", "b"]
        "#;

        let (_, nodes) = GraphLoader::parse(raw).unwrap();
        let fan_in = nodes.iter().find(|n| n.id == "c").unwrap();
        assert!(fan_in.input_selector.is_some());
    }

    #[test]
    fn unknown_op_is_rejected() {
        let raw = r#"
            [run]
            initial_payload = 0.0

            [[nodes]]
            id = "a"
            op = "does_not_exist"
            deps = []
        "#;

        let err = GraphLoader::parse(raw).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }
}
