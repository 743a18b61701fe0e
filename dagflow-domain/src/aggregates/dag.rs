// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dag Aggregate
//!
//! `Dag` is the validated, immutable graph an executor walks. Validation
//! and topological ordering both happen once, in [`DagBuilder::build`];
//! after that the aggregate only ever answers queries (`ready roots`,
//! `dependents of X`).
//!
//! Tie-breaking among nodes with no remaining unprocessed dependencies
//! uses ascending node id, not insertion order, so the same node set
//! always produces the same topological order regardless of how callers
//! happened to list it.

use crate::error::EngineError;
use crate::state::State;
use crate::value_objects::node_spec::NodeSpec;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::cmp::Reverse;

/// Validated DAG of [`NodeSpec`]s, ready for execution.
pub struct Dag<S: State> {
    nodes_by_id: BTreeMap<String, NodeSpec<S>>,
    deps: BTreeMap<String, Vec<String>>,
    reverse_deps: BTreeMap<String, Vec<String>>,
    topo_order: Vec<String>,
}

impl<S: State> Dag<S> {
    pub fn node(&self, id: &str) -> Option<&NodeSpec<S>> {
        self.nodes_by_id.get(id)
    }

    pub fn deps_of(&self, id: &str) -> &[String] {
        self.deps.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn dependents_of(&self, id: &str) -> &[String] {
        self.reverse_deps.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// The deterministic execution order computed at build time.
    pub fn topo_order(&self) -> &[String] {
        &self.topo_order
    }

    pub fn len(&self) -> usize {
        self.nodes_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes_by_id.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &String> {
        self.nodes_by_id.keys()
    }
}

/// Builds a [`Dag`] from a flat node list, performing the same five
/// validation passes regardless of caller (CLI run, sweep expansion,
/// programmatic construction):
///
/// 1. Reject duplicate node ids.
/// 2. Record forward and reverse dependency edges.
/// 3. Reject any dependency referencing a node that does not exist.
/// 4. Compute a topological order via Kahn's algorithm, breaking ties by
///    ascending node id so the order is a pure function of the node set.
/// 5. If fewer nodes were ordered than exist, a cycle remains -- report
///    the unordered remainder.
pub struct DagBuilder;

impl DagBuilder {
    pub fn build<S: State>(nodes: Vec<NodeSpec<S>>) -> Result<Dag<S>, EngineError> {
        let mut nodes_by_id: BTreeMap<String, NodeSpec<S>> = BTreeMap::new();
        for node in nodes {
            if nodes_by_id.contains_key(&node.id) {
                return Err(EngineError::DuplicateNode(node.id.clone()));
            }
            nodes_by_id.insert(node.id.clone(), node);
        }

        let mut deps: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut reverse_deps: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (id, spec) in &nodes_by_id {
            deps.insert(id.clone(), spec.deps.clone());
            for dep in &spec.deps {
                if !nodes_by_id.contains_key(dep) {
                    return Err(EngineError::MissingDependency {
                        node: id.clone(),
                        dep: dep.clone(),
                    });
                }
                reverse_deps.entry(dep.clone()).or_default().push(id.clone());
            }
        }

        let topo_order = Self::topological_sort(&nodes_by_id, &deps)?;

        Ok(Dag { nodes_by_id, deps, reverse_deps, topo_order })
    }

    /// Kahn's algorithm: repeatedly emit the lexicographically-smallest
    /// node with zero remaining in-degree. A `BinaryHeap<Reverse<String>>`
    /// gives us a min-heap over node ids so the emission order is
    /// deterministic without re-sorting the ready set on every step.
    fn topological_sort<S: State>(
        nodes_by_id: &BTreeMap<String, NodeSpec<S>>,
        deps: &BTreeMap<String, Vec<String>>,
    ) -> Result<Vec<String>, EngineError> {
        let mut in_degree: BTreeMap<String, usize> = BTreeMap::new();
        for id in nodes_by_id.keys() {
            in_degree.insert(id.clone(), deps.get(id).map(|d| d.len()).unwrap_or(0));
        }

        let mut ready: BinaryHeap<Reverse<String>> = BinaryHeap::new();
        for (id, degree) in &in_degree {
            if *degree == 0 {
                ready.push(Reverse(id.clone()));
            }
        }

        let mut dependents: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (id, node_deps) in deps {
            for dep in node_deps {
                dependents.entry(dep.clone()).or_default().push(id.clone());
            }
        }
        for edges in dependents.values_mut() {
            edges.sort();
        }

        let mut order = Vec::with_capacity(nodes_by_id.len());

        while let Some(Reverse(next)) = ready.pop() {
            order.push(next.clone());

            if let Some(children) = dependents.get(&next) {
                for child in children {
                    let degree = in_degree.get_mut(child).unwrap();
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(child.clone()));
                    }
                }
            }
        }

        if order.len() < nodes_by_id.len() {
            let ordered: BTreeSet<&String> = order.iter().collect();
            let remaining: Vec<String> = nodes_by_id
                .keys()
                .filter(|id| !ordered.contains(id))
                .cloned()
                .collect();
            return Err(EngineError::Cycle(remaining));
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{Stage, StageResult};
    use crate::value_objects::PolicyBag;
    use std::sync::Arc;

    #[derive(Clone, serde::Serialize, serde::Deserialize)]
    struct NumState(i64);

    impl State for NumState {
        fn hashable_repr(&self) -> Vec<u8> {
            self.0.to_le_bytes().to_vec()
        }
    }

    struct Identity;
    impl Stage<NumState> for Identity {
        fn process(
            &self,
            state: &NumState,
            _policy: Option<&PolicyBag>,
        ) -> Result<StageResult<NumState>, EngineError> {
            Ok(StageResult::new(state.clone()))
        }
        fn cfg_hash(&self) -> String {
            "identity".to_string()
        }
    }

    fn node(id: &str, deps: Vec<&str>) -> NodeSpec<NumState> {
        NodeSpec::new(
            id,
            deps.into_iter().map(String::from).collect(),
            "identity",
            "v1",
            Arc::new(Identity),
        )
    }

    #[test]
    fn detects_duplicate_node_ids() {
        let nodes = vec![node("a", vec![]), node("a", vec![])];
        let err = DagBuilder::build(nodes).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateNode(id) if id == "a"));
    }

    #[test]
    fn detects_missing_dependency() {
        let nodes = vec![node("a", vec!["ghost"])];
        let err = DagBuilder::build(nodes).unwrap_err();
        assert!(matches!(err, EngineError::MissingDependency { .. }));
    }

    #[test]
    fn detects_cycle() {
        let nodes = vec![node("a", vec!["b"]), node("b", vec!["a"])];
        let err = DagBuilder::build(nodes).unwrap_err();
        assert!(matches!(err, EngineError::Cycle(_)));
    }

    #[test]
    fn topo_order_is_deterministic_and_respects_edges() {
        // diamond: a -> b, a -> c, b -> d, c -> d
        let nodes = vec![
            node("d", vec!["b", "c"]),
            node("c", vec!["a"]),
            node("b", vec!["a"]),
            node("a", vec![]),
        ];
        let dag = DagBuilder::build(nodes).unwrap();
        assert_eq!(dag.topo_order(), &["a", "b", "c", "d"]);
    }

    #[test]
    fn topo_order_breaks_ties_by_ascending_id_regardless_of_input_order() {
        let forward = vec![node("x", vec![]), node("y", vec![]), node("z", vec![])];
        let reversed = vec![node("z", vec![]), node("y", vec![]), node("x", vec![])];

        let dag_forward = DagBuilder::build(forward).unwrap();
        let dag_reversed = DagBuilder::build(reversed).unwrap();
        assert_eq!(dag_forward.topo_order(), dag_reversed.topo_order());
        assert_eq!(dag_forward.topo_order(), &["x", "y", "z"]);
    }
}
