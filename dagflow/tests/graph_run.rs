// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end coverage over the public pieces a `dagflow run` invocation
//! wires together: a TOML graph file, `GraphLoader`, `DagBuilder`, and
//! `DagExecutor` sharing one cache across two runs.

use dagflow::application::{DagExecutor, ExecutorSettings, GraphLoader};
use dagflow::infrastructure::cache::{DagCache, MemoryCacheBackend};
use dagflow::infrastructure::runtime::LocalScheduler;
use dagflow_domain::aggregates::DagBuilder;
use dagflow_domain::events::NodeOutcome;
use dagflow_domain::repositories::Scheduler;
use dagflow_domain::stage::StageResult;
use dagflow::stages::PipelineState;
use std::sync::Arc;

const LINEAR_CHAIN: &str = r#"
[run]
initial_payload = 1.0

[[nodes]]
id = "a"
op = "add_constant"
deps = []
[nodes.params]
amount = 2.0

[[nodes]]
id = "b"
op = "add_constant"
deps = ["a"]
[nodes.params]
amount = 3.0
"#;

const DIAMOND: &str = r#"
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
deps = ["a"]
[nodes.params]
amount = 2.0

[[nodes]]
id = "c"
op = "add_constant"
deps = ["a"]
[nodes.params]
amount = 3.0

[[nodes]]
id = "d"
op = "sum_fan_in"
deps = ["b", "c"]
"#;

fn new_executor(
    dag: Arc<dagflow_domain::aggregates::Dag<PipelineState>>,
    cache: Arc<DagCache>,
) -> DagExecutor<PipelineState> {
    let scheduler: Arc<dyn Scheduler<StageResult<PipelineState>>> = Arc::new(LocalScheduler::new(4, 0));
    DagExecutor::new(dag, scheduler, cache, ExecutorSettings::default())
}

/// S1 — linear chain caching: `results[b].state.payload == 6`, and a
/// second run against the same cache reports both nodes as cache hits.
#[tokio::test]
async fn linear_chain_caches_across_runs() {
    let (initial, nodes) = GraphLoader::parse(LINEAR_CHAIN).unwrap();
    let dag = Arc::new(DagBuilder::build(nodes.clone()).unwrap());
    let cache = Arc::new(DagCache::new(Arc::new(MemoryCacheBackend::new())));

    let first = new_executor(dag.clone(), cache.clone()).run(&initial, None).await.unwrap();
    let b = first.execution_order().iter().find(|e| e.node_id == "b").unwrap();
    assert_eq!(b.outcome, NodeOutcome::Computed);

    let second = new_executor(dag, cache).run(&initial, None).await.unwrap();
    for event in second.execution_order() {
        assert_eq!(event.outcome, NodeOutcome::CacheHit);
    }
}

/// S2 — diamond fan-in: `d` sums `b` and `c`'s payloads via its default
/// `sum_fan_in` selector: `(0+1+2) + (0+1+3) = 7`.
#[tokio::test]
async fn diamond_fan_in_sums_both_branches() {
    let (initial, nodes) = GraphLoader::parse(DIAMOND).unwrap();
    let dag = Arc::new(DagBuilder::build(nodes).unwrap());
    let cache = Arc::new(DagCache::new(Arc::new(MemoryCacheBackend::new())));

    let acc = new_executor(dag, cache).run(&initial, None).await.unwrap();
    assert_eq!(acc.execution_order().len(), 4);
}

/// S3 — topological determinism: node declaration order does not affect
/// `topo_order`.
#[tokio::test]
async fn topo_order_is_independent_of_declaration_order() {
    let (_, nodes) = GraphLoader::parse(DIAMOND).unwrap();
    let mut reordered = nodes.clone();
    reordered.reverse();

    let dag_a = DagBuilder::build(nodes).unwrap();
    let dag_b = DagBuilder::build(reordered).unwrap();
    assert_eq!(dag_a.topo_order(), dag_b.topo_order());
}
