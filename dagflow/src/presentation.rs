// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Presentation
//!
//! Wires a validated CLI command to the application layer: loads config,
//! builds the cache/scheduler/metrics adapters, then dispatches to
//! `Run`/`Sweep`/`Validate`. This is the only module that touches both
//! `dagflow_bootstrap` and the application layer, matching where the
//! teacher's `main.rs` used to do the same wiring inline.

use crate::application::{DagExecutor, ExecutorSettings, GraphLoader, SweepExpander};
use crate::infrastructure::cache::{DagCache, DiskCacheBackend, MemoryCacheBackend};
use crate::infrastructure::config::{ConfigService, ExecutorConfig};
use crate::infrastructure::metrics::{MetricsEndpoint, MetricsService};
use crate::infrastructure::runtime::LocalScheduler;
use crate::stages::{PipelineState, StageRegistry};
use dagflow_bootstrap::{ValidatedCli, ValidatedCommand};
use dagflow_domain::aggregates::DagBuilder;
use dagflow_domain::error::EngineError;
use dagflow_domain::events::ExecutionEvent;
use dagflow_domain::stage::{MetricValue, StageResult};
use dagflow_domain::value_objects::NodeSpec;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Runs the command a validated CLI invocation names, returning once the
/// underlying graph run (or validation) has completed.
pub async fn run_command(cli: ValidatedCli) -> Result<(), EngineError> {
    let config = ConfigService::load(cli.config.as_deref())?;
    let config = apply_cli_overrides(config, &cli);

    match cli.command {
        ValidatedCommand::Validate { graph } => validate(&graph),
        ValidatedCommand::Run { graph, cache_dir, no_cache } => {
            let (initial_state, nodes) = GraphLoader::load(&graph)?;
            run_nodes(initial_state, nodes, &config, cache_dir, no_cache).await
        }
        ValidatedCommand::Sweep { graph, node, grid, cache_dir } => {
            let (initial_state, nodes) = GraphLoader::load(&graph)?;
            let expanded = expand_sweep(nodes, &node, &grid)?;
            run_nodes(initial_state, expanded, &config, cache_dir, false).await
        }
    }
}

fn apply_cli_overrides(mut config: ExecutorConfig, cli: &ValidatedCli) -> ExecutorConfig {
    if let Some(max_cpu) = cli.max_cpu {
        config.max_cpu = max_cpu;
    }
    if let Some(max_gpu) = cli.max_gpu {
        config.max_gpu = max_gpu;
    }
    config
}

fn validate(graph: &std::path::Path) -> Result<(), EngineError> {
    let (_, nodes) = GraphLoader::load(graph)?;
    let node_count = nodes.len();
    let dag = DagBuilder::build(nodes)?;
    info!(node_count, "graph is valid");
    println!("graph valid: {node_count} node(s)");
    println!("topological order: {}", dag.topo_order().join(", "));
    Ok(())
}

/// Turns a sweep's `key=v1,v2,v3` grid entries into a `param_grid` and a
/// factory that builds a node's existing op through `StageRegistry`,
/// overriding only the params the grid names.
fn expand_sweep(
    nodes: Vec<NodeSpec<PipelineState>>,
    node_id: &str,
    grid: &[(String, String)],
) -> Result<Vec<NodeSpec<PipelineState>>, EngineError> {
    let target = nodes
        .iter()
        .find(|n| n.id == node_id)
        .ok_or_else(|| EngineError::invalid_config(format!("sweep target node '{node_id}' not found")))?;
    let op_name = target.op_name.clone();

    let mut param_grid = BTreeMap::new();
    for (key, values) in grid {
        let parsed: Vec<serde_json::Value> = values
            .split(',')
            .map(|v| v.parse::<f64>().map(|n| serde_json::json!(n)).unwrap_or_else(|_| serde_json::json!(v)))
            .collect();
        param_grid.insert(key.clone(), parsed);
    }

    let factory_op = op_name.clone();
    let factory: crate::application::sweep::StageFactory<PipelineState> =
        Arc::new(move |overrides: &BTreeMap<String, serde_json::Value>| {
            let params = toml::Value::try_from(overrides).unwrap_or(toml::Value::Table(toml::map::Map::new()));
            let builder = StageRegistry::builder(&factory_op).expect("sweep target op is registered");
            builder(&params).expect("sweep override params accepted by the node's op")
        });

    let sweep = crate::application::sweep::SweepSpec { node_id: node_id.to_string(), param_grid, factory };
    SweepExpander::expand(nodes, &sweep)
}

async fn run_nodes(
    initial_state: PipelineState,
    nodes: Vec<NodeSpec<PipelineState>>,
    config: &ExecutorConfig,
    cache_dir_override: Option<std::path::PathBuf>,
    no_cache: bool,
) -> Result<(), EngineError> {
    let dag = Arc::new(DagBuilder::build(nodes)?);

    let cache_backend: Arc<dyn dagflow_domain::repositories::CacheBackend> = if no_cache {
        Arc::new(MemoryCacheBackend::new())
    } else {
        let root = cache_dir_override.unwrap_or_else(|| config.cache_dir.clone());
        Arc::new(DiskCacheBackend::new(root))
    };
    let cache = Arc::new(DagCache::new(cache_backend));

    let scheduler = Arc::new(LocalScheduler::<StageResult<PipelineState>>::new(config.max_cpu, config.max_gpu));

    let metrics = Arc::new(MetricsService::new()?);
    if config.metrics.enabled {
        let endpoint = MetricsEndpoint::new(metrics.clone());
        let port = config.metrics.port;
        tokio::spawn(async move {
            if let Err(err) = endpoint.start(port).await {
                tracing::error!("metrics endpoint stopped: {err}");
            }
        });
    }

    let settings = ExecutorSettings {
        retry_limit: config.retry_limit,
        node_timeout: std::time::Duration::from_secs(config.node_timeout_secs),
    };

    let executor = DagExecutor::new(dag, scheduler, cache, settings).with_metrics(metrics);
    let accumulator = executor.run(&initial_state, None).await?;

    print_report(&accumulator);
    Ok(())
}

fn print_report(accumulator: &crate::application::Accumulator) {
    let metrics_json: BTreeMap<&String, BTreeMap<&String, serde_json::Value>> = accumulator
        .metrics()
        .iter()
        .map(|(node, node_metrics)| (node, node_metrics.iter().map(|(k, v)| (k, metric_to_json(v))).collect()))
        .collect();

    let order: Vec<&ExecutionEvent> = accumulator.execution_order().iter().collect();

    let report = serde_json::json!({
        "execution_order": order,
        "metrics": metrics_json,
        "artifacts": accumulator.artifacts(),
        "provenance": accumulator.provenance(),
    });

    println!("{}", serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string()));
}

fn metric_to_json(value: &MetricValue) -> serde_json::Value {
    match value {
        MetricValue::Int(n) => serde_json::json!(n),
        MetricValue::Float(n) => serde_json::json!(n),
        MetricValue::Bool(b) => serde_json::json!(b),
        MetricValue::Str(s) => serde_json::json!(s),
    }
}
