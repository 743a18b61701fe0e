// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dag Executor
//!
//! Walks a [`Dag`], dispatching every node whose dependencies have all
//! completed and draining completions with `wait_any` -- a ready-queue
//! over an arbitrary graph rather than a fixed stage sequence. Cache hits
//! complete inline, without ever touching the scheduler.
//!
//! Fan-in follows variant B: a node with more than one dependency and no
//! `input_selector` is a dispatch-time contract violation reported as
//! [`EngineError::DagInput`] (caught here, not in `DagBuilder`, since it
//! depends only on the already-validated dependency count).

use crate::application::accumulator::Accumulator;
use crate::infrastructure::cache::dag_cache::DagCache;
use crate::infrastructure::metrics::MetricsService;
use dagflow_domain::aggregates::Dag;
use dagflow_domain::cache_entry::DagCacheEntry;
use dagflow_domain::error::EngineError;
use dagflow_domain::events::NodeOutcome;
use dagflow_domain::hashing;
use dagflow_domain::repositories::Scheduler;
use dagflow_domain::stage::StageResult;
use dagflow_domain::state::{DagState, State};
use dagflow_domain::value_objects::PolicyBag;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Runtime knobs the executor needs beyond the `Dag` itself.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub retry_limit: u32,
    pub node_timeout: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self { retry_limit: 2, node_timeout: Duration::from_secs(3600) }
    }
}

/// Everything known about a node at dispatch time, needed to fill in its
/// provenance record once it completes (the fields a run must be able to
/// replay: cfg/policy/version/input hashes, the cache key they produced,
/// and the dependency hashes that fed it).
struct ProvenanceSeed {
    cfg_hash: String,
    policy_hash: Option<String>,
    version: String,
    deps: Vec<String>,
    input_state_hash: String,
    dependency_hashes: BTreeMap<String, String>,
    dispatched_at: Instant,
}

struct InFlight {
    node_id: String,
    attempt: u32,
    deadline: Instant,
    cache_key: String,
    seed: ProvenanceSeed,
}

/// Mutable bookkeeping threaded through one `run()` call. Kept as a
/// struct rather than loose locals so the dispatch and completion paths
/// (scheduled job vs. inline cache hit) can share one update routine.
struct RunState<S: State> {
    in_degree: BTreeMap<String, usize>,
    outputs: BTreeMap<String, S>,
    dep_result_hashes: BTreeMap<String, BTreeMap<String, String>>,
    pending: BTreeMap<u64, InFlight>,
    ready: Vec<String>,
    remaining: usize,
    accumulator: Accumulator,
}

/// Coordinates one run of a [`Dag`] against a scheduler and cache.
pub struct DagExecutor<S: State> {
    dag: Arc<Dag<S>>,
    scheduler: Arc<dyn Scheduler<StageResult<S>>>,
    cache: Arc<DagCache>,
    settings: ExecutorSettings,
    metrics: Option<Arc<MetricsService>>,
}

impl<S: State> DagExecutor<S> {
    pub fn new(
        dag: Arc<Dag<S>>,
        scheduler: Arc<dyn Scheduler<StageResult<S>>>,
        cache: Arc<DagCache>,
        settings: ExecutorSettings,
    ) -> Self {
        Self { dag, scheduler, cache, settings, metrics: None }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsService>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Runs every node in `self.dag` to completion against `initial_state`
    /// (the input handed to every root node) and an optional run-wide
    /// `policy`, returning the accumulated metrics/artifacts/provenance.
    #[tracing::instrument(skip_all, fields(dag_len = self.dag.len()))]
    pub async fn run(&self, initial_state: &S, policy: Option<&PolicyBag>) -> Result<Accumulator, EngineError> {
        let mut in_degree = BTreeMap::new();
        for id in self.dag.node_ids() {
            in_degree.insert(id.clone(), self.dag.deps_of(id).len());
        }
        let mut ready: Vec<String> =
            in_degree.iter().filter(|(_, d)| **d == 0).map(|(id, _)| id.clone()).collect();
        ready.sort();

        let mut state = RunState {
            in_degree,
            outputs: BTreeMap::new(),
            dep_result_hashes: BTreeMap::new(),
            pending: BTreeMap::new(),
            ready,
            remaining: self.dag.len(),
            accumulator: Accumulator::new(),
        };

        let outcome = self.drive(initial_state, policy, &mut state).await;

        // Always release outstanding blocking jobs, even when a node
        // error unwinds the drive loop early.
        self.scheduler.shutdown().await;

        outcome?;
        info!(completed = state.accumulator.execution_order().len(), "run finished");
        Ok(state.accumulator)
    }

    async fn drive(
        &self,
        initial_state: &S,
        policy: Option<&PolicyBag>,
        state: &mut RunState<S>,
    ) -> Result<(), EngineError> {
        loop {
            let batch: Vec<String> = state.ready.drain(..).collect();
            for node_id in batch {
                self.dispatch(&node_id, initial_state, policy, state).await?;
            }

            if state.remaining == 0 {
                return Ok(());
            }

            self.drain_one_completion(state).await?;
        }
    }

    /// Submits a node's work to the scheduler, or -- on a cache hit --
    /// completes it immediately without ever calling `submit`.
    async fn dispatch(
        &self,
        node_id: &str,
        initial_state: &S,
        policy: Option<&PolicyBag>,
        state: &mut RunState<S>,
    ) -> Result<(), EngineError> {
        let node = self
            .dag
            .node(node_id)
            .ok_or_else(|| EngineError::internal(format!("dag has no node '{node_id}'")))?;

        let input_state = self.resolve_input(node_id, initial_state, &state.outputs)?;

        let cfg_hash = node.stage.cfg_hash();
        let policy_hash = policy.map(hashing::hash_policy);
        let input_state_hash = hashing::hash_state(&input_state);
        let empty = BTreeMap::new();
        let dep_hashes = state.dep_result_hashes.get(node_id).unwrap_or(&empty).clone();

        let cache_key = hashing::cache_key(
            node_id,
            &node.version,
            &cfg_hash,
            policy_hash.as_deref(),
            &input_state_hash,
            &dep_hashes,
        );

        let seed = ProvenanceSeed {
            cfg_hash,
            policy_hash,
            version: node.version.clone(),
            deps: node.deps.clone(),
            input_state_hash,
            dependency_hashes: dep_hashes,
            dispatched_at: Instant::now(),
        };

        if let Some(entry) = self.cache.get::<S>(&cache_key).await? {
            if let Some(metrics) = &self.metrics {
                metrics.cache_hits_total.inc();
            }
            debug!(node_id, cache_key = %cache_key, "cache hit");
            let stage_result = StageResult {
                state: entry.state,
                metrics: entry.metrics,
                artifacts: BTreeMap::new(),
                provenance: entry.provenance,
            };
            self.apply_completion(node_id, &cache_key, NodeOutcome::CacheHit, stage_result, false, &seed, state)
                .await?;
            return Ok(());
        }

        if let Some(metrics) = &self.metrics {
            metrics.cache_misses_total.inc();
        }

        let stage = Arc::clone(&node.stage);
        let policy_owned = policy.cloned();
        let work: Box<dyn FnOnce() -> Result<StageResult<S>, EngineError> + Send> =
            Box::new(move || stage.process(&input_state, policy_owned.as_ref()));

        let handle = self.scheduler.submit(node_id.to_string(), node.resources, work).await?;
        debug!(node_id, job_id = handle.job_id, "submitted node");
        state.pending.insert(
            handle.job_id,
            InFlight {
                node_id: node_id.to_string(),
                attempt: handle.attempt,
                deadline: Instant::now() + self.settings.node_timeout,
                cache_key,
                seed,
            },
        );
        Ok(())
    }

    /// Waits for exactly one scheduled job to finish (or its deadline to
    /// elapse) and folds the result into `state`. Retries a recoverable
    /// failure in place by re-adding the node to the ready queue.
    #[tracing::instrument(skip_all)]
    async fn drain_one_completion(&self, state: &mut RunState<S>) -> Result<(), EngineError> {
        if state.pending.is_empty() {
            return Ok(());
        }

        let earliest_deadline = state.pending.values().map(|p| p.deadline).min().unwrap();
        let wait_budget = earliest_deadline.saturating_duration_since(Instant::now());

        let outcome = tokio::time::timeout(wait_budget, self.scheduler.wait_any()).await;
        let (handle, result) = match outcome {
            Ok(inner) => inner?,
            Err(_elapsed) => {
                let timed_out_job = *state
                    .pending
                    .iter()
                    .min_by_key(|(_, p)| p.deadline)
                    .map(|(job_id, _)| job_id)
                    .expect("pending is non-empty");
                let in_flight = state.pending.remove(&timed_out_job).unwrap();
                warn!(node_id = %in_flight.node_id, "node exceeded its timeout budget");
                return Err(EngineError::SchedulerTimeout(in_flight.node_id));
            }
        };

        let in_flight = state
            .pending
            .remove(&handle.job_id)
            .ok_or_else(|| EngineError::internal(format!("unknown job id {}", handle.job_id)))?;

        match result {
            Ok(stage_result) => {
                let seed = in_flight.seed;
                self.apply_completion(
                    &in_flight.node_id,
                    &in_flight.cache_key,
                    NodeOutcome::Computed,
                    stage_result,
                    true,
                    &seed,
                    state,
                )
                .await
            }
            Err(err) if err.is_recoverable() && in_flight.attempt < self.settings.retry_limit => {
                warn!(node_id = %in_flight.node_id, attempt = in_flight.attempt, error = %err, "retrying node");
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(err.category());
                }
                state.ready.push(in_flight.node_id);
                state.ready.sort();
                Ok(())
            }
            Err(err) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(err.category());
                }
                Err(EngineError::SchedulerRetry { node_id: in_flight.node_id, source_message: err.to_string() })
            }
        }
    }

    /// Records a node's result (computed or cache hit), persists it if
    /// `persist`, and unblocks any dependents whose last dependency this
    /// completion was.
    async fn apply_completion(
        &self,
        node_id: &str,
        cache_key: &str,
        outcome: NodeOutcome,
        mut stage_result: StageResult<S>,
        persist: bool,
        seed: &ProvenanceSeed,
        state: &mut RunState<S>,
    ) -> Result<(), EngineError> {
        let result_hash = hashing::hash_stage_result(&stage_result);
        fill_provenance(&mut stage_result, node_id, cache_key, &result_hash, seed);
        state.accumulator.record(node_id, cache_key, outcome, &stage_result);

        if persist {
            self.cache
                .put(
                    cache_key,
                    &DagCacheEntry::new(stage_result.state.clone(), stage_result.metrics.clone(), stage_result.provenance.clone()),
                )
                .await?;
        }

        if matches!(outcome, NodeOutcome::Computed) {
            if let Some(metrics) = &self.metrics {
                metrics.nodes_executed_total.inc();
            }
        }

        for dependent in self.dag.dependents_of(node_id) {
            state
                .dep_result_hashes
                .entry(dependent.clone())
                .or_default()
                .insert(node_id.to_string(), result_hash.clone());
        }
        state.outputs.insert(node_id.to_string(), stage_result.state);
        state.remaining -= 1;

        for dependent in self.dag.dependents_of(node_id).to_vec() {
            let degree = state.in_degree.get_mut(&dependent).unwrap();
            *degree -= 1;
            if *degree == 0 {
                state.ready.push(dependent);
            }
        }
        state.ready.sort();
        Ok(())
    }

    fn resolve_input(
        &self,
        node_id: &str,
        initial_state: &S,
        outputs: &BTreeMap<String, S>,
    ) -> Result<S, EngineError> {
        let node = self
            .dag
            .node(node_id)
            .ok_or_else(|| EngineError::internal(format!("dag has no node '{node_id}'")))?;

        match node.deps.len() {
            0 => Ok(initial_state.deep_copy()),
            1 => {
                let dep_id = &node.deps[0];
                outputs
                    .get(dep_id)
                    .map(State::deep_copy)
                    .ok_or_else(|| EngineError::internal(format!("dependency '{dep_id}' not yet completed")))
            }
            _ => {
                let selector =
                    node.input_selector.as_ref().ok_or_else(|| EngineError::DagInput(node_id.to_string()))?;
                let mut fan_in: DagState<S> = DagState::new();
                for dep_id in &node.deps {
                    let dep_state = outputs
                        .get(dep_id)
                        .ok_or_else(|| EngineError::internal(format!("dependency '{dep_id}' not yet completed")))?;
                    fan_in.insert(dep_id.clone(), dep_state.deep_copy());
                }
                Ok(selector(&fan_in))
            }
        }
    }
}

/// Fills in the replay-relevant provenance keys a completed node must
/// carry, without overwriting anything the stage itself already set.
fn fill_provenance<S: State>(
    result: &mut StageResult<S>,
    node_id: &str,
    cache_key: &str,
    output_hash: &str,
    seed: &ProvenanceSeed,
) {
    let wall_time_s = seed.dispatched_at.elapsed().as_secs_f64();
    let fields: [(&str, serde_json::Value); 10] = [
        ("node_id", serde_json::json!(node_id)),
        ("cache_key", serde_json::json!(cache_key)),
        ("cfg_hash", serde_json::json!(seed.cfg_hash)),
        ("policy_hash", serde_json::json!(seed.policy_hash)),
        ("version", serde_json::json!(seed.version)),
        ("deps", serde_json::json!(seed.deps)),
        ("input_state_hash", serde_json::json!(seed.input_state_hash)),
        ("dependency_hashes", serde_json::json!(seed.dependency_hashes)),
        ("output_hash", serde_json::json!(output_hash)),
        ("wall_time_s", serde_json::json!(wall_time_s)),
    ];
    for (key, value) in fields {
        result.provenance.entry(key.to_string()).or_insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::memory::MemoryCacheBackend;
    use crate::infrastructure::runtime::scheduler::LocalScheduler;
    use dagflow_domain::aggregates::DagBuilder;
    use dagflow_domain::stage::{MetricValue, Stage};
    use dagflow_domain::value_objects::NodeSpec;

    #[derive(Clone, serde::Serialize, serde::Deserialize, Debug, PartialEq)]
    struct NumState(i64);

    impl State for NumState {
        fn hashable_repr(&self) -> Vec<u8> {
            self.0.to_le_bytes().to_vec()
        }
    }

    struct AddConstant(i64);
    impl Stage<NumState> for AddConstant {
        fn process(&self, state: &NumState, _policy: Option<&PolicyBag>) -> Result<StageResult<NumState>, EngineError> {
            Ok(StageResult::new(NumState(state.0 + self.0)).with_metric("delta", MetricValue::Int(self.0)))
        }
        fn cfg_hash(&self) -> String {
            format!("add_constant:{}", self.0)
        }
    }

    struct SumFanIn;
    impl Stage<NumState> for SumFanIn {
        fn process(&self, state: &NumState, _policy: Option<&PolicyBag>) -> Result<StageResult<NumState>, EngineError> {
            Ok(StageResult::new(state.clone()))
        }
        fn cfg_hash(&self) -> String {
            "sum_fan_in".to_string()
        }
    }

    fn executor_for(dag: Dag<NumState>) -> DagExecutor<NumState> {
        let dag = Arc::new(dag);
        let scheduler: Arc<dyn Scheduler<StageResult<NumState>>> = Arc::new(LocalScheduler::new(4, 0));
        let cache = Arc::new(DagCache::new(Arc::new(MemoryCacheBackend::new())));
        DagExecutor::new(dag, scheduler, cache, ExecutorSettings::default())
    }

    #[tokio::test]
    async fn linear_chain_runs_and_caches_second_time() {
        let nodes = vec![
            NodeSpec::new("a", vec![], "add_constant", "v1", Arc::new(AddConstant(1))),
            NodeSpec::new("b", vec!["a".to_string()], "add_constant", "v1", Arc::new(AddConstant(2))),
        ];
        let dag = DagBuilder::build(nodes).unwrap();
        let executor = executor_for(dag);

        let acc = executor.run(&NumState(10), None).await.unwrap();
        assert_eq!(acc.execution_order().len(), 2);
        assert_eq!(acc.execution_order()[0].outcome, NodeOutcome::Computed);
    }

    #[tokio::test]
    async fn diamond_fan_in_requires_input_selector() {
        let nodes = vec![
            NodeSpec::new("a", vec![], "add_constant", "v1", Arc::new(AddConstant(1))),
            NodeSpec::new("b", vec!["a".to_string()], "add_constant", "v1", Arc::new(AddConstant(10))),
            NodeSpec::new("c", vec!["a".to_string()], "add_constant", "v1", Arc::new(AddConstant(100))),
            NodeSpec::new("d", vec!["b".to_string(), "c".to_string()], "sum_fan_in", "v1", Arc::new(SumFanIn)),
        ];
        let dag = DagBuilder::build(nodes).unwrap();
        let executor = executor_for(dag);

        let err = executor.run(&NumState(0), None).await.unwrap_err();
        assert!(matches!(err, EngineError::DagInput(id) if id == "d"));
    }

    #[tokio::test]
    async fn diamond_fan_in_with_selector_sums_both_branches() {
        let selector: dagflow_domain::value_objects::node_spec::InputSelector<NumState> =
            Arc::new(|fan_in: &DagState<NumState>| NumState(fan_in.values().map(|s| s.0).sum()));

        let nodes = vec![
            NodeSpec::new("a", vec![], "add_constant", "v1", Arc::new(AddConstant(1))),
            NodeSpec::new("b", vec!["a".to_string()], "add_constant", "v1", Arc::new(AddConstant(10))),
            NodeSpec::new("c", vec!["a".to_string()], "add_constant", "v1", Arc::new(AddConstant(100))),
            NodeSpec::new("d", vec!["b".to_string(), "c".to_string()], "sum_fan_in", "v1", Arc::new(SumFanIn))
                .with_input_selector(selector),
        ];
        let dag = DagBuilder::build(nodes).unwrap();
        let executor = executor_for(dag);

        let acc = executor.run(&NumState(0), None).await.unwrap();
        assert_eq!(acc.execution_order().len(), 4);
    }

    struct FlakyOnce {
        failed_already: std::sync::atomic::AtomicBool,
    }
    impl Stage<NumState> for FlakyOnce {
        fn process(&self, state: &NumState, _policy: Option<&PolicyBag>) -> Result<StageResult<NumState>, EngineError> {
            if !self.failed_already.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(EngineError::Io("transient read failure".to_string()));
            }
            Ok(StageResult::new(state.clone()))
        }
        fn cfg_hash(&self) -> String {
            "flaky_once".to_string()
        }
    }

    #[tokio::test]
    async fn retries_a_recoverable_failure_and_succeeds() {
        let nodes = vec![NodeSpec::new(
            "a",
            vec![],
            "flaky",
            "v1",
            Arc::new(FlakyOnce { failed_already: std::sync::atomic::AtomicBool::new(false) }),
        )];
        let dag = DagBuilder::build(nodes).unwrap();
        let executor = executor_for(dag);

        let acc = executor.run(&NumState(5), None).await.unwrap();
        assert_eq!(acc.execution_order().len(), 1);
        assert_eq!(acc.execution_order()[0].outcome, NodeOutcome::Computed);
    }

    struct NeverFinishes;
    impl Stage<NumState> for NeverFinishes {
        fn process(&self, _state: &NumState, _policy: Option<&PolicyBag>) -> Result<StageResult<NumState>, EngineError> {
            std::thread::sleep(std::time::Duration::from_secs(3600));
            unreachable!("timeout should fire first")
        }
        fn cfg_hash(&self) -> String {
            "never_finishes".to_string()
        }
    }

    #[tokio::test]
    async fn a_node_past_its_deadline_raises_scheduler_timeout() {
        let nodes = vec![NodeSpec::new("a", vec![], "never_finishes", "v1", Arc::new(NeverFinishes))];
        let dag = Arc::new(DagBuilder::build(nodes).unwrap());
        let scheduler: Arc<dyn Scheduler<StageResult<NumState>>> = Arc::new(LocalScheduler::new(4, 0));
        let cache = Arc::new(DagCache::new(Arc::new(MemoryCacheBackend::new())));
        let settings = ExecutorSettings { retry_limit: 0, node_timeout: std::time::Duration::from_millis(50) };
        let executor = DagExecutor::new(dag, scheduler, cache, settings);

        let err = executor.run(&NumState(0), None).await.unwrap_err();
        assert!(matches!(err, EngineError::SchedulerTimeout(id) if id == "a"));
    }
}
