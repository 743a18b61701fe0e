// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Accumulator
//!
//! Collects every completed node's metrics, artifacts, and provenance
//! into one namespaced report, the same role `ProcessingMetrics` plays
//! for a single pipeline run -- except here each node gets its own
//! namespace instead of one flat struct, since a DAG run has many
//! concurrently-completing stages rather than one linear pipeline.
//!
//! Provenance uses `setdefault` semantics: the first node to write a
//! given top-level provenance key wins, later writers are ignored. This
//! keeps replays byte-identical even if retried nodes re-run in a
//! different order and would otherwise overwrite an earlier value with
//! an equivalent one computed slightly differently (e.g. a wall-clock
//! timestamp embedded in provenance).

use dagflow_domain::events::{ExecutionEvent, NodeOutcome};
use dagflow_domain::stage::{MetricValue, StageResult};
use dagflow_domain::state::State;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct Accumulator {
    metrics: BTreeMap<String, BTreeMap<String, MetricValue>>,
    artifacts: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    provenance: serde_json::Map<String, serde_json::Value>,
    events: Vec<ExecutionEvent>,
    next_sequence: u64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed node's result under its own namespace and
    /// appends an [`ExecutionEvent`] to the provenance trail.
    pub fn record<S: State>(
        &mut self,
        node_id: &str,
        cache_key: &str,
        outcome: NodeOutcome,
        result: &StageResult<S>,
    ) {
        self.metrics.insert(node_id.to_string(), result.metrics.clone());

        let resolved: BTreeMap<String, serde_json::Value> =
            result.artifacts.iter().map(|(k, v)| (k.clone(), v.resolve())).collect();
        self.artifacts.insert(node_id.to_string(), resolved);

        for (key, value) in &result.provenance {
            self.provenance.entry(key.clone()).or_insert_with(|| value.clone());
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push(ExecutionEvent::new(node_id, cache_key, outcome, sequence));
    }

    pub fn metrics(&self) -> &BTreeMap<String, BTreeMap<String, MetricValue>> {
        &self.metrics
    }

    pub fn artifacts(&self) -> &BTreeMap<String, BTreeMap<String, serde_json::Value>> {
        &self.artifacts
    }

    pub fn provenance(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.provenance
    }

    /// The run's execution order, in observed completion order -- used
    /// to check invariant 10 (every node appears exactly once).
    pub fn execution_order(&self) -> &[ExecutionEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, serde::Serialize, serde::Deserialize)]
    struct NumState(i64);

    impl State for NumState {
        fn hashable_repr(&self) -> Vec<u8> {
            self.0.to_le_bytes().to_vec()
        }
    }

    fn result_with(metric: i64, provenance_key: &str, provenance_value: &str) -> StageResult<NumState> {
        let mut r = StageResult::new(NumState(metric));
        r.metrics.insert("value".to_string(), MetricValue::Int(metric));
        r.provenance.insert(provenance_key.to_string(), serde_json::json!(provenance_value));
        r
    }

    #[test]
    fn records_metrics_per_node_namespace() {
        let mut acc = Accumulator::new();
        acc.record("a", "keyA", NodeOutcome::Computed, &result_with(1, "who", "a"));
        acc.record("b", "keyB", NodeOutcome::CacheHit, &result_with(2, "who", "b"));

        assert_eq!(acc.metrics().get("a").unwrap().get("value"), Some(&MetricValue::Int(1)));
        assert_eq!(acc.metrics().get("b").unwrap().get("value"), Some(&MetricValue::Int(2)));
    }

    #[test]
    fn provenance_uses_first_writer_wins_semantics() {
        let mut acc = Accumulator::new();
        acc.record("a", "keyA", NodeOutcome::Computed, &result_with(1, "who", "a"));
        acc.record("b", "keyB", NodeOutcome::Computed, &result_with(2, "who", "b"));

        assert_eq!(acc.provenance().get("who"), Some(&serde_json::json!("a")));
    }

    #[test]
    fn execution_order_tracks_every_recorded_node_once() {
        let mut acc = Accumulator::new();
        acc.record("a", "keyA", NodeOutcome::Computed, &result_with(1, "x", "1"));
        acc.record("b", "keyB", NodeOutcome::CacheHit, &result_with(2, "x", "2"));

        let order = acc.execution_order();
        assert_eq!(order.len(), 2);
        assert_eq!(order[0].node_id, "a");
        assert_eq!(order[1].outcome, NodeOutcome::CacheHit);
    }
}
